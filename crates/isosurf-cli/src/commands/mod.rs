pub mod combine;
pub mod extract;
pub mod info;
pub mod upsample;

use crate::error::{CliError, Result};
use isosurf::core::grid::ScalarGrid;
use isosurf::core::io::cube::{CubeFile, CubeMetadata};
use isosurf::core::io::traits::VolumetricFile;
use std::path::Path;
use tracing::info;

pub(crate) fn read_cube(path: &Path) -> Result<(ScalarGrid, CubeMetadata)> {
    info!("Loading grid from {:?}", path);
    CubeFile::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

pub(crate) fn write_cube(grid: &ScalarGrid, metadata: &CubeMetadata, path: &Path) -> Result<()> {
    info!("Writing grid to {:?}", path);
    CubeFile::write_to_path(grid, metadata, path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}
