use super::read_cube;
use crate::cli::InfoArgs;
use crate::error::{CliError, Result};
use isosurf::core::grid::GridSummary;
use isosurf::core::io::cube::CubeMetadata;
use serde::Serialize;
use tracing::info;

#[derive(Serialize, Debug)]
#[serde(rename_all = "kebab-case")]
struct CubeReport {
    title: String,
    comment: String,
    atom_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    orbital: Option<usize>,
    grid: GridSummary,
}

impl CubeReport {
    fn new(metadata: CubeMetadata, grid: GridSummary) -> Self {
        Self {
            title: metadata.title,
            comment: metadata.comment,
            atom_count: metadata.atoms.len(),
            orbital: metadata.orbital,
            grid,
        }
    }

    fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to render summary: {}", e)))
    }
}

pub async fn run(args: InfoArgs) -> Result<()> {
    let (grid, metadata) = read_cube(&args.input)?;
    info!("Summarizing grid of {} points.", grid.size().point_count());

    let report = CubeReport::new(metadata, grid.summary());
    print!("{}", report.to_toml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use isosurf::core::grid::{DataType, GridSize, ScalarGrid};

    #[test]
    fn report_renders_grid_table() {
        let size = GridSize::new([0; 3], [3, 2, 1], 0.25).unwrap();
        let mut grid = ScalarGrid::new(DataType::CubeData, size);
        grid.set_value(1, 1, 1, 2.5);
        let metadata = CubeMetadata {
            title: "water".to_string(),
            ..Default::default()
        };

        let text = CubeReport::new(metadata, grid.summary()).to_toml().unwrap();

        assert!(text.contains("title = \"water\""));
        assert!(text.contains("atom-count = 0"));
        assert!(!text.contains("orbital ="));
        assert!(text.contains("[grid]"));
        assert!(text.contains("point-count = 24"));
        assert!(text.contains("maximum-value = 2.5"));
    }
}
