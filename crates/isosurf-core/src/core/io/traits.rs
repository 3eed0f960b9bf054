use crate::core::grid::ScalarGrid;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing volumetric grid file formats.
///
/// Implementors handle format-specific parsing and serialization; the path-based
/// helpers take care of opening and buffering files.
pub trait VolumetricFile {
    /// Format-specific data carried alongside the grid (titles, atoms, ...).
    type Metadata: Default;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a grid and its metadata from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<(ScalarGrid, Self::Metadata), Self::Error>;

    /// Writes a grid and its metadata to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(
        grid: &ScalarGrid,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Writes a grid with default metadata.
    fn write_grid_to(grid: &ScalarGrid, writer: &mut impl Write) -> Result<(), Self::Error> {
        Self::write_to(grid, &Self::Metadata::default(), writer)
    }

    /// Reads a grid and its metadata from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<(ScalarGrid, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a grid and its metadata to a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        grid: &ScalarGrid,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(grid, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn write_grid_to_path<P: AsRef<Path>>(grid: &ScalarGrid, path: P) -> Result<(), Self::Error> {
        Self::write_to_path(grid, &Self::Metadata::default(), path)
    }
}
