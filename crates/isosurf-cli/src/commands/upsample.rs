use super::{read_cube, write_cube};
use crate::cli::UpsampleArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use isosurf::workflows;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub async fn run(args: UpsampleArgs, cancel: Arc<AtomicBool>) -> Result<()> {
    let (grid, metadata) = read_cube(&args.input)?;

    let reporter = CliProgressHandler::new(cancel).reporter();

    let fine = tokio::task::block_in_place(|| workflows::grid::upsample(&grid, &reporter))
        .ok_or(CliError::Cancelled)?;

    write_cube(&fine, &metadata, &args.output)?;
    println!(
        "✓ Upsampled grid ({}) written to: {}",
        fine.size(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use isosurf::core::grid::{DataType, GridSize, ScalarGrid};
    use isosurf::core::io::cube::CubeFile;
    use isosurf::core::io::traits::VolumetricFile;

    #[tokio::test(flavor = "multi_thread")]
    async fn writes_a_grid_with_half_the_step() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.cube");
        let output = dir.path().join("out.cube");
        let size = GridSize::new([0; 3], [4; 3], 0.4).unwrap();
        CubeFile::write_grid_to_path(&ScalarGrid::new(DataType::CubeData, size), &input).unwrap();

        let args = UpsampleArgs {
            input,
            output: output.clone(),
        };
        run(args, Arc::new(AtomicBool::new(false))).await.unwrap();

        let (fine, _) = CubeFile::read_from_path(&output).unwrap();
        assert_eq!(fine.size().dimensions(), [9, 9, 9]);
        assert!((fine.step_size() - 0.2).abs() < 1e-5);
    }
}
