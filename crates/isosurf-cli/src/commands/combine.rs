use super::{read_cube, write_cube};
use crate::cli::CombineArgs;
use crate::error::{CliError, Result};
use isosurf::engine::error::EngineError;
use tracing::info;

pub async fn run(args: CombineArgs) -> Result<()> {
    if !(args.scale_a.is_finite() && args.scale_b.is_finite()) {
        return Err(CliError::Argument(format!(
            "Scale factors must be finite, got {} and {}.",
            args.scale_a, args.scale_b
        )));
    }

    let (first, metadata) = read_cube(&args.first)?;
    let (second, _) = read_cube(&args.second)?;

    let scale_b = if args.subtract {
        -args.scale_b
    } else {
        args.scale_b
    };
    info!(
        "Combining grids as {} * A + {} * B.",
        args.scale_a, scale_b
    );
    let combined = first
        .combine(&second, args.scale_a, scale_b)
        .map_err(EngineError::from)?;

    write_cube(&combined, &metadata, &args.output)?;
    println!("✓ Combined grid written to: {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use isosurf::core::grid::{DataType, GridError, GridSize, ScalarGrid};
    use isosurf::core::io::cube::CubeFile;
    use isosurf::core::io::traits::VolumetricFile;
    use std::path::Path;

    fn write_constant_cube(path: &Path, max: i32, value: f64) {
        let size = GridSize::new([0; 3], [max; 3], 0.5).unwrap();
        let mut grid = ScalarGrid::new(DataType::CubeData, size);
        let _ = grid.generate(|_, _, _| value, |_| {}, || false);
        CubeFile::write_grid_to_path(&grid, path).unwrap();
    }

    fn combine_args(dir: &Path, extra: &[&str]) -> CombineArgs {
        let a = dir.join("a.cube");
        let b = dir.join("b.cube");
        let out = dir.join("out.cube");
        let mut argv = vec![
            "isosurf".to_string(),
            "combine".to_string(),
            "-a".to_string(),
            a.to_string_lossy().into_owned(),
            "-b".to_string(),
            b.to_string_lossy().into_owned(),
            "-o".to_string(),
            out.to_string_lossy().into_owned(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        match Cli::parse_from(argv).command {
            Commands::Combine(args) => args,
            _ => panic!("Expected 'combine' subcommand"),
        }
    }

    #[tokio::test]
    async fn subtracts_scaled_grids() {
        let dir = tempfile::tempdir().unwrap();
        write_constant_cube(&dir.path().join("a.cube"), 3, 1.5);
        write_constant_cube(&dir.path().join("b.cube"), 3, 0.5);

        run(combine_args(dir.path(), &["--subtract", "--scale-a", "2"]))
            .await
            .unwrap();

        let (grid, _) = CubeFile::read_from_path(dir.path().join("out.cube")).unwrap();
        assert!((grid.value(1, 2, 3) - 2.5).abs() < 1e-9);
        assert_eq!(grid.data_type(), DataType::CubeData);
    }

    #[tokio::test]
    async fn mismatched_sizes_fail() {
        let dir = tempfile::tempdir().unwrap();
        write_constant_cube(&dir.path().join("a.cube"), 3, 1.0);
        write_constant_cube(&dir.path().join("b.cube"), 4, 1.0);

        let result = run(combine_args(dir.path(), &[])).await;
        assert!(matches!(result, Err(CliError::Engine(EngineError::Grid { .. }))));
        assert!(!dir.path().join("out.cube").exists());
    }

    #[tokio::test]
    async fn shifted_grids_are_not_combined() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.cube");
        write_constant_cube(&a, 3, 1.0);
        // Same point counts and step, origin moved by 0.2 Angstrom along x.
        let mut lines: Vec<String> = std::fs::read_to_string(&a)
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        lines[2] = format!("{:5} {:13.6} {:13.6} {:13.6}", 0, 0.377945, 0.0, 0.0);
        std::fs::write(dir.path().join("b.cube"), lines.join("\n") + "\n").unwrap();

        let result = run(combine_args(dir.path(), &[])).await;

        match result {
            Err(CliError::Engine(EngineError::Grid { source })) => {
                assert!(matches!(source, GridError::OriginMismatch { .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!dir.path().join("out.cube").exists());
    }

    #[tokio::test]
    async fn non_finite_scales_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(combine_args(dir.path(), &["--scale-b", "inf"])).await;
        assert!(matches!(result, Err(CliError::Argument(_))));
    }
}
