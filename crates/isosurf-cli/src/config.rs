mod defaults;

use crate::cli::{ExtractArgs, PhaseArg};
use crate::error::{CliError, Result};
use defaults::DefaultsConfig;
use isosurf::engine::config as core_config;
use clap::ValueEnum;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSurfaceSection {
    isovalue: Option<f64>,
    phase: Option<core_config::SurfacePhase>,
    upsample: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialSurfaceConfig {
    surface: Option<PartialSurfaceSection>,
}

impl PartialSurfaceConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the file named by `--config`, or starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    /// Resolves the final configuration. Precedence, highest first: explicit CLI
    /// flags, `-S` overrides, the config file, built-in defaults.
    pub fn merge_with_cli(mut self, args: &ExtractArgs) -> Result<core_config::SurfaceConfig> {
        self.apply_set_values(&args.set_values)?;

        let defaults = DefaultsConfig::default();
        let surface = self.surface.take().unwrap_or_default();

        let isovalue = args
            .isovalue
            .or(surface.isovalue)
            .unwrap_or(defaults.isovalue);
        let phase = args
            .phase
            .map(Into::into)
            .or(surface.phase)
            .unwrap_or(defaults.phase);
        let upsample = args.upsample || surface.upsample.unwrap_or(defaults.upsample);

        core_config::SurfaceConfigBuilder::new()
            .isovalue(isovalue)
            .phase(phase)
            .upsample(upsample)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let section = self.surface.get_or_insert_with(Default::default);

            match key {
                "surface.isovalue" => section.isovalue = Some(parse_value(key, value_str)?),
                "surface.upsample" => section.upsample = Some(parse_value(key, value_str)?),
                "surface.phase" => {
                    let phase = PhaseArg::from_str(value_str, true).map_err(|_| {
                        CliError::Config(format!("Invalid phase for {}: {}", key, value_str))
                    })?;
                    section.phase = Some(phase.into());
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value_str)))
}
