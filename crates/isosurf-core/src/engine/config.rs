use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid isovalue {value}: {reason}")]
    InvalidIsovalue { value: f64, reason: &'static str },
}

/// Which lobes of the field to extract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfacePhase {
    /// A single surface at `+isovalue`.
    Positive,
    /// A single surface at `-isovalue`.
    Negative,
    /// Both surfaces, at `+isovalue` and `-isovalue`.
    Both,
    /// Both surfaces for signed data types, otherwise only the positive one.
    #[default]
    Auto,
}

impl fmt::Display for SurfacePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SurfacePhase::Positive => "positive",
            SurfacePhase::Negative => "negative",
            SurfacePhase::Both => "both",
            SurfacePhase::Auto => "auto",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    pub isovalue: f64,
    pub phase: SurfacePhase,
    /// Halve the grid step with tri-cubic interpolation before extraction.
    pub upsample: bool,
}

#[derive(Default)]
pub struct SurfaceConfigBuilder {
    isovalue: Option<f64>,
    phase: Option<SurfacePhase>,
    upsample: Option<bool>,
}

impl SurfaceConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn isovalue(mut self, value: f64) -> Self {
        self.isovalue = Some(value);
        self
    }
    pub fn phase(mut self, phase: SurfacePhase) -> Self {
        self.phase = Some(phase);
        self
    }
    pub fn upsample(mut self, enabled: bool) -> Self {
        self.upsample = Some(enabled);
        self
    }

    pub fn build(self) -> Result<SurfaceConfig, ConfigError> {
        let isovalue = self
            .isovalue
            .ok_or(ConfigError::MissingParameter("isovalue"))?;
        let phase = self.phase.ok_or(ConfigError::MissingParameter("phase"))?;

        if !isovalue.is_finite() {
            return Err(ConfigError::InvalidIsovalue {
                value: isovalue,
                reason: "must be finite",
            });
        }
        if phase == SurfacePhase::Both && isovalue == 0.0 {
            return Err(ConfigError::InvalidIsovalue {
                value: isovalue,
                reason: "both phases need a non-zero isovalue",
            });
        }

        Ok(SurfaceConfig {
            isovalue,
            phase,
            upsample: self.upsample.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_isovalue_and_phase() {
        assert_eq!(
            SurfaceConfigBuilder::new().phase(SurfacePhase::Auto).build(),
            Err(ConfigError::MissingParameter("isovalue"))
        );
        assert_eq!(
            SurfaceConfigBuilder::new().isovalue(0.02).build(),
            Err(ConfigError::MissingParameter("phase"))
        );
    }

    #[test]
    fn upsampling_defaults_to_off() {
        let config = SurfaceConfigBuilder::new()
            .isovalue(0.05)
            .phase(SurfacePhase::Positive)
            .build()
            .unwrap();
        assert_eq!(
            config,
            SurfaceConfig {
                isovalue: 0.05,
                phase: SurfacePhase::Positive,
                upsample: false
            }
        );
    }

    #[test]
    fn rejects_non_finite_isovalue() {
        let result = SurfaceConfigBuilder::new()
            .isovalue(f64::INFINITY)
            .phase(SurfacePhase::Positive)
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidIsovalue { .. })));
    }

    #[test]
    fn both_phases_reject_zero_isovalue() {
        let result = SurfaceConfigBuilder::new()
            .isovalue(0.0)
            .phase(SurfacePhase::Both)
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidIsovalue { .. })));
    }

    #[test]
    fn phase_labels_are_kebab_case() {
        assert_eq!(SurfacePhase::Negative.to_string(), "negative");
        assert_eq!(SurfacePhase::default(), SurfacePhase::Auto);
    }
}
