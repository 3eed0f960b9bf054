use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::sync::atomic::{AtomicUsize, Ordering};

static COMBINATION_COUNT: AtomicUsize = AtomicUsize::new(1);

/// Semantic tag describing what the values of a grid represent.
///
/// The tag is bookkeeping for callers (labels, colouring, whether a field has two
/// signed lobes); the surface extraction itself never looks at it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum DataType {
    #[default]
    Undefined,
    AlphaOrbital(usize),
    BetaOrbital(usize),
    TotalDensity,
    SpinDensity,
    AlphaDensity,
    BetaDensity,
    /// A user-defined sum or difference of densities. Each combination gets its own
    /// index so that several of them can be told apart.
    DensityCombination(usize),
    CubeData,
    VanDerWaals,
    Promolecule,
    SolventExcluded,
    Sid,
    ElectrostaticPotential,
}

impl DataType {
    pub fn is_density(&self) -> bool {
        matches!(
            self,
            DataType::AlphaDensity
                | DataType::BetaDensity
                | DataType::TotalDensity
                | DataType::SpinDensity
                | DataType::DensityCombination(_)
        )
    }

    pub fn is_orbital(&self) -> bool {
        matches!(self, DataType::AlphaOrbital(_) | DataType::BetaOrbital(_))
    }

    /// Fields that take both signs and are therefore drawn as two lobes.
    pub fn is_signed(&self) -> bool {
        self.is_orbital()
            || matches!(
                self,
                DataType::SpinDensity | DataType::DensityCombination(_) | DataType::CubeData
            )
    }

    pub fn is_defined(&self) -> bool {
        *self != DataType::Undefined
    }

    fn next_combination() -> Self {
        DataType::DensityCombination(COMBINATION_COUNT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Add for DataType {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        use DataType::*;
        match (self, rhs) {
            (AlphaDensity, BetaDensity) | (BetaDensity, AlphaDensity) => TotalDensity,
            (a, b) if a.is_density() && b.is_density() => DataType::next_combination(),
            (CubeData, CubeData) => CubeData,
            _ => Undefined,
        }
    }
}

impl Sub for DataType {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        use DataType::*;
        match (self, rhs) {
            (AlphaDensity, BetaDensity) => SpinDensity,
            (a, b) if a.is_density() && b.is_density() => DataType::next_combination(),
            (CubeData, CubeData) => CubeData,
            _ => Undefined,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Undefined => write!(f, "Undefined"),
            DataType::AlphaOrbital(index) => write!(f, "Alpha {}", index),
            DataType::BetaOrbital(index) => write!(f, "Beta {}", index),
            DataType::TotalDensity => write!(f, "Total Density"),
            DataType::SpinDensity => write!(f, "Spin Density"),
            DataType::AlphaDensity => write!(f, "Alpha Density"),
            DataType::BetaDensity => write!(f, "Beta Density"),
            DataType::DensityCombination(index) => write!(f, "User Defined Density {}", index),
            DataType::CubeData => write!(f, "Cube Data"),
            DataType::VanDerWaals => write!(f, "van der Waals"),
            DataType::Promolecule => write!(f, "Promolecule"),
            DataType::SolventExcluded => write!(f, "Solvent Excluded"),
            DataType::Sid => write!(f, "SID"),
            DataType::ElectrostaticPotential => write!(f, "Electrostatic Potential"),
        }
    }
}
