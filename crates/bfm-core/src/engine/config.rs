use super::moves::LocalMoveSet;
use crate::core::lattice::Addressing;
use crate::core::models::bondset::BondSetKind;
use crate::core::models::graph::DEFAULT_MAX_DEGREE;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Static description of a simulation box and its molecule container.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfig {
    pub box_size: [i32; 3],
    pub periodicity: [bool; 3],
    pub addressing: Addressing,
    pub max_degree: usize,
    pub bond_set: BondSetKind,
}

#[derive(Default)]
pub struct SystemConfigBuilder {
    box_size: Option<[i32; 3]>,
    periodicity: Option<[bool; 3]>,
    addressing: Option<Addressing>,
    max_degree: Option<usize>,
    bond_set: Option<BondSetKind>,
}

impl SystemConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn box_size(mut self, x: i32, y: i32, z: i32) -> Self {
        self.box_size = Some([x, y, z]);
        self
    }
    pub fn periodicity(mut self, x: bool, y: bool, z: bool) -> Self {
        self.periodicity = Some([x, y, z]);
        self
    }
    pub fn addressing(mut self, addressing: Addressing) -> Self {
        self.addressing = Some(addressing);
        self
    }
    pub fn max_degree(mut self, max_degree: usize) -> Self {
        self.max_degree = Some(max_degree);
        self
    }
    pub fn bond_set(mut self, kind: BondSetKind) -> Self {
        self.bond_set = Some(kind);
        self
    }

    pub fn build(self) -> Result<SystemConfig, ConfigError> {
        let max_degree = self.max_degree.unwrap_or(DEFAULT_MAX_DEGREE);
        if max_degree == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_degree",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(SystemConfig {
            box_size: self
                .box_size
                .ok_or(ConfigError::MissingParameter("box_size"))?,
            periodicity: self
                .periodicity
                .ok_or(ConfigError::MissingParameter("periodicity"))?,
            addressing: self.addressing.unwrap_or_default(),
            max_degree,
            bond_set: self
                .bond_set
                .ok_or(ConfigError::MissingParameter("bond_set"))?,
        })
    }
}

/// Parameters of a Metropolis sweep run.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Number of Monte-Carlo sweeps; each sweep proposes one move per monomer.
    pub sweeps: u64,
    pub move_set: LocalMoveSet,
}

#[derive(Default)]
pub struct SweepConfigBuilder {
    sweeps: Option<u64>,
    move_set: Option<LocalMoveSet>,
}

impl SweepConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sweeps(mut self, sweeps: u64) -> Self {
        self.sweeps = Some(sweeps);
        self
    }
    pub fn move_set(mut self, move_set: LocalMoveSet) -> Self {
        self.move_set = Some(move_set);
        self
    }

    pub fn build(self) -> Result<SweepConfig, ConfigError> {
        Ok(SweepConfig {
            sweeps: self.sweeps.ok_or(ConfigError::MissingParameter("sweeps"))?,
            move_set: self.move_set.unwrap_or(LocalMoveSet::SimpleCubic),
        })
    }
}
