use thiserror::Error;

use super::config::ConfigError;
use super::features::wall::WallError;
use super::moves::MoveState;
use crate::core::lattice::LatticeError;
use crate::core::models::bondset::BondSetError;
use crate::core::models::graph::GraphError;
use crate::core::models::vector::Vector3D;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Lattice error: {source}")]
    Lattice {
        #[from]
        source: LatticeError,
    },

    #[error("Molecule graph error: {source}")]
    Graph {
        #[from]
        source: GraphError,
    },

    #[error("Bond set error: {source}")]
    BondSet {
        #[from]
        source: BondSetError,
    },

    #[error("Wall configuration error: {source}")]
    Wall {
        #[from]
        source: WallError,
    },

    #[error("Monomer {monomer} overlaps an occupied lattice cell at {cell}")]
    DoubleOccupancy { monomer: usize, cell: Vector3D<i32> },

    #[error("Monomer {monomer} at {position} lies outside a non-periodic box boundary")]
    MonomerOutsideBox {
        monomer: usize,
        position: Vector3D<i32>,
    },

    #[error("Bond {first}-{second} has vector {vector}, which is not in the bond set")]
    InvalidBond {
        first: usize,
        second: usize,
        vector: Vector3D<i32>,
    },

    #[error("Feature '{0}' is registered more than once")]
    DuplicateFeature(&'static str),

    #[error("Feature ordering contains a cycle involving: {}", .0.join(", "))]
    FeatureCycle(Vec<&'static str>),

    #[error("Move cannot be applied in state {0}; only accepted moves may be applied")]
    InvalidMoveState(MoveState),

    #[error(
        "Move was checked at system revision {checked}, the system is now at {current}; check it again"
    )]
    StaleCheck { checked: u64, current: u64 },

    #[error("Cannot draw a move from an empty system")]
    EmptySystem,

    #[error("Move needs at least {required} monomers, the system has {found}")]
    InsufficientMonomers { required: usize, found: usize },

    #[error("Feature '{feature}' is misconfigured: {reason}")]
    FeatureConfiguration {
        feature: &'static str,
        reason: String,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
