pub mod distance;
pub mod geometry;
#[allow(clippy::module_inception)]
pub mod lattice;

pub use distance::DistanceCalculator;
pub use geometry::{Addressing, Axis, LatticeError, SimulationBox};
pub use lattice::{Lattice, LatticeValue};
