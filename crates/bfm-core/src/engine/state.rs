use crate::core::lattice::SimulationBox;
use crate::core::models::bondset::BondSet;
use crate::core::models::graph::MoleculeGraph;

/// The canonical data every feature reads: molecules, bond vocabulary and box.
///
/// Features keep derived caches (lattices, neighbour lists) of their own and
/// rebuild them from this state on `synchronize`.
#[derive(Debug, Clone)]
pub struct SystemState {
    pub(crate) molecules: MoleculeGraph,
    pub(crate) bondset: BondSet,
    pub(crate) geometry: SimulationBox,
}

impl SystemState {
    pub fn new(molecules: MoleculeGraph, bondset: BondSet, geometry: SimulationBox) -> Self {
        Self {
            molecules,
            bondset,
            geometry,
        }
    }

    #[inline]
    pub fn molecules(&self) -> &MoleculeGraph {
        &self.molecules
    }

    /// Mutable access for apply hooks, e.g. assigning attributes to a freshly
    /// added monomer. Positions and links must only change through moves.
    #[inline]
    pub fn molecules_mut(&mut self) -> &mut MoleculeGraph {
        &mut self.molecules
    }

    #[inline]
    pub fn bondset(&self) -> &BondSet {
        &self.bondset
    }

    #[inline]
    pub fn geometry(&self) -> &SimulationBox {
        &self.geometry
    }
}
