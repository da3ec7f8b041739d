//! Fixtures shared by the engine's unit tests.

use super::config::SystemConfigBuilder;
use super::error::EngineError;
use super::features::FeatureRegistry;
use super::system::LatticeSystem;
use crate::core::models::bondset::{BondSet, BondSetKind};
use crate::core::models::graph::MoleculeGraph;
use crate::core::models::vector::Vector3D;

/// Periodic cube of edge `size` with the classic simple-cubic bond set and
/// unbonded monomers at `positions`.
pub(crate) fn cubic_system(
    size: i32,
    registry: FeatureRegistry,
    positions: &[Vector3D<i32>],
) -> LatticeSystem {
    system_with([size; 3], registry, positions, &[])
}

/// Periodic box with monomers at `positions` joined by `bonds`. Each link
/// carries the bond identifier of its vector when it has one.
pub(crate) fn system_with(
    size: [i32; 3],
    registry: FeatureRegistry,
    positions: &[Vector3D<i32>],
    bonds: &[(usize, usize)],
) -> LatticeSystem {
    let mut graph = MoleculeGraph::default();
    for &p in positions {
        graph.add_monomer(p);
    }
    let bondset = BondSet::classic_sc();
    for &(i, j) in bonds {
        let info = bondset.identifier_of(&(graph.position(j) - graph.position(i)));
        graph.connect(i, j, info).unwrap();
    }
    system_from_graph(size, [true; 3], registry, graph).unwrap()
}

pub(crate) fn system_from_graph(
    size: [i32; 3],
    periodic: [bool; 3],
    registry: FeatureRegistry,
    graph: MoleculeGraph,
) -> Result<LatticeSystem, EngineError> {
    let config = SystemConfigBuilder::new()
        .box_size(size[0], size[1], size[2])
        .periodicity(periodic[0], periodic[1], periodic[2])
        .bond_set(BondSetKind::ClassicSc)
        .build()?;
    LatticeSystem::with_molecules(&config, registry, graph)
}
