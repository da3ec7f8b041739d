use super::Feature;
use crate::core::lattice::{Lattice, LatticeValue, SimulationBox};
use crate::core::models::monomer::MonomerAttributes;
use crate::core::models::vector::Vector3D;
use crate::engine::error::EngineError;
use crate::engine::moves::{MoveKind, Proposal};
use crate::engine::state::SystemState;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, instrument};

/// Offsets of the eight cells a simple-cubic monomer occupies.
pub const FOOTPRINT: [Vector3D<i32>; 8] = [
    Vector3D::new(0, 0, 0),
    Vector3D::new(1, 0, 0),
    Vector3D::new(0, 1, 0),
    Vector3D::new(1, 1, 0),
    Vector3D::new(0, 0, 1),
    Vector3D::new(1, 0, 1),
    Vector3D::new(0, 1, 1),
    Vector3D::new(1, 1, 1),
];

#[inline]
fn footprint(origin: Vector3D<i32>) -> impl Iterator<Item = Vector3D<i32>> {
    FOOTPRINT.into_iter().map(move |offset| origin + offset)
}

/// Whether `cell` belongs to the footprint anchored at `origin` (unfolded).
#[inline]
fn in_footprint(origin: Vector3D<i32>, cell: Vector3D<i32>) -> bool {
    let d = cell - origin;
    (0..=1).contains(&d.x) && (0..=1).contains(&d.y) && (0..=1).contains(&d.z)
}

/// Whole footprint inside the box along every non-periodic axis.
#[inline]
pub(crate) fn footprint_fits(geometry: &SimulationBox, origin: Vector3D<i32>) -> bool {
    geometry.contains_on_closed_axes(origin)
        && geometry.contains_on_closed_axes(origin + Vector3D::new(1, 1, 1))
}

/// Decides which value a monomer paints onto the occupancy lattice.
pub trait OccupancyPolicy: Send + Sync + 'static {
    type Value: LatticeValue;

    /// Short label for metadata output.
    const LABEL: &'static str;

    /// Must never return the empty value.
    fn value(index: usize, attributes: &MonomerAttributes) -> Self::Value;
}

/// Every occupied cell holds `true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanOccupancy;

impl OccupancyPolicy for BooleanOccupancy {
    type Value = bool;
    const LABEL: &'static str = "boolean";

    #[inline]
    fn value(_index: usize, _attributes: &MonomerAttributes) -> bool {
        true
    }
}

/// Cells hold the owning monomer's index plus one.
///
/// Indices from `u32::MAX - 1` upward all saturate to `u32::MAX`, so they
/// still read as occupied but no longer identify their owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonomerIdOccupancy;

impl OccupancyPolicy for MonomerIdOccupancy {
    type Value = u32;
    const LABEL: &'static str = "monomer-id";

    #[inline]
    fn value(index: usize, _attributes: &MonomerAttributes) -> u32 {
        u32::try_from(index).map_or(u32::MAX, |i| i.saturating_add(1))
    }
}

/// Cells hold `|tag| + 1` of the owning monomer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagOccupancy;

impl OccupancyPolicy for TagOccupancy {
    type Value = u32;
    const LABEL: &'static str = "tag";

    #[inline]
    fn value(_index: usize, attributes: &MonomerAttributes) -> u32 {
        attributes.tag.unsigned_abs().saturating_add(1)
    }
}

/// Excluded volume for 2×2×2 simple-cubic footprints.
///
/// Owns the occupancy lattice. A displaced footprint may only gain cells that
/// are currently empty; the cells it keeps are not re-checked. Along
/// non-periodic axes the whole footprint must stay inside `[0, size)`.
pub struct ExcludedVolumeSc<P: OccupancyPolicy = BooleanOccupancy> {
    lattice: Option<Lattice<P::Value>>,
    policy: PhantomData<P>,
}

impl<P: OccupancyPolicy> Default for ExcludedVolumeSc<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: OccupancyPolicy> ExcludedVolumeSc<P> {
    pub const NAME: &'static str = "excluded-volume-sc";

    pub fn new() -> Self {
        Self {
            lattice: None,
            policy: PhantomData,
        }
    }

    /// The occupancy lattice, once synchronized.
    pub fn lattice(&self) -> Option<&Lattice<P::Value>> {
        self.lattice.as_ref()
    }

    #[inline]
    fn is_free(lattice: &Lattice<P::Value>, cell: Vector3D<i32>) -> bool {
        lattice.entry(cell).is_empty()
    }
}

impl<P: OccupancyPolicy> Feature for ExcludedVolumeSc<P> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn runs_after(&self) -> &'static [&'static str] {
        &[super::tagging::MonomerTagging::NAME]
    }

    fn check_move(&self, state: &SystemState, proposal: &mut Proposal) -> bool {
        let Some(lattice) = &self.lattice else {
            return false;
        };
        match *proposal.kind() {
            MoveKind::Local { index, direction } => {
                let old = state.molecules().position(index);
                let new = old + direction;
                footprint_fits(state.geometry(), new)
                    && footprint(new)
                        .filter(|&cell| !in_footprint(old, cell))
                        .all(|cell| Self::is_free(lattice, cell))
            }
            MoveKind::Add { position, .. } => {
                footprint_fits(state.geometry(), position)
                    && footprint(position).all(|cell| Self::is_free(lattice, cell))
            }
            MoveKind::Connect { .. } | MoveKind::Break { .. } => true,
        }
    }

    fn apply_move(&mut self, state: &mut SystemState, proposal: &Proposal) {
        let Some(lattice) = &mut self.lattice else {
            return;
        };
        match *proposal.kind() {
            MoveKind::Local { index, direction } => {
                let old = state.molecules().position(index);
                let new = old + direction;
                let vacated = footprint(old).filter(|&cell| !in_footprint(new, cell));
                let gained = footprint(new).filter(|&cell| !in_footprint(old, cell));
                for (from, to) in vacated.zip(gained) {
                    lattice.move_entry(from, to);
                }
            }
            MoveKind::Add { index, position, .. } => {
                let value = P::value(index, state.molecules().attributes(index));
                for cell in footprint(position) {
                    lattice.set_entry(cell, value);
                }
            }
            MoveKind::Connect { .. } | MoveKind::Break { .. } => {}
        }
    }

    #[instrument(skip_all, name = "excluded_volume_sc_sync", fields(policy = P::LABEL))]
    fn synchronize(&mut self, state: &SystemState) -> Result<(), EngineError> {
        let mut lattice = Lattice::<P::Value>::new(state.geometry())?;
        for (index, monomer) in state.molecules().iter().enumerate() {
            if !footprint_fits(state.geometry(), monomer.position) {
                return Err(EngineError::MonomerOutsideBox {
                    monomer: index,
                    position: monomer.position,
                });
            }
            let value = P::value(index, &monomer.attributes);
            for cell in footprint(monomer.position) {
                if !lattice.entry(cell).is_empty() {
                    return Err(EngineError::DoubleOccupancy {
                        monomer: index,
                        cell,
                    });
                }
                lattice.set_entry(cell, value);
            }
        }
        debug!(
            occupied = lattice.occupied_cells(),
            "Occupancy lattice rebuilt"
        );
        self.lattice = Some(lattice);
        Ok(())
    }

    fn write_metadata(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "#!feature {} occupancy={}", Self::NAME, P::LABEL)
    }

    fn lattice_entry(&self, pos: Vector3D<i32>) -> Option<u32> {
        self.lattice.as_ref().map(|l| l.entry(pos).as_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::graph::MoleculeGraph;
    use crate::core::models::monomer::Monomer;
    use crate::core::rng::RandomNumberEngine;
    use crate::engine::features::FeatureRegistry;
    use crate::engine::moves::{AddMove, LocalMove, LocalMoveSet, MonteCarloMove};
    use crate::engine::system::LatticeSystem;
    use crate::engine::testing::{cubic_system, system_from_graph};
    use rand::SeedableRng;

    fn sc_registry<P: OccupancyPolicy>() -> FeatureRegistry {
        let mut registry = FeatureRegistry::new();
        registry.register(ExcludedVolumeSc::<P>::new());
        registry
    }

    fn footprint_values(system: &LatticeSystem, origin: Vector3D<i32>) -> Vec<Option<u32>> {
        footprint(origin).map(|cell| system.lattice_entry(cell)).collect()
    }

    mod helpers {
        use super::*;

        #[test]
        fn footprint_membership_matches_offsets() {
            let origin = Vector3D::new(3, -2, 7);
            for cell in footprint(origin) {
                assert!(in_footprint(origin, cell));
            }
            assert!(!in_footprint(origin, Vector3D::new(5, -2, 7)));
            assert!(!in_footprint(origin, Vector3D::new(3, -3, 7)));
        }

        #[test]
        fn monomer_id_policy_saturates_instead_of_wrapping() {
            let attributes = MonomerAttributes::with_tag(0);
            assert_eq!(MonomerIdOccupancy::value(0, &attributes), 1);
            assert_eq!(MonomerIdOccupancy::value(41, &attributes), 42);
            assert_eq!(MonomerIdOccupancy::value(u32::MAX as usize - 1, &attributes), u32::MAX);
            assert_eq!(MonomerIdOccupancy::value(u32::MAX as usize, &attributes), u32::MAX);
            assert_eq!(MonomerIdOccupancy::value(usize::MAX, &attributes), u32::MAX);
        }

        #[test]
        fn tag_policy_never_paints_empty() {
            for tag in [i32::MIN, -1, 0, 1, 7] {
                let attributes = MonomerAttributes::with_tag(tag);
                assert_ne!(TagOccupancy::value(0, &attributes), 0);
            }
        }
    }

    mod synchronize {
        use super::*;

        #[test]
        fn paints_every_footprint_cell() {
            let system = cubic_system(
                8,
                sc_registry::<MonomerIdOccupancy>(),
                &[
                    Vector3D::new(0, 0, 0),
                    Vector3D::new(5, 5, 5),
                    Vector3D::new(7, 3, 3),
                ],
            );
            assert!(footprint_values(&system, Vector3D::new(0, 0, 0)).iter().all(|v| *v == Some(1)));
            assert!(footprint_values(&system, Vector3D::new(5, 5, 5)).iter().all(|v| *v == Some(2)));
            // The third footprint wraps around the x boundary.
            assert!(footprint_values(&system, Vector3D::new(7, 3, 3)).iter().all(|v| *v == Some(3)));
            assert_eq!(system.lattice_entry(Vector3D::new(0, 3, 3)), Some(3));
            assert_eq!(system.lattice_entry(Vector3D::new(8, 4, 4)), Some(3));
            assert_eq!(system.lattice_entry(Vector3D::new(8, 8, 8)), Some(1));
            assert_eq!(system.lattice_entry(Vector3D::new(2, 2, 2)), Some(0));
        }

        #[test]
        fn overlapping_footprints_fail() {
            let mut graph = MoleculeGraph::default();
            graph.add_monomer(Vector3D::new(0, 0, 0));
            graph.add_monomer(Vector3D::new(1, 1, 0));
            let err = system_from_graph([8, 8, 8], [true; 3], sc_registry::<BooleanOccupancy>(), graph)
                .unwrap_err();
            assert!(matches!(err, EngineError::DoubleOccupancy { monomer: 1, .. }));
        }

        #[test]
        fn periodic_images_overlap_too() {
            let mut graph = MoleculeGraph::default();
            graph.add_monomer(Vector3D::new(0, 0, 0));
            graph.add_monomer(Vector3D::new(9, 0, 0));
            let err = system_from_graph([8, 8, 8], [true; 3], sc_registry::<BooleanOccupancy>(), graph)
                .unwrap_err();
            assert!(matches!(err, EngineError::DoubleOccupancy { .. }));
        }

        #[test]
        fn footprint_crossing_closed_boundary_fails() {
            let mut graph = MoleculeGraph::default();
            graph.add_monomer(Vector3D::new(7, 0, 0));
            let err = system_from_graph(
                [8, 8, 8],
                [false, true, true],
                sc_registry::<BooleanOccupancy>(),
                graph,
            )
            .unwrap_err();
            assert!(matches!(err, EngineError::MonomerOutsideBox { monomer: 0, .. }));
        }

        #[test]
        fn tag_policy_paints_from_attributes() {
            let mut graph = MoleculeGraph::default();
            graph.add_monomer_with(Monomer::with_attributes(
                Vector3D::new(2, 2, 2),
                MonomerAttributes::with_tag(4),
            ));
            let system =
                system_from_graph([8, 8, 8], [true; 3], sc_registry::<TagOccupancy>(), graph).unwrap();
            assert_eq!(system.lattice_entry(Vector3D::new(3, 3, 3)), Some(5));
        }
    }

    mod moves {
        use super::*;

        #[test]
        fn close_pair_blocks_the_approaching_move_for_every_sub_position() {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let mut system = cubic_system(
                        64,
                        sc_registry::<BooleanOccupancy>(),
                        &[Vector3D::new(9, 10, 10), Vector3D::new(13, 10 + dy, 10 + dz)],
                    );
                    let mut mv = LocalMove::new(LocalMoveSet::SimpleCubic);
                    for _ in 0..2 {
                        mv.init_with(&system, 0, Vector3D::new(1, 0, 0)).unwrap();
                        assert!(mv.check(&system));
                        mv.apply(&mut system).unwrap();
                    }
                    assert_eq!(system.molecules().position(0), Vector3D::new(11, 10, 10));

                    mv.init_with(&system, 0, Vector3D::new(1, 0, 0)).unwrap();
                    assert!(!mv.check(&system), "offset ({dy}, {dz}) was not blocked");
                    assert_eq!(system.molecules().position(0), Vector3D::new(11, 10, 10));
                }
            }
        }

        #[test]
        fn diagonal_neighbour_outside_the_blocking_range_does_not_block() {
            let mut system = cubic_system(
                64,
                sc_registry::<BooleanOccupancy>(),
                &[Vector3D::new(11, 10, 10), Vector3D::new(13, 12, 10)],
            );
            let mut mv = LocalMove::new(LocalMoveSet::SimpleCubic);
            mv.init_with(&system, 0, Vector3D::new(1, 0, 0)).unwrap();
            assert!(mv.check(&system));
            mv.apply(&mut system).unwrap();
        }

        #[test]
        fn closed_boundary_rejects_leaving_the_box() {
            let mut graph = MoleculeGraph::default();
            graph.add_monomer(Vector3D::new(6, 0, 0));
            let system = system_from_graph(
                [8, 8, 8],
                [false, false, false],
                sc_registry::<BooleanOccupancy>(),
                graph,
            )
            .unwrap();
            let mut mv = LocalMove::new(LocalMoveSet::SimpleCubic);
            mv.init_with(&system, 0, Vector3D::new(1, 0, 0)).unwrap();
            assert!(!mv.check(&system));
            mv.init_with(&system, 0, Vector3D::new(0, -1, 0)).unwrap();
            assert!(!mv.check(&system));
            mv.init_with(&system, 0, Vector3D::new(-1, 0, 0)).unwrap();
            assert!(mv.check(&system));
        }

        #[test]
        fn jump_moves_keep_the_lattice_consistent() {
            let mut system = cubic_system(
                16,
                sc_registry::<MonomerIdOccupancy>(),
                &[Vector3D::new(2, 2, 2)],
            );
            let mut mv = LocalMove::new(LocalMoveSet::ScJump);
            mv.init_with(&system, 0, Vector3D::new(2, -1, 0)).unwrap();
            assert!(mv.check(&system));
            mv.apply(&mut system).unwrap();
            assert!(footprint_values(&system, Vector3D::new(4, 1, 2)).iter().all(|v| *v == Some(1)));
            assert_eq!(system.lattice_entry(Vector3D::new(2, 2, 2)), Some(0));
            assert_eq!(system.lattice_entry(Vector3D::new(3, 3, 3)), Some(0));
        }

        #[test]
        fn add_move_paints_new_footprint_with_new_index() {
            let mut system = cubic_system(
                16,
                sc_registry::<MonomerIdOccupancy>(),
                &[Vector3D::new(0, 0, 0)],
            );
            let mut mv = AddMove::new();
            mv.init_with(&system, Vector3D::new(1, 1, 1), MonomerAttributes::default());
            assert!(!mv.check(&system), "overlapping add accepted");

            mv.init_with(&system, Vector3D::new(2, 0, 0), MonomerAttributes::default());
            assert!(mv.check(&system));
            mv.apply(&mut system).unwrap();
            assert_eq!(system.molecules().len(), 2);
            assert!(footprint_values(&system, Vector3D::new(2, 0, 0)).iter().all(|v| *v == Some(2)));
        }

        #[test]
        fn random_walk_keeps_footprints_exclusive_and_painted() {
            let positions: Vec<_> = (0..6)
                .map(|i| Vector3D::new(2 * (i % 3), 3 * (i / 3), 0))
                .collect();
            let mut system = cubic_system(8, sc_registry::<MonomerIdOccupancy>(), &positions);
            let mut rng = RandomNumberEngine::seed_from_u64(2024);
            let mut mv = LocalMove::new(LocalMoveSet::ScDiagonal);

            for _ in 0..3000 {
                mv.init(&system, &mut rng).unwrap();
                if mv.check(&system) {
                    mv.apply(&mut system).unwrap();
                }
                let mut painted = 0;
                for (index, monomer) in system.molecules().iter().enumerate() {
                    for value in footprint_values(&system, monomer.position) {
                        assert_eq!(value, Some(index as u32 + 1));
                        painted += 1;
                    }
                }
                assert_eq!(painted, 8 * positions.len());
            }
            let lattice_cells = (0..8)
                .flat_map(|x| (0..8).flat_map(move |y| (0..8).map(move |z| Vector3D::new(x, y, z))))
                .filter(|&cell| system.lattice_entry(cell) != Some(0))
                .count();
            assert_eq!(lattice_cells, 8 * positions.len());
        }
    }
}
