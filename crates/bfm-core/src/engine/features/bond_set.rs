use super::Feature;
use crate::core::models::vector::Vector3D;
use crate::engine::error::EngineError;
use crate::engine::moves::{MoveKind, Proposal};
use crate::engine::state::SystemState;
use tracing::instrument;

/// Restricts bonds to the vectors of the system's bond set.
///
/// Local moves are rejected if any bond of the moved monomer would leave the
/// set; connect moves if the vector between the two partners is not in it.
/// Bond vectors are differences of unfolded positions. A stale lookup table
/// rejects everything until the system is synchronized.
#[derive(Debug, Default)]
pub struct BondSetRule;

impl BondSetRule {
    pub const NAME: &'static str = "bond-set";

    pub fn new() -> Self {
        Self
    }
}

impl Feature for BondSetRule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check_move(&self, state: &SystemState, proposal: &mut Proposal) -> bool {
        let molecules = state.molecules();
        let bonds = state.bondset();
        match *proposal.kind() {
            MoveKind::Local { index, direction } => {
                let new = molecules.position(index) + direction;
                molecules
                    .neighbors(index)
                    .all(|j| bonds.is_valid_fast(&(molecules.position(j) - new)))
            }
            MoveKind::Connect { index, partner } => {
                bonds.is_valid_fast(&(molecules.position(partner) - molecules.position(index)))
            }
            MoveKind::Add { .. } | MoveKind::Break { .. } => true,
        }
    }

    #[instrument(skip_all, name = "bond_set_sync")]
    fn synchronize(&mut self, state: &SystemState) -> Result<(), EngineError> {
        let molecules = state.molecules();
        for (i, j, _) in molecules.edges() {
            let vector: Vector3D<i32> = molecules.position(j) - molecules.position(i);
            if !state.bondset().is_valid(&vector)? {
                return Err(EngineError::InvalidBond {
                    first: i,
                    second: j,
                    vector,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::bondset::{BondSetError, BondSetKind};
    use crate::engine::config::SystemConfigBuilder;
    use crate::engine::features::FeatureRegistry;
    use crate::engine::features::excluded_volume::{BooleanOccupancy, ExcludedVolumeSc};
    use crate::engine::moves::{ConnectMove, LocalMove, LocalMoveSet, MonteCarloMove};
    use crate::engine::system::LatticeSystem;
    use crate::engine::testing::system_with;

    /// Two bonded monomers at (0,0,0) and (2,0,0) with a hand-made bond set.
    fn dimer(vectors: &[(Vector3D<i32>, i32)]) -> LatticeSystem {
        let config = SystemConfigBuilder::new()
            .box_size(16, 16, 16)
            .periodicity(true, true, true)
            .bond_set(BondSetKind::Empty)
            .build()
            .unwrap();
        let mut registry = FeatureRegistry::new();
        registry.register(ExcludedVolumeSc::<BooleanOccupancy>::new());
        registry.register(BondSetRule::new());
        let mut system = LatticeSystem::new(&config, registry).unwrap();
        for &(vector, id) in vectors {
            system.modify_bondset().add_bond(vector, id).unwrap();
        }
        let molecules = system.modify_molecules();
        molecules.add_monomer(Vector3D::new(0, 0, 0));
        molecules.add_monomer(Vector3D::new(2, 0, 0));
        molecules.connect(0, 1, Some(17)).unwrap();
        system.synchronize().unwrap();
        system
    }

    fn rule_only() -> FeatureRegistry {
        let mut registry = FeatureRegistry::new();
        registry.register(BondSetRule::new());
        registry
    }

    fn accepts(system: &LatticeSystem, direction: Vector3D<i32>) -> bool {
        let mut mv = LocalMove::new(LocalMoveSet::SimpleCubic);
        mv.init_with(system, 0, direction).unwrap();
        mv.check(system)
    }

    #[test]
    fn minimal_set_rejects_stretching_towards_partner() {
        let system = dimer(&[(Vector3D::new(2, 0, 0), 17), (Vector3D::new(-2, 0, 0), 20)]);
        assert!(!accepts(&system, Vector3D::new(1, 0, 0)));
        assert!(!accepts(&system, Vector3D::new(-1, 0, 0)));
        // (2,±1,0) and (2,0,±1) are not part of this set either.
        for d in [(0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1)] {
            assert!(!accepts(&system, Vector3D::new(d.0, d.1, d.2)));
        }
    }

    #[test]
    fn sideways_moves_are_accepted_once_their_vectors_are_in_the_set() {
        let system = dimer(&[
            (Vector3D::new(2, 0, 0), 17),
            (Vector3D::new(-2, 0, 0), 20),
            (Vector3D::new(2, 1, 0), 21),
            (Vector3D::new(2, -1, 0), 22),
            (Vector3D::new(2, 0, 1), 23),
            (Vector3D::new(2, 0, -1), 24),
        ]);
        assert!(!accepts(&system, Vector3D::new(1, 0, 0)));
        for d in [(0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1)] {
            assert!(accepts(&system, Vector3D::new(d.0, d.1, d.2)), "{d:?} rejected");
        }
    }

    #[test]
    fn classic_set_accepts_every_non_overlapping_step_of_a_dimer() {
        let system = system_with(
            [16; 3],
            rule_only(),
            &[Vector3D::new(0, 0, 0), Vector3D::new(2, 0, 0)],
            &[(0, 1)],
        );
        assert!(!accepts(&system, Vector3D::new(1, 0, 0)));
        assert!(accepts(&system, Vector3D::new(-1, 0, 0)));
        assert!(accepts(&system, Vector3D::new(0, 0, 1)));
    }

    #[test]
    fn stale_lookup_rejects_until_synchronized() {
        let mut system = dimer(&[(Vector3D::new(2, 0, 0), 17), (Vector3D::new(2, 1, 0), 21)]);
        assert!(accepts(&system, Vector3D::new(0, -1, 0)));
        system
            .modify_bondset()
            .add_bond(Vector3D::new(2, -1, 0), 22)
            .unwrap();
        assert!(!accepts(&system, Vector3D::new(0, -1, 0)));
        assert!(!accepts(&system, Vector3D::new(0, 1, 0)));
        system.synchronize().unwrap();
        assert!(accepts(&system, Vector3D::new(0, 1, 0)));
    }

    #[test]
    fn connect_requires_vector_in_set() {
        let mut system = system_with(
            [16; 3],
            rule_only(),
            &[
                Vector3D::new(0, 0, 0),
                Vector3D::new(3, 1, 0),
                Vector3D::new(0, 5, 0),
            ],
            &[],
        );
        let mut mv = ConnectMove::new();
        mv.init_with(&system, 0, 2).unwrap();
        assert!(!mv.check(&system));
        mv.init_with(&system, 0, 1).unwrap();
        assert!(mv.check(&system));
        mv.apply(&mut system).unwrap();
        let id = system.bondset().bond_identifier(3, 1, 0).unwrap();
        assert_eq!(system.molecules().link_info(0, 1), Ok(Some(id)));
    }

    #[test]
    fn synchronize_rejects_bonds_outside_the_set() {
        let config = SystemConfigBuilder::new()
            .box_size(16, 16, 16)
            .periodicity(true, true, true)
            .bond_set(BondSetKind::ClassicSc)
            .build()
            .unwrap();
        let mut system = LatticeSystem::new(&config, rule_only()).unwrap();
        let molecules = system.modify_molecules();
        molecules.add_monomer(Vector3D::new(0, 0, 0));
        molecules.add_monomer(Vector3D::new(1, 0, 0));
        molecules.connect(0, 1, None).unwrap();
        assert!(matches!(
            system.synchronize(),
            Err(EngineError::InvalidBond { first: 0, second: 1, .. })
        ));
    }

    #[test]
    fn out_of_range_vectors_surface_as_bond_set_errors() {
        let mut system = dimer(&[(Vector3D::new(2, 0, 0), 17)]);
        assert_eq!(
            system.modify_bondset().add_bond(Vector3D::new(5, 0, 0), 30),
            Err(BondSetError::ComponentOutOfRange(Vector3D::new(5, 0, 0)))
        );
    }
}
