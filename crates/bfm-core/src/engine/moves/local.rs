use super::{MonteCarloMove, MoveCore, MoveKind, MoveState, Proposal, check_index, require_monomers};
use crate::core::models::vector::Vector3D;
use crate::core::rng::RandomNumberEngine;
use crate::engine::error::EngineError;
use crate::engine::system::LatticeSystem;
use serde::Deserialize;

const fn v(x: i32, y: i32, z: i32) -> Vector3D<i32> {
    Vector3D::new(x, y, z)
}

const SIMPLE_CUBIC: [Vector3D<i32>; 6] = [
    v(1, 0, 0),
    v(-1, 0, 0),
    v(0, 1, 0),
    v(0, -1, 0),
    v(0, 0, 1),
    v(0, 0, -1),
];

const BCC: [Vector3D<i32>; 8] = [
    v(1, 1, 1),
    v(1, 1, -1),
    v(1, -1, 1),
    v(1, -1, -1),
    v(-1, 1, 1),
    v(-1, 1, -1),
    v(-1, -1, 1),
    v(-1, -1, -1),
];

const SC_DIAGONAL: [Vector3D<i32>; 18] = [
    v(1, 0, 0),
    v(-1, 0, 0),
    v(0, 1, 0),
    v(0, -1, 0),
    v(0, 0, 1),
    v(0, 0, -1),
    v(1, 1, 0),
    v(1, -1, 0),
    v(-1, 1, 0),
    v(-1, -1, 0),
    v(1, 0, 1),
    v(1, 0, -1),
    v(-1, 0, 1),
    v(-1, 0, -1),
    v(0, 1, 1),
    v(0, 1, -1),
    v(0, -1, 1),
    v(0, -1, -1),
];

const SC_JUMP: [Vector3D<i32>; 24] = [
    v(2, 1, 0),
    v(2, -1, 0),
    v(-2, 1, 0),
    v(-2, -1, 0),
    v(2, 0, 1),
    v(2, 0, -1),
    v(-2, 0, 1),
    v(-2, 0, -1),
    v(1, 2, 0),
    v(1, -2, 0),
    v(-1, 2, 0),
    v(-1, -2, 0),
    v(0, 2, 1),
    v(0, 2, -1),
    v(0, -2, 1),
    v(0, -2, -1),
    v(1, 0, 2),
    v(1, 0, -2),
    v(-1, 0, 2),
    v(-1, 0, -2),
    v(0, 1, 2),
    v(0, 1, -2),
    v(0, -1, 2),
    v(0, -1, -2),
];

/// The displacement vocabulary a local move draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocalMoveSet {
    /// The 6 unit steps along the axes.
    SimpleCubic,
    /// The 8 body-diagonal steps `(±1, ±1, ±1)`.
    Bcc,
    /// Axis steps plus the 12 face diagonals.
    ScDiagonal,
    /// The 24 permutations of `(±2, ±1, 0)`.
    ScJump,
}

impl LocalMoveSet {
    pub fn directions(self) -> &'static [Vector3D<i32>] {
        match self {
            LocalMoveSet::SimpleCubic => &SIMPLE_CUBIC,
            LocalMoveSet::Bcc => &BCC,
            LocalMoveSet::ScDiagonal => &SC_DIAGONAL,
            LocalMoveSet::ScJump => &SC_JUMP,
        }
    }

    #[inline]
    pub fn draw(self, rng: &mut RandomNumberEngine) -> Vector3D<i32> {
        let directions = self.directions();
        directions[rng.uniform_index(directions.len())]
    }
}

/// Displacement of a single monomer by a lattice vector.
#[derive(Debug, Clone)]
pub struct LocalMove {
    move_set: LocalMoveSet,
    core: MoveCore,
}

impl LocalMove {
    pub fn new(move_set: LocalMoveSet) -> Self {
        Self {
            move_set,
            core: MoveCore::default(),
        }
    }

    pub fn move_set(&self) -> LocalMoveSet {
        self.move_set
    }

    /// Sets both the monomer and the displacement explicitly. The direction
    /// need not belong to the move set.
    pub fn init_with(
        &mut self,
        system: &LatticeSystem,
        index: usize,
        direction: Vector3D<i32>,
    ) -> Result<(), EngineError> {
        check_index(system, index)?;
        self.core.initialize(MoveKind::Local { index, direction });
        Ok(())
    }

    /// Fixes the monomer and draws the direction.
    pub fn init_with_index(
        &mut self,
        system: &LatticeSystem,
        rng: &mut RandomNumberEngine,
        index: usize,
    ) -> Result<(), EngineError> {
        check_index(system, index)?;
        let direction = self.move_set.draw(rng);
        self.core.initialize(MoveKind::Local { index, direction });
        Ok(())
    }

    /// Fixes the direction and draws the monomer.
    pub fn init_with_direction(
        &mut self,
        system: &LatticeSystem,
        rng: &mut RandomNumberEngine,
        direction: Vector3D<i32>,
    ) -> Result<(), EngineError> {
        let n = require_monomers(system)?;
        let index = rng.uniform_index(n);
        self.core.initialize(MoveKind::Local { index, direction });
        Ok(())
    }

    pub fn index(&self) -> Option<usize> {
        self.core.proposal().map(Proposal::index)
    }

    pub fn direction(&self) -> Option<Vector3D<i32>> {
        match self.core.proposal()?.kind() {
            MoveKind::Local { direction, .. } => Some(*direction),
            _ => None,
        }
    }
}

impl MonteCarloMove for LocalMove {
    fn init(
        &mut self,
        system: &LatticeSystem,
        rng: &mut RandomNumberEngine,
    ) -> Result<(), EngineError> {
        let n = require_monomers(system)?;
        let index = rng.uniform_index(n);
        let direction = self.move_set.draw(rng);
        self.core.initialize(MoveKind::Local { index, direction });
        Ok(())
    }

    fn check(&mut self, system: &LatticeSystem) -> bool {
        self.core.check(system, |kind, state| {
            matches!(kind, MoveKind::Local { index, .. } if *index < state.molecules().len())
        })
    }

    fn apply(&mut self, system: &mut LatticeSystem) -> Result<(), EngineError> {
        self.core.apply(system)
    }

    fn probability(&self) -> f64 {
        self.core.probability()
    }

    fn state(&self) -> MoveState {
        self.core.state()
    }

    fn proposal(&self) -> Option<&Proposal> {
        self.core.proposal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::features::FeatureRegistry;
    use crate::engine::features::bond_set::BondSetRule;
    use crate::engine::features::excluded_volume::{BooleanOccupancy, ExcludedVolumeSc};
    use crate::engine::testing::{cubic_system, system_with};
    use rand::SeedableRng;
    use std::collections::HashSet;

    mod move_sets {
        use super::*;

        #[test]
        fn move_sets_have_expected_sizes_and_no_duplicates() {
            for (set, len) in [
                (LocalMoveSet::SimpleCubic, 6),
                (LocalMoveSet::Bcc, 8),
                (LocalMoveSet::ScDiagonal, 18),
                (LocalMoveSet::ScJump, 24),
            ] {
                let directions = set.directions();
                assert_eq!(directions.len(), len);
                let unique: HashSet<_> = directions.iter().collect();
                assert_eq!(unique.len(), len);
                for d in directions {
                    assert!(directions.contains(&-*d), "{set:?} is not symmetric");
                }
            }
        }

        #[test]
        fn jump_set_is_every_permutation_of_two_one_zero() {
            for d in LocalMoveSet::ScJump.directions() {
                let mut abs = [d.x.abs(), d.y.abs(), d.z.abs()];
                abs.sort_unstable();
                assert_eq!(abs, [0, 1, 2]);
            }
        }

        #[test]
        fn draw_covers_all_directions() {
            let mut rng = RandomNumberEngine::seed_from_u64(11);
            let seen: HashSet<_> = (0..2000).map(|_| LocalMoveSet::ScDiagonal.draw(&mut rng)).collect();
            assert_eq!(seen.len(), 18);
        }
    }

    mod state_machine {
        use super::*;

        #[test]
        fn init_on_empty_system_fails() {
            let system = cubic_system(8, FeatureRegistry::new(), &[]);
            let mut rng = RandomNumberEngine::seed_from_u64(1);
            let mut mv = LocalMove::new(LocalMoveSet::SimpleCubic);
            assert!(matches!(mv.init(&system, &mut rng), Err(EngineError::EmptySystem)));
            assert_eq!(mv.state(), MoveState::Uninitialized);
        }

        #[test]
        fn init_with_rejects_out_of_range_index() {
            let system = cubic_system(8, FeatureRegistry::new(), &[Vector3D::new(0, 0, 0)]);
            let mut mv = LocalMove::new(LocalMoveSet::SimpleCubic);
            assert!(matches!(
                mv.init_with(&system, 3, Vector3D::new(1, 0, 0)),
                Err(EngineError::Graph { .. })
            ));
        }

        #[test]
        fn check_without_init_is_false() {
            let system = cubic_system(8, FeatureRegistry::new(), &[Vector3D::new(0, 0, 0)]);
            let mut mv = LocalMove::new(LocalMoveSet::SimpleCubic);
            assert!(!mv.check(&system));
            assert_eq!(mv.state(), MoveState::Uninitialized);
        }

        #[test]
        fn apply_without_successful_check_is_an_error() {
            let mut system = cubic_system(8, FeatureRegistry::new(), &[Vector3D::new(0, 0, 0)]);
            let mut mv = LocalMove::new(LocalMoveSet::SimpleCubic);
            mv.init_with(&system, 0, Vector3D::new(1, 0, 0)).unwrap();
            assert!(matches!(
                mv.apply(&mut system),
                Err(EngineError::InvalidMoveState(MoveState::Initialized))
            ));
            assert_eq!(system.molecules().position(0), Vector3D::new(0, 0, 0));
        }

        #[test]
        fn apply_after_rejection_is_an_error_and_changes_nothing() {
            let mut registry = FeatureRegistry::new();
            registry.register(ExcludedVolumeSc::<BooleanOccupancy>::new());
            let mut system = cubic_system(
                16,
                registry,
                &[Vector3D::new(0, 0, 0), Vector3D::new(2, 0, 0)],
            );
            let mut mv = LocalMove::new(LocalMoveSet::SimpleCubic);
            mv.init_with(&system, 0, Vector3D::new(1, 0, 0)).unwrap();
            assert!(!mv.check(&system));
            assert_eq!(mv.state(), MoveState::Rejected);
            assert!(mv.apply(&mut system).is_err());
            assert_eq!(system.molecules().position(0), Vector3D::new(0, 0, 0));
        }

        #[test]
        fn check_is_idempotent_and_second_apply_fails() {
            let mut system = cubic_system(8, FeatureRegistry::new(), &[Vector3D::new(1, 1, 1)]);
            let mut mv = LocalMove::new(LocalMoveSet::SimpleCubic);
            mv.init_with(&system, 0, Vector3D::new(0, 1, 0)).unwrap();
            assert!(mv.check(&system));
            assert!(mv.check(&system));
            assert_eq!(mv.state(), MoveState::Accepted);
            mv.apply(&mut system).unwrap();
            assert_eq!(mv.state(), MoveState::Applied);
            assert!(!mv.check(&system));
            assert!(mv.apply(&mut system).is_err());
            assert_eq!(system.molecules().position(0), Vector3D::new(1, 2, 1));
        }

        #[test]
        fn explicit_overloads_fix_the_requested_part() {
            let system = cubic_system(
                8,
                FeatureRegistry::new(),
                &[Vector3D::new(0, 0, 0), Vector3D::new(4, 4, 4)],
            );
            let mut rng = RandomNumberEngine::seed_from_u64(3);
            let mut mv = LocalMove::new(LocalMoveSet::Bcc);
            for _ in 0..20 {
                mv.init_with_index(&system, &mut rng, 1).unwrap();
                assert_eq!(mv.index(), Some(1));
                assert!(LocalMoveSet::Bcc.directions().contains(&mv.direction().unwrap()));

                mv.init_with_direction(&system, &mut rng, Vector3D::new(0, 0, -1)).unwrap();
                assert_eq!(mv.direction(), Some(Vector3D::new(0, 0, -1)));
                assert!(mv.index().unwrap() < 2);
            }
        }

        #[test]
        fn random_init_draws_every_monomer() {
            let positions: Vec<_> = (0..4).map(|i| Vector3D::new(4 * i, 0, 0)).collect();
            let system = cubic_system(32, FeatureRegistry::new(), &positions);
            let mut rng = RandomNumberEngine::seed_from_u64(8);
            let mut mv = LocalMove::new(LocalMoveSet::SimpleCubic);
            let mut seen = HashSet::new();
            for _ in 0..200 {
                mv.init(&system, &mut rng).unwrap();
                assert_eq!(mv.probability(), 1.0);
                seen.insert(mv.index().unwrap());
            }
            assert_eq!(seen.len(), 4);
        }
    }

    mod physics {
        use super::*;

        #[test]
        fn single_monomer_step_updates_lattice() {
            let mut registry = FeatureRegistry::new();
            registry.register(ExcludedVolumeSc::<BooleanOccupancy>::new());
            let mut system = cubic_system(8, registry, &[Vector3D::new(1, 1, 1)]);

            let mut mv = LocalMove::new(LocalMoveSet::SimpleCubic);
            mv.init_with(&system, 0, Vector3D::new(1, 0, 0)).unwrap();
            assert!(mv.check(&system));
            mv.apply(&mut system).unwrap();

            assert_eq!(system.molecules().position(0), Vector3D::new(2, 1, 1));
            assert_eq!(system.lattice_entry(Vector3D::new(1, 1, 1)), Some(0));
            assert_eq!(system.lattice_entry(Vector3D::new(2, 1, 1)), Some(1));
            assert_eq!(system.lattice_entry(Vector3D::new(3, 2, 2)), Some(1));
        }

        #[test]
        fn step_and_reverse_step_restore_state() {
            let mut registry = FeatureRegistry::new();
            registry.register(ExcludedVolumeSc::<BooleanOccupancy>::new());
            registry.register(BondSetRule::new());
            let mut system = system_with(
                [16, 16, 16],
                registry,
                &[Vector3D::new(4, 4, 4), Vector3D::new(6, 4, 4)],
                &[(0, 1)],
            );
            let mut mv = LocalMove::new(LocalMoveSet::SimpleCubic);
            for direction in LocalMoveSet::SimpleCubic.directions() {
                mv.init_with(&system, 1, *direction).unwrap();
                if !mv.check(&system) {
                    continue;
                }
                mv.apply(&mut system).unwrap();
                mv.init_with(&system, 1, -*direction).unwrap();
                assert!(mv.check(&system), "reverse of {direction} rejected");
                mv.apply(&mut system).unwrap();
                assert_eq!(system.molecules().position(1), Vector3D::new(6, 4, 4));
                for dx in 0..2 {
                    for dy in 0..2 {
                        for dz in 0..2 {
                            let cell = Vector3D::new(6 + dx, 4 + dy, 4 + dz);
                            assert_eq!(system.lattice_entry(cell), Some(1));
                        }
                    }
                }
            }
        }
    }
}
