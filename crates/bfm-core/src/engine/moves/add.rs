use super::{MonteCarloMove, MoveCore, MoveKind, MoveState, Proposal};
use crate::core::models::monomer::MonomerAttributes;
use crate::core::models::vector::Vector3D;
use crate::core::rng::RandomNumberEngine;
use crate::engine::error::EngineError;
use crate::engine::system::LatticeSystem;

/// Insertion of a new, unbonded monomer.
///
/// The proposal always targets index `N`, the number of monomers at check
/// time, so a move initialized before other insertions stays consistent.
#[derive(Debug, Clone, Default)]
pub struct AddMove {
    attributes: MonomerAttributes,
    core: MoveCore,
}

impl AddMove {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes given to randomly placed monomers.
    pub fn with_attributes(attributes: MonomerAttributes) -> Self {
        Self {
            attributes,
            core: MoveCore::default(),
        }
    }

    pub fn init_with(
        &mut self,
        system: &LatticeSystem,
        position: Vector3D<i32>,
        attributes: MonomerAttributes,
    ) {
        self.core.initialize(MoveKind::Add {
            index: system.molecules().len(),
            position,
            attributes,
        });
    }

    pub fn position(&self) -> Option<Vector3D<i32>> {
        match self.core.proposal()?.kind() {
            MoveKind::Add { position, .. } => Some(*position),
            _ => None,
        }
    }
}

impl MonteCarloMove for AddMove {
    /// Draws a position uniformly from the box. Never fails; an empty system
    /// is a valid starting point for insertion.
    fn init(
        &mut self,
        system: &LatticeSystem,
        rng: &mut RandomNumberEngine,
    ) -> Result<(), EngineError> {
        let mut draw = |size: i32| rng.uniform_index(size.unsigned_abs() as usize) as i32;
        let position = Vector3D::new(
            draw(system.box_x()),
            draw(system.box_y()),
            draw(system.box_z()),
        );
        self.init_with(system, position, self.attributes);
        Ok(())
    }

    fn check(&mut self, system: &LatticeSystem) -> bool {
        let len = system.molecules().len();
        if let Some(Proposal {
            kind: MoveKind::Add { index, .. },
            ..
        }) = self.core.proposal_mut()
        {
            *index = len;
        }
        self.core.check(system, |kind, state| {
            matches!(kind, MoveKind::Add { index, .. } if *index == state.molecules().len())
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
