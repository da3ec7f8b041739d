use super::Feature;
use crate::engine::moves::{MoveKind, Proposal};
use crate::engine::state::SystemState;

/// Pins monomers whose `movable` attribute is cleared.
#[derive(Debug, Default)]
pub struct FixedMonomers;

impl FixedMonomers {
    pub const NAME: &'static str = "fixed-monomers";

    pub fn new() -> Self {
        Self
    }
}

impl Feature for FixedMonomers {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check_move(&self, state: &SystemState, proposal: &mut Proposal) -> bool {
        match *proposal.kind() {
            MoveKind::Local { index, .. } => state.molecules().attributes(index).movable,
            _ => true,
        }
    }
}
