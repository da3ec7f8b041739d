use super::Feature;
use crate::engine::moves::{MoveKind, Proposal};
use crate::engine::state::SystemState;

/// Bonds may only form or break between monomers flagged reactive.
#[derive(Debug, Default)]
pub struct Reactivity;

impl Reactivity {
    pub const NAME: &'static str = "reactivity";

    pub fn new() -> Self {
        Self
    }
}

impl Feature for Reactivity {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check_move(&self, state: &SystemState, proposal: &mut Proposal) -> bool {
        match *proposal.kind() {
            MoveKind::Connect { index, partner } | MoveKind::Break { index, partner } => {
                let molecules = state.molecules();
                molecules.attributes(index).reactive && molecules.attributes(partner).reactive
            }
            MoveKind::Local { .. } | MoveKind::Add { .. } => true,
        }
    }
}
