use super::Feature;
use crate::engine::moves::{MoveKind, Proposal};
use crate::engine::state::SystemState;
use std::fmt;

/// Stamps a fixed tag onto every monomer created by an add move.
///
/// Runs in the apply stage, after the monomer has been appended, so that
/// features ordered after it (e.g. tag-painting excluded volume) see the tag.
#[derive(Debug, Clone, Copy)]
pub struct MonomerTagging {
    tag: i32,
}

impl MonomerTagging {
    pub const NAME: &'static str = "monomer-tagging";

    pub fn new(tag: i32) -> Self {
        Self { tag }
    }

    pub fn tag(&self) -> i32 {
        self.tag
    }
}

impl Feature for MonomerTagging {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check_move(&self, _state: &SystemState, _proposal: &mut Proposal) -> bool {
        true
    }

    fn apply_move(&mut self, state: &mut SystemState, proposal: &Proposal) {
        if let MoveKind::Add { index, .. } = *proposal.kind() {
            if let Some(monomer) = state.molecules_mut().get_mut(index) {
                monomer.attributes.tag = self.tag;
            }
        }
    }

    fn write_metadata(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "#!feature {} tag={}", Self::NAME, self.tag)
    }
}
