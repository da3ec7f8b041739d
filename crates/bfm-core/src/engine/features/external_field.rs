use super::Feature;
use crate::core::lattice::Axis;
use crate::engine::moves::{MoveKind, Proposal};
use crate::engine::state::SystemState;
use std::fmt;

/// Linear potential `E = strength * coordinate(axis)` in units of kT.
///
/// Only local moves change the energy; the Boltzmann factor `exp(-ΔE)` is
/// multiplied into the proposal's probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExternalField {
    axis: Axis,
    strength: f64,
}

impl ExternalField {
    pub const NAME: &'static str = "external-field";

    pub fn new(axis: Axis, strength: f64) -> Self {
        Self { axis, strength }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }
}

impl Feature for ExternalField {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check_move(&self, _state: &SystemState, proposal: &mut Proposal) -> bool {
        if let MoveKind::Local { direction, .. } = *proposal.kind() {
            let delta = self.strength * f64::from(self.axis.component(&direction));
            if delta != 0.0 {
                proposal.multiply_probability((-delta).exp());
            }
        }
        true
    }

    fn write_metadata(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(
            out,
            "#!feature {} axis={} strength={}",
            Self::NAME,
            self.axis,
            self.strength
        )
    }
}
