use super::{
    MonteCarloMove, MoveCore, MoveKind, MoveState, Proposal, check_index, require_monomers,
};
use crate::core::rng::RandomNumberEngine;
use crate::engine::error::EngineError;
use crate::engine::system::LatticeSystem;

/// Removal of an existing bond.
#[derive(Debug, Clone, Default)]
pub struct BreakMove {
    core: MoveCore,
}

impl BreakMove {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init_with(
        &mut self,
        system: &LatticeSystem,
        index: usize,
        partner: usize,
    ) -> Result<(), EngineError> {
        check_index(system, index)?;
        check_index(system, partner)?;
        self.core.initialize(MoveKind::Break { index, partner });
        Ok(())
    }

    pub fn pair(&self) -> Option<(usize, usize)> {
        match *self.core.proposal()?.kind() {
            MoveKind::Break { index, partner } => Some((index, partner)),
            _ => None,
        }
    }
}

impl MonteCarloMove for BreakMove {
    /// Draws a monomer and one of its bonded neighbours. An unbonded monomer
    /// is paired with itself, which the check rejects.
    fn init(
        &mut self,
        system: &LatticeSystem,
        rng: &mut RandomNumberEngine,
    ) -> Result<(), EngineError> {
        let n = require_monomers(system)?;
        let index = rng.uniform_index(n);
        let partner = match system.molecules().num_links(index) {
            0 => index,
            degree => system
                .molecules()
                .neighbor_index(index, rng.uniform_index(degree))?,
        };
        self.core.initialize(MoveKind::Break { index, partner });
        Ok(())
    }

    fn check(&mut self, system: &LatticeSystem) -> bool {
        self.core.check(system, |kind, state| match *kind {
            MoveKind::Break { index, partner } => {
                index != partner && state.molecules().are_connected(index, partner)
            }
            _ => false,
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
