use super::{MonteCarloMove, MoveCore, MoveKind, MoveState, Proposal, check_index};
use crate::core::rng::RandomNumberEngine;
use crate::engine::error::EngineError;
use crate::engine::state::SystemState;
use crate::engine::system::LatticeSystem;

/// Creation of a bond between two existing monomers.
#[derive(Debug, Clone, Default)]
pub struct ConnectMove {
    core: MoveCore,
}

impl ConnectMove {
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
        self.core.initialize(MoveKind::Connect { index, partner });
        Ok(())
    }

    pub fn pair(&self) -> Option<(usize, usize)> {
        match *self.core.proposal()?.kind() {
            MoveKind::Connect { index, partner } => Some((index, partner)),
            _ => None,
        }
    }

    /// Structural preconditions: distinct in-range monomers, no existing link,
    /// free valence on both ends, and a separation that is a bond vector.
    fn is_bondable(state: &SystemState, index: usize, partner: usize) -> bool {
        let molecules = state.molecules();
        let max_degree = molecules.max_degree();
        index != partner
            && index < molecules.len()
            && partner < molecules.len()
            && state
                .bondset()
                .is_valid_fast(&(molecules.position(partner) - molecules.position(index)))
            && !molecules.are_connected(index, partner)
            && molecules.num_links(index) < max_degree
            && molecules.num_links(partner) < max_degree
    }
}

impl MonteCarloMove for ConnectMove {
    /// Draws a monomer and a distinct partner uniformly.
    fn init(
        &mut self,
        system: &LatticeSystem,
        rng: &mut RandomNumberEngine,
    ) -> Result<(), EngineError> {
        let n = system.molecules().len();
        if n < 2 {
            return Err(EngineError::InsufficientMonomers {
                required: 2,
                found: n,
            });
        }
        let index = rng.uniform_index(n);
        let mut partner = rng.uniform_index(n - 1);
        if partner >= index {
            partner += 1;
        }
        self.core.initialize(MoveKind::Connect { index, partner });
        Ok(())
    }

    fn check(&mut self, system: &LatticeSystem) -> bool {
        self.core.check(system, |kind, state| match *kind {
            MoveKind::Connect { index, partner } => Self::is_bondable(state, index, partner),
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
