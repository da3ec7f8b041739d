//! # Moves
//!
//! Elementary Monte-Carlo proposals and their state machine.
//!
//! Every move walks through `Uninitialized → Initialized → Accepted | Rejected
//! → Applied`. `init` draws (or is given) a proposal, `check` evaluates it
//! against the system without touching lattice or graph, and `apply` commits an
//! accepted proposal. A rejected move is a normal outcome, not an error.
//!
//! An acceptance is only valid for the system revision it was computed
//! against. Once anything else mutates the system, `apply` refuses the stale
//! verdict and the move drops back to `Initialized` until checked again.

pub mod add;
pub mod break_bond;
pub mod connect;
pub mod local;

pub use add::AddMove;
pub use break_bond::BreakMove;
pub use connect::ConnectMove;
pub use local::{LocalMove, LocalMoveSet};

use super::error::EngineError;
use super::state::SystemState;
use super::system::LatticeSystem;
use crate::core::models::graph::{GraphError, MoleculeGraph};
use crate::core::models::monomer::MonomerAttributes;
use crate::core::models::vector::Vector3D;
use crate::core::rng::RandomNumberEngine;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveState {
    #[default]
    Uninitialized,
    Initialized,
    Accepted,
    Rejected,
    Applied,
}

impl fmt::Display for MoveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MoveState::Uninitialized => "uninitialized",
            MoveState::Initialized => "initialized",
            MoveState::Accepted => "accepted",
            MoveState::Rejected => "rejected",
            MoveState::Applied => "applied",
        };
        f.write_str(name)
    }
}

/// What a move proposes to change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveKind {
    /// Displace monomer `index` by `direction`.
    Local {
        index: usize,
        direction: Vector3D<i32>,
    },
    /// Append a monomer; `index` is the index it will receive.
    Add {
        index: usize,
        position: Vector3D<i32>,
        attributes: MonomerAttributes,
    },
    Connect {
        index: usize,
        partner: usize,
    },
    Break {
        index: usize,
        partner: usize,
    },
}

/// A proposal together with its acceptance-probability accumulator.
///
/// Features read the proposal and may multiply energetic weights into the
/// accumulator during `check`. Drawing the Metropolis random number is left to
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    kind: MoveKind,
    probability: f64,
}

impl Proposal {
    pub fn new(kind: MoveKind) -> Self {
        Self {
            kind,
            probability: 1.0,
        }
    }

    #[inline]
    pub fn kind(&self) -> &MoveKind {
        &self.kind
    }

    /// The monomer the move acts on (the new index for add moves).
    #[inline]
    pub fn index(&self) -> usize {
        match self.kind {
            MoveKind::Local { index, .. }
            | MoveKind::Add { index, .. }
            | MoveKind::Connect { index, .. }
            | MoveKind::Break { index, .. } => index,
        }
    }

    /// Where the monomer ends up for local and add moves.
    #[inline]
    pub fn target_position(&self, molecules: &MoleculeGraph) -> Option<Vector3D<i32>> {
        match self.kind {
            MoveKind::Local { index, direction } => Some(molecules.position(index) + direction),
            MoveKind::Add { position, .. } => Some(position),
            MoveKind::Connect { .. } | MoveKind::Break { .. } => None,
        }
    }

    #[inline]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    #[inline]
    pub fn multiply_probability(&mut self, factor: f64) {
        self.probability *= factor;
    }

    #[inline]
    pub fn reset_probability(&mut self) {
        self.probability = 1.0;
    }
}

/// The public contract shared by every move type.
pub trait MonteCarloMove {
    /// Draws a fresh random proposal and resets the probability to 1.
    ///
    /// # Errors
    ///
    /// `EmptySystem` (or `InsufficientMonomers`) when there is nothing to draw from.
    fn init(
        &mut self,
        system: &LatticeSystem,
        rng: &mut RandomNumberEngine,
    ) -> Result<(), EngineError>;

    /// Evaluates the current proposal. Idempotent and read-only on the system;
    /// only the probability accumulator changes. Returns `false` for moves that
    /// were never initialized or have already been applied.
    fn check(&mut self, system: &LatticeSystem) -> bool;

    /// Commits an accepted proposal: feature apply hooks, then the graph
    /// mutation, then finalize hooks.
    ///
    /// # Errors
    ///
    /// `InvalidMoveState` unless the last `check` returned `true`, and
    /// `StaleCheck` if the system changed since that check.
    fn apply(&mut self, system: &mut LatticeSystem) -> Result<(), EngineError>;

    fn probability(&self) -> f64;

    fn state(&self) -> MoveState;

    fn proposal(&self) -> Option<&Proposal>;
}

/// State machine bookkeeping shared by the concrete moves.
#[derive(Debug, Clone, Default)]
pub(crate) struct MoveCore {
    proposal: Option<Proposal>,
    state: MoveState,
    /// System revision the last acceptance was computed against.
    checked_at: Option<u64>,
}

impl MoveCore {
    pub(crate) fn initialize(&mut self, kind: MoveKind) {
        self.proposal = Some(Proposal::new(kind));
        self.state = MoveState::Initialized;
        self.checked_at = None;
    }

    pub(crate) fn proposal(&self) -> Option<&Proposal> {
        self.proposal.as_ref()
    }

    pub(crate) fn proposal_mut(&mut self) -> Option<&mut Proposal> {
        self.proposal.as_mut()
    }

    pub(crate) fn state(&self) -> MoveState {
        self.state
    }

    pub(crate) fn probability(&self) -> f64 {
        self.proposal.map_or(1.0, |p| p.probability)
    }

    /// Runs `structural` and then the feature pipeline, recording the verdict.
    pub(crate) fn check<F>(&mut self, system: &LatticeSystem, structural: F) -> bool
    where
        F: FnOnce(&MoveKind, &SystemState) -> bool,
    {
        if matches!(self.state, MoveState::Uninitialized | MoveState::Applied) {
            return false;
        }
        let Some(proposal) = self.proposal.as_mut() else {
            return false;
        };
        proposal.reset_probability();
        let accepted =
            structural(&proposal.kind, system.state()) && system.check_proposal(proposal);
        (self.state, self.checked_at) = if accepted {
            (MoveState::Accepted, Some(system.revision()))
        } else {
            (MoveState::Rejected, None)
        };
        accepted
    }

    pub(crate) fn apply(&mut self, system: &mut LatticeSystem) -> Result<(), EngineError> {
        let proposal = match (self.state, self.proposal) {
            (MoveState::Accepted, Some(proposal)) => proposal,
            _ => return Err(EngineError::InvalidMoveState(self.state)),
        };
        let current = system.revision();
        match self.checked_at {
            Some(checked) if checked == current => {}
            checked => {
                self.state = MoveState::Initialized;
                self.checked_at = None;
                return Err(EngineError::StaleCheck {
                    checked: checked.unwrap_or_default(),
                    current,
                });
            }
        }
        system.commit(&proposal)?;
        self.state = MoveState::Applied;
        self.checked_at = None;
        Ok(())
    }
}

/// Fails with `EmptySystem` for a graph without monomers.
pub(crate) fn require_monomers(system: &LatticeSystem) -> Result<usize, EngineError> {
    match system.molecules().len() {
        0 => Err(EngineError::EmptySystem),
        n => Ok(n),
    }
}

pub(crate) fn check_index(system: &LatticeSystem, index: usize) -> Result<(), EngineError> {
    let len = system.molecules().len();
    if index >= len {
        return Err(GraphError::IndexOutOfRange { index, len }.into());
    }
    Ok(())
}
