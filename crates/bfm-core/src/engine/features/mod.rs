//! # Features
//!
//! Independent rules consulted for every move. Each rule can veto a proposal,
//! weight its acceptance probability, react when it is applied and rebuild
//! derived caches on `synchronize`.
//!
//! Rules are registered in a [`FeatureRegistry`] and ordered by their declared
//! `runs_after` / `runs_before` relations into a [`FeaturePipeline`].

pub mod bond_set;
pub mod excluded_volume;
pub mod excluded_volume_bcc;
pub mod external_field;
pub mod fixed;
pub mod neighbor_list;
pub mod pair_interaction;
mod pipeline;
pub mod reactivity;
pub mod tagging;
pub mod wall;

pub use pipeline::{FeaturePipeline, FeatureRegistry};

use super::error::EngineError;
use super::moves::Proposal;
use super::state::SystemState;
use crate::core::models::vector::Vector3D;
use std::fmt;

pub trait Feature: Send {
    /// Unique name used for ordering relations and diagnostics.
    fn name(&self) -> &'static str;

    /// Names of features whose hooks must run before this one.
    fn runs_after(&self) -> &'static [&'static str] {
        &[]
    }

    /// Names of features whose hooks must run after this one.
    fn runs_before(&self) -> &'static [&'static str] {
        &[]
    }

    /// Read-only verdict on a proposal. May multiply an energetic weight into
    /// the proposal's probability accumulator.
    fn check_move(&self, state: &SystemState, proposal: &mut Proposal) -> bool;

    /// Reacts to an accepted proposal. Runs before the graph mutation, except
    /// for add moves where the new monomer already exists.
    fn apply_move(&mut self, _state: &mut SystemState, _proposal: &Proposal) {}

    /// Runs after the graph mutation; the place for deferred cache rebuilds.
    fn finalize_move(&mut self, _state: &SystemState, _proposal: &Proposal) {}

    /// Rebuilds all derived state from `state`.
    ///
    /// # Errors
    ///
    /// Fails when the configuration violates this feature's invariants.
    fn synchronize(&mut self, _state: &SystemState) -> Result<(), EngineError> {
        Ok(())
    }

    /// Writes a human-readable header line describing this feature.
    fn write_metadata(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "#!feature {}", self.name())
    }

    /// Occupancy value at `pos` for features that own a lattice.
    fn lattice_entry(&self, _pos: Vector3D<i32>) -> Option<u32> {
        None
    }
}
