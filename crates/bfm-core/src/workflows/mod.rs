//! # Workflows Module
//!
//! High-level procedures that drive a [`LatticeSystem`](crate::engine::system::LatticeSystem)
//! through complete simulation runs.
//!
//! ## Overview
//!
//! Workflows are the entry points for users of the engine. They own the
//! Metropolis acceptance step, advance the Monte-Carlo age and report progress,
//! so callers only supply a configured system, a seeded random number engine
//! and run parameters.
//!
//! ## Architecture
//!
//! - **Sweep Workflow** ([`simulate`]) - repeated sweeps of local moves with one
//!   attempt per monomer, accepted by the Metropolis criterion

pub mod simulate;
