//! # Engine Module
//!
//! Stateful simulation machinery of the Bond-Fluctuation-Model.
//!
//! ## Overview
//!
//! A [`LatticeSystem`](system::LatticeSystem) owns the molecule graph, the bond
//! vocabulary, the box geometry and an ordered pipeline of rules. Moves propose
//! changes, the rules veto or weight them and, once accepted, every rule updates
//! its caches before the graph itself changes.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - builders for box, bond set and sweep parameters
//! - **System** ([`system`]) - the composed simulation and its commit protocol
//! - **State** ([`state`]) - the canonical data read by every rule
//! - **Moves** ([`moves`]) - local, add, connect and break proposals with a shared
//!   init → check → apply state machine
//! - **Features** ([`features`]) - excluded volume, bond-set validity, walls,
//!   external fields, pair interactions and other rules, ordered by declared dependencies
//! - **Progress Monitoring** ([`progress`]) - callback-based progress reporting
//! - **Error Handling** ([`error`]) - the engine-wide error type

pub mod config;
pub mod error;
pub mod features;
pub mod moves;
pub mod progress;
pub mod state;
pub mod system;

#[cfg(test)]
pub(crate) mod testing;
