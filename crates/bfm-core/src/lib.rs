//! # BFM Core Library
//!
//! A lattice Monte-Carlo engine for the Bond-Fluctuation-Model (BFM): polymer
//! chains whose monomers occupy 2×2×2 cubes on a periodic 3D grid, bonded by
//! vectors drawn from a finite set, evolving through randomly proposed moves.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same strict three-layer split throughout.
//!
//! - **[`core`]: The Foundation.** Stateless models: `Vector3D`, `BondSet`,
//!   `MoleculeGraph`, box geometry and folding, the occupancy `Lattice`, distance
//!   calculation and the random number engine.
//!
//! - **[`engine`]: The Logic Core.** The stateful machinery. A `LatticeSystem`
//!   owns the molecules, the bond set and an ordered pipeline of rules (features)
//!   resolved from declared dependencies. Moves (`LocalMove`, `AddMove`,
//!   `ConnectMove`, `BreakMove`) follow a strict init → check → apply protocol:
//!   `check` is read-only and returns `bool`, `apply` mutates lattice then graph.
//!
//! - **[`workflows`]: The Public API.** Complete procedures such as a Metropolis
//!   sweep run with progress reporting.

pub mod core;
pub mod engine;
pub mod workflows;
