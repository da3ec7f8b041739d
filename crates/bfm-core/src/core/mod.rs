//! # Core Module
//!
//! Stateless building blocks of the Bond-Fluctuation-Model engine.
//!
//! ## Overview
//!
//! Everything in this module is a plain value type or data structure with no
//! knowledge of moves or rules. The [`engine`](crate::engine) layer composes
//! these pieces into a running simulation.
//!
//! ## Architecture
//!
//! - **Models** ([`models`]) - `Vector3D` arithmetic with static type promotion,
//!   the `BondSet` vector vocabulary, monomers and the bounded-degree `MoleculeGraph`
//! - **Lattice** ([`lattice`]) - simulation box geometry, periodic folding, the dense
//!   occupancy `Lattice` and minimum-image distances
//! - **Random numbers** ([`rng`]) - the seeded R250/521 engine used for move proposals

pub mod lattice;
pub mod models;
pub mod rng;
