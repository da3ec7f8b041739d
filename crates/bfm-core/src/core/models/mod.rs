pub mod bondset;
pub mod graph;
pub mod monomer;
pub mod vector;
