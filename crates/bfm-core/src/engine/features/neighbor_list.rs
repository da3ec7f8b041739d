use crate::core::lattice::DistanceCalculator;
use crate::core::models::graph::MoleculeGraph;
use crate::core::models::vector::Vector3D;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Verlet neighbour list with a skin.
///
/// Every pair closer than `cutoff + skin` at the last rebuild is listed. As
/// long as no monomer has travelled more than `skin / 2` since then, every
/// pair that is currently within `cutoff` is guaranteed to be in the list.
#[derive(Debug, Clone)]
pub struct NeighborList {
    cutoff: f64,
    skin: f64,
    neighbors: Vec<Vec<usize>>,
    reference: Vec<Vector3D<i32>>,
    stale: bool,
}

impl NeighborList {
    pub fn new(cutoff: f64, skin: f64) -> Self {
        Self {
            cutoff,
            skin,
            neighbors: Vec::new(),
            reference: Vec::new(),
            stale: true,
        }
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn skin(&self) -> f64 {
        self.skin
    }

    /// Radius used when building the list.
    pub fn list_radius(&self) -> f64 {
        self.cutoff + self.skin
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Number of monomers covered by the last rebuild.
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.neighbors.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `position` lies within half a skin of `index`'s position at the
    /// last rebuild. Positions are unfolded, so a plain difference is exact.
    pub fn is_within_skin(&self, index: usize, position: Vector3D<i32>) -> bool {
        let Some(&reference) = self.reference.get(index) else {
            return false;
        };
        let d = (position - reference).widen::<i64>();
        let half = self.skin / 2.0;
        ((d * d) as f64) <= half * half
    }

    /// Records a displacement; returns `true` if it invalidated the list.
    pub fn record_move(&mut self, index: usize, position: Vector3D<i32>) -> bool {
        if !self.is_within_skin(index, position) {
            self.stale = true;
        }
        self.stale
    }

    /// Whether the list still describes `molecules`.
    pub fn is_valid_for(&self, molecules: &MoleculeGraph) -> bool {
        !self.stale && self.reference.len() == molecules.len()
    }

    #[instrument(skip_all, name = "neighbor_list_rebuild", fields(monomers = molecules.len()))]
    pub fn rebuild(&mut self, molecules: &MoleculeGraph, distances: &DistanceCalculator) {
        let positions: Vec<Vector3D<i32>> = molecules.iter().map(|m| m.position).collect();
        let radius = self.list_radius();
        let limit = radius * radius;
        let n = positions.len();

        #[cfg(not(feature = "parallel"))]
        let iterator = 0..n;

        #[cfg(feature = "parallel")]
        let iterator = (0..n).into_par_iter();

        self.neighbors = iterator
            .map(|i| {
                (0..n)
                    .filter(|&j| {
                        j != i
                            && (distances.distance_squared(positions[i], positions[j]) as f64)
                                <= limit
                    })
                    .collect()
            })
            .collect();
        self.reference = positions;
        self.stale = false;

        debug!(
            pairs = self.neighbors.iter().map(Vec::len).sum::<usize>() / 2,
            "Neighbour list rebuilt"
        );
    }
}
