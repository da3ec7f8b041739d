use super::monomer::{Monomer, MonomerAttributes};
use super::vector::Vector3D;
use thiserror::Error;

/// Default upper bound on the number of links per monomer.
pub const DEFAULT_MAX_DEGREE: usize = 8;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum GraphError {
    #[error("Monomer index {index} is out of range for a graph of {len} monomers")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Cannot connect monomer {0} to itself")]
    SelfConnection(usize),
    #[error("Monomers {0} and {1} are already connected")]
    AlreadyConnected(usize, usize),
    #[error("Monomer {index} already has the maximum of {max_degree} links")]
    DegreeOverflow { index: usize, max_degree: usize },
    #[error("Monomers {0} and {1} are not connected")]
    NotConnected(usize, usize),
    #[error("Monomer {index} has {degree} links; neighbour {k} does not exist")]
    NeighborOutOfRange { index: usize, k: usize, degree: usize },
}

/// One end of an undirected edge as stored in the owner's link list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub partner: usize,
    /// Optional payload, typically the bond vector identifier.
    pub info: Option<i32>,
}

/// Monomer positions plus a bounded-degree undirected connectivity graph.
///
/// Vertices are addressed by dense indices in insertion order. The graph also
/// carries the Monte-Carlo age (in sweeps) of the configuration it describes.
#[derive(Debug, Clone)]
pub struct MoleculeGraph {
    /// Vertex storage, indexed by monomer index.
    monomers: Vec<Monomer>,
    /// Adjacency lists; both ends of each edge store a `Link`.
    links: Vec<Vec<Link>>,
    /// Upper bound on `links[i].len()`.
    max_degree: usize,
    /// Monte-Carlo steps performed on this configuration.
    age: u64,
}

impl Default for MoleculeGraph {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEGREE)
    }
}

impl MoleculeGraph {
    /// Creates an empty graph whose vertices may carry at most `max_degree` links.
    pub fn new(max_degree: usize) -> Self {
        Self {
            monomers: Vec::new(),
            links: Vec::new(),
            max_degree,
            age: 0,
        }
    }

    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    pub fn len(&self) -> usize {
        self.monomers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monomers.is_empty()
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn set_age(&mut self, age: u64) {
        self.age = age;
    }

    pub fn advance_age(&mut self, steps: u64) {
        self.age += steps;
    }

    /// Returns an iterator over all monomers in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Monomer> {
        self.monomers.iter()
    }

    /// Retrieves a monomer by index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range. Use [`MoleculeGraph::get`] for a checked lookup.
    #[inline]
    pub fn monomer(&self, index: usize) -> &Monomer {
        &self.monomers[index]
    }

    #[inline]
    pub fn monomer_mut(&mut self, index: usize) -> &mut Monomer {
        &mut self.monomers[index]
    }

    pub fn get(&self, index: usize) -> Option<&Monomer> {
        self.monomers.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Monomer> {
        self.monomers.get_mut(index)
    }

    #[inline]
    pub fn position(&self, index: usize) -> Vector3D<i32> {
        self.monomers[index].position
    }

    #[inline]
    pub fn set_position(&mut self, index: usize, position: Vector3D<i32>) {
        self.monomers[index].position = position;
    }

    #[inline]
    pub fn attributes(&self, index: usize) -> &MonomerAttributes {
        &self.monomers[index].attributes
    }

    /// Resizes the vertex list.
    ///
    /// Growing appends default monomers at the origin. Shrinking drops the
    /// trailing monomers together with every edge that touches them.
    pub fn resize(&mut self, n: usize) {
        if n < self.monomers.len() {
            for owner in &mut self.links[..n] {
                owner.retain(|link| link.partner < n);
            }
        }
        self.monomers.resize(n, Monomer::default());
        self.links.resize_with(n, Vec::new);
    }

    /// Appends a monomer at `position` with default attributes.
    ///
    /// # Return
    ///
    /// The index of the new monomer.
    pub fn add_monomer(&mut self, position: Vector3D<i32>) -> usize {
        self.add_monomer_with(Monomer::new(position))
    }

    pub fn add_monomer_with(&mut self, monomer: Monomer) -> usize {
        self.monomers.push(monomer);
        self.links.push(Vec::with_capacity(self.max_degree.min(4)));
        self.monomers.len() - 1
    }

    fn check_index(&self, index: usize) -> Result<(), GraphError> {
        if index >= self.monomers.len() {
            return Err(GraphError::IndexOutOfRange {
                index,
                len: self.monomers.len(),
            });
        }
        Ok(())
    }

    /// Connects two monomers with an undirected edge.
    ///
    /// All preconditions are verified before the graph is touched, so a failed
    /// call never leaves a half-inserted edge behind.
    ///
    /// # Arguments
    ///
    /// * `i`, `j` - Indices of the two monomers.
    /// * `info` - Optional payload stored on the edge.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange`, `SelfConnection`, `AlreadyConnected`, or
    /// `DegreeOverflow` when either end already has `max_degree` links.
    pub fn connect(&mut self, i: usize, j: usize, info: Option<i32>) -> Result<(), GraphError> {
        self.check_index(i)?;
        self.check_index(j)?;
        if i == j {
            return Err(GraphError::SelfConnection(i));
        }
        if self.are_connected(i, j) {
            return Err(GraphError::AlreadyConnected(i, j));
        }
        for index in [i, j] {
            if self.links[index].len() >= self.max_degree {
                return Err(GraphError::DegreeOverflow {
                    index,
                    max_degree: self.max_degree,
                });
            }
        }

        self.links[i].push(Link { partner: j, info });
        self.links[j].push(Link { partner: i, info });
        Ok(())
    }

    pub fn disconnect(&mut self, i: usize, j: usize) -> Result<(), GraphError> {
        self.check_index(i)?;
        self.check_index(j)?;
        if !self.are_connected(i, j) {
            return Err(GraphError::NotConnected(i, j));
        }
        self.links[i].retain(|link| link.partner != j);
        self.links[j].retain(|link| link.partner != i);
        Ok(())
    }

    /// Returns `false` for out-of-range indices.
    pub fn are_connected(&self, i: usize, j: usize) -> bool {
        self.links
            .get(i)
            .is_some_and(|links| links.iter().any(|link| link.partner == j))
    }

    #[inline]
    pub fn num_links(&self, index: usize) -> usize {
        self.links[index].len()
    }

    #[inline]
    pub fn links(&self, index: usize) -> &[Link] {
        &self.links[index]
    }

    /// Indices of all monomers bonded to `index`, in insertion order.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.links[index].iter().map(|link| link.partner)
    }

    pub fn neighbor_index(&self, index: usize, k: usize) -> Result<usize, GraphError> {
        self.check_index(index)?;
        self.links[index]
            .get(k)
            .map(|link| link.partner)
            .ok_or(GraphError::NeighborOutOfRange {
                index,
                k,
                degree: self.links[index].len(),
            })
    }

    pub fn link_info(&self, i: usize, j: usize) -> Result<Option<i32>, GraphError> {
        self.check_index(i)?;
        self.links[i]
            .iter()
            .find(|link| link.partner == j)
            .map(|link| link.info)
            .ok_or(GraphError::NotConnected(i, j))
    }

    pub fn set_link_info(&mut self, i: usize, j: usize, info: Option<i32>) -> Result<(), GraphError> {
        self.check_index(i)?;
        self.check_index(j)?;
        if !self.are_connected(i, j) {
            return Err(GraphError::NotConnected(i, j));
        }
        for (owner, partner) in [(i, j), (j, i)] {
            if let Some(link) = self.links[owner].iter_mut().find(|l| l.partner == partner) {
                link.info = info;
            }
        }
        Ok(())
    }

    /// Iterates over every edge once as `(i, j, info)` with `i < j`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, Option<i32>)> + '_ {
        self.links.iter().enumerate().flat_map(|(i, links)| {
            links
                .iter()
                .filter(move |link| link.partner > i)
                .map(move |link| (i, link.partner, link.info))
        })
    }

    fn first_vertex_exceeding(&self, capacity: usize) -> Option<usize> {
        self.links.iter().position(|links| links.len() > capacity)
    }

    /// Deep copy with a different per-vertex capacity.
    ///
    /// # Errors
    ///
    /// `DegreeOverflow` naming the first vertex whose degree exceeds `max_degree`.
    pub fn with_max_degree(&self, max_degree: usize) -> Result<Self, GraphError> {
        if let Some(index) = self.first_vertex_exceeding(max_degree) {
            return Err(GraphError::DegreeOverflow { index, max_degree });
        }
        Ok(Self {
            monomers: self.monomers.clone(),
            links: self.links.clone(),
            max_degree,
            age: self.age,
        })
    }

    /// Replaces this graph's contents with a deep copy of `other`, keeping this
    /// graph's capacity. On error the graph is left untouched.
    pub fn assign_from(&mut self, other: &MoleculeGraph) -> Result<(), GraphError> {
        *self = other.with_max_degree(self.max_degree)?;
        Ok(())
    }
}
