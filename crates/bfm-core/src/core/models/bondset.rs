use super::vector::Vector3D;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

const LOOKUP_RANGE: i32 = 4;
const LOOKUP_EDGE: i32 = 2 * LOOKUP_RANGE + 1;
const LOOKUP_CELLS: usize = (LOOKUP_EDGE * LOOKUP_EDGE * LOOKUP_EDGE) as usize;
const LOOKUP_WORDS: usize = LOOKUP_CELLS.div_ceil(64);

/// Identifier assigned to the first vector of the classic bond sets.
pub const FIRST_CLASSIC_IDENTIFIER: i32 = 17;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum BondSetError {
    #[error("Bond vector {vector} is already registered under identifier {existing_id}")]
    DuplicateVector {
        vector: Vector3D<i32>,
        existing_id: i32,
    },
    #[error("Bond identifier {0} is already in use")]
    DuplicateIdentifier(i32),
    #[error("Unknown bond identifier {0}")]
    UnknownIdentifier(i32),
    #[error("Unknown bond vector {0}")]
    UnknownVector(Vector3D<i32>),
    #[error("Bond vector {0} has a component outside [-4, 4]")]
    ComponentOutOfRange(Vector3D<i32>),
    #[error("Bond vector lookup table is out of date; call update_lookup_table() first")]
    LookupNotSynchronized,
}

/// Selects one of the predefined bond vector sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BondSetKind {
    ClassicSc,
    ClassicBcc,
    Empty,
}

/// The finite vocabulary of allowed bond vectors.
///
/// Vectors and identifiers are both unique. Membership queries go through a
/// bit-packed table covering components in `[-4, 4]`; every mutation marks that
/// table stale until [`BondSet::update_lookup_table`] runs again.
#[derive(Debug, Clone)]
pub struct BondSet {
    vectors: BTreeMap<i32, Vector3D<i32>>,
    identifiers: HashMap<Vector3D<i32>, i32>,
    lookup: [u64; LOOKUP_WORDS],
    synchronized: bool,
}

impl Default for BondSet {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn lookup_index(v: &Vector3D<i32>) -> Option<usize> {
    let in_range = |c: i32| (-LOOKUP_RANGE..=LOOKUP_RANGE).contains(&c);
    if !(in_range(v.x) && in_range(v.y) && in_range(v.z)) {
        return None;
    }
    let idx = (v.x + LOOKUP_RANGE)
        + LOOKUP_EDGE * (v.y + LOOKUP_RANGE)
        + LOOKUP_EDGE * LOOKUP_EDGE * (v.z + LOOKUP_RANGE);
    Some(idx as usize)
}

/// All distinct vectors obtained from `base` by permuting components and flipping signs.
fn signed_permutations(base: [i32; 3]) -> Vec<Vector3D<i32>> {
    const PERMUTATIONS: [[usize; 3]; 6] = [
        [0, 1, 2],
        [2, 1, 0],
        [1, 0, 2],
        [0, 2, 1],
        [1, 2, 0],
        [2, 0, 1],
    ];
    const SIGNS: [[i32; 3]; 8] = [
        [1, 1, 1],
        [-1, -1, -1],
        [1, 1, -1],
        [1, -1, 1],
        [-1, 1, 1],
        [1, -1, -1],
        [-1, 1, -1],
        [-1, -1, 1],
    ];

    let mut out: Vec<Vector3D<i32>> = Vec::new();
    for sign in SIGNS {
        for perm in PERMUTATIONS {
            let v = Vector3D::new(
                sign[0] * base[perm[0]],
                sign[1] * base[perm[1]],
                sign[2] * base[perm[2]],
            );
            if !out.contains(&v) {
                out.push(v);
            }
        }
    }
    out
}

impl BondSet {
    pub fn new() -> Self {
        Self {
            vectors: BTreeMap::new(),
            identifiers: HashMap::new(),
            lookup: [0; LOOKUP_WORDS],
            synchronized: true,
        }
    }

    /// The 108-vector simple-cubic BFM set.
    pub fn classic_sc() -> Self {
        Self::from_classes(&[
            [2, 0, 0],
            [2, 1, 0],
            [2, 1, 1],
            [2, 2, 1],
            [3, 0, 0],
            [3, 1, 0],
        ])
    }

    /// The body-centred-cubic BFM set.
    pub fn classic_bcc() -> Self {
        Self::from_classes(&[[2, 0, 0], [2, 2, 0], [3, 1, 1]])
    }

    pub fn from_kind(kind: BondSetKind) -> Self {
        match kind {
            BondSetKind::ClassicSc => Self::classic_sc(),
            BondSetKind::ClassicBcc => Self::classic_bcc(),
            BondSetKind::Empty => Self::new(),
        }
    }

    fn from_classes(classes: &[[i32; 3]]) -> Self {
        let mut set = Self::new();
        let mut id = FIRST_CLASSIC_IDENTIFIER;
        for &base in classes {
            for v in signed_permutations(base) {
                // Classes are disjoint and in range, so insertion cannot fail.
                set.vectors.insert(id, v);
                set.identifiers.insert(v, id);
                id += 1;
            }
        }
        set.update_lookup_table();
        set
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Iterates over `(identifier, vector)` pairs in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, Vector3D<i32>)> + '_ {
        self.vectors.iter().map(|(&id, &v)| (id, v))
    }

    pub fn add_bond(&mut self, vector: Vector3D<i32>, id: i32) -> Result<(), BondSetError> {
        if lookup_index(&vector).is_none() {
            return Err(BondSetError::ComponentOutOfRange(vector));
        }
        if let Some(&existing_id) = self.identifiers.get(&vector) {
            return Err(BondSetError::DuplicateVector {
                vector,
                existing_id,
            });
        }
        if self.vectors.contains_key(&id) {
            return Err(BondSetError::DuplicateIdentifier(id));
        }

        self.vectors.insert(id, vector);
        self.identifiers.insert(vector, id);
        self.synchronized = false;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.vectors.clear();
        self.identifiers.clear();
        self.synchronized = false;
    }

    pub fn bond_vector(&self, id: i32) -> Result<Vector3D<i32>, BondSetError> {
        self.vectors
            .get(&id)
            .copied()
            .ok_or(BondSetError::UnknownIdentifier(id))
    }

    pub fn bond_identifier(&self, x: i32, y: i32, z: i32) -> Result<i32, BondSetError> {
        let v = Vector3D::new(x, y, z);
        self.identifier_of(&v).ok_or(BondSetError::UnknownVector(v))
    }

    pub fn identifier_of(&self, vector: &Vector3D<i32>) -> Option<i32> {
        self.identifiers.get(vector).copied()
    }

    /// Membership test for callers that must not act on a stale table.
    pub fn is_valid(&self, vector: &Vector3D<i32>) -> Result<bool, BondSetError> {
        if !self.synchronized {
            return Err(BondSetError::LookupNotSynchronized);
        }
        Ok(self.lookup_bit(vector))
    }

    /// Hot-loop membership test.
    ///
    /// Returns `false` for components outside `[-4, 4]` and whenever the table is
    /// stale, so a pending mutation can only cause spurious rejections.
    #[inline]
    pub fn is_valid_fast(&self, vector: &Vector3D<i32>) -> bool {
        self.synchronized && self.lookup_bit(vector)
    }

    #[inline]
    fn lookup_bit(&self, vector: &Vector3D<i32>) -> bool {
        match lookup_index(vector) {
            Some(idx) => self.lookup[idx / 64] & (1u64 << (idx % 64)) != 0,
            None => false,
        }
    }

    pub fn update_lookup_table(&mut self) {
        self.lookup = [0; LOOKUP_WORDS];
        for v in self.vectors.values() {
            if let Some(idx) = lookup_index(v) {
                self.lookup[idx / 64] |= 1u64 << (idx % 64);
            }
        }
        self.synchronized = true;
        debug!(num_vectors = self.vectors.len(), "Bond vector lookup rebuilt.");
    }
}
