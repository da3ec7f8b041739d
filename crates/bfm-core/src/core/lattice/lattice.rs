use super::geometry::{LatticeError, SimulationBox};
use crate::core::models::vector::Vector3D;
use std::fmt::Debug;

/// A cell value that can be stored on the lattice. The default value means "empty".
pub trait LatticeValue: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    #[inline]
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Widened value as reported through `lattice_entry` accessors.
    fn as_u32(self) -> u32;
}

impl LatticeValue for bool {
    #[inline]
    fn as_u32(self) -> u32 {
        u32::from(self)
    }
}

macro_rules! impl_unsigned_value {
    ($($t:ty),*) => {
        $(
            impl LatticeValue for $t {
                #[inline]
                fn as_u32(self) -> u32 {
                    u32::from(self)
                }
            }
        )*
    };
}

impl_unsigned_value!(u8, u16, u32);

/// Dense occupancy buffer addressed by folded coordinates.
#[derive(Debug, Clone)]
pub struct Lattice<V: LatticeValue> {
    geometry: SimulationBox,
    cells: Vec<V>,
    stride_y: usize,
    stride_z: usize,
}

impl<V: LatticeValue> Lattice<V> {
    /// Allocates a zeroed lattice for `geometry`.
    pub fn new(geometry: &SimulationBox) -> Result<Self, LatticeError> {
        geometry.validate()?;
        let stride_y = geometry.box_x() as usize;
        let stride_z = stride_y * geometry.box_y() as usize;
        Ok(Self {
            geometry: *geometry,
            cells: vec![V::default(); geometry.volume()],
            stride_y,
            stride_z,
        })
    }

    /// Re-validates `geometry` and reallocates a zeroed buffer for it.
    pub fn setup(&mut self, geometry: &SimulationBox) -> Result<(), LatticeError> {
        *self = Self::new(geometry)?;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cells.fill(V::default());
    }

    pub fn geometry(&self) -> &SimulationBox {
        &self.geometry
    }

    pub fn box_x(&self) -> i32 {
        self.geometry.box_x()
    }

    pub fn box_y(&self) -> i32 {
        self.geometry.box_y()
    }

    pub fn box_z(&self) -> i32 {
        self.geometry.box_z()
    }

    /// Linear buffer index of an unfolded position.
    #[inline]
    pub fn index_of(&self, pos: Vector3D<i32>) -> usize {
        let folded = self.geometry.fold(pos);
        folded.x as usize + folded.y as usize * self.stride_y + folded.z as usize * self.stride_z
    }

    #[inline]
    pub fn entry(&self, pos: Vector3D<i32>) -> V {
        self.cells[self.index_of(pos)]
    }

    #[inline]
    pub fn set_entry(&mut self, pos: Vector3D<i32>, value: V) {
        let index = self.index_of(pos);
        self.cells[index] = value;
    }

    /// Moves the value at `old` to `new` and empties `old`. If both fold onto
    /// the same cell the value stays in place.
    #[inline]
    pub fn move_entry(&mut self, old: Vector3D<i32>, new: Vector3D<i32>) {
        let from = self.index_of(old);
        let to = self.index_of(new);
        let value = self.cells[from];
        self.cells[from] = V::default();
        self.cells[to] = value;
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|v| !v.is_empty()).count()
    }
}
