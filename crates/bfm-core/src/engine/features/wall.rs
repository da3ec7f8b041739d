use super::Feature;
use crate::core::lattice::{Axis, SimulationBox};
use crate::core::models::vector::Vector3D;
use crate::engine::error::EngineError;
use crate::engine::moves::Proposal;
use crate::engine::state::SystemState;
use nalgebra::Vector3;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum WallError {
    #[error("Wall normal {0:?} is not parallel to a coordinate axis")]
    NotAxisAligned([i32; 3]),
    #[error("Wall plane {axis} = {plane} lies outside the box of size {size}")]
    OutsideBox { axis: Axis, plane: i32, size: i32 },
    #[error("Monomer {monomer} at {position} touches the wall plane {axis} = {plane}")]
    MonomerOnWall {
        monomer: usize,
        position: Vector3D<i32>,
        axis: Axis,
        plane: i32,
    },
}

/// A lattice plane perpendicular to one axis that no footprint cell may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wall {
    axis: Axis,
    plane: i32,
}

impl Wall {
    /// Builds the plane through `base` with the given normal.
    ///
    /// # Errors
    ///
    /// `NotAxisAligned` unless exactly one component of `normal` is non-zero.
    pub fn new(base: Vector3<i32>, normal: Vector3<i32>) -> Result<Self, WallError> {
        let mut axes = Axis::ALL.into_iter().filter(|axis| normal[axis.index()] != 0);
        match (axes.next(), axes.next()) {
            (Some(axis), None) => Ok(Self {
                axis,
                plane: base[axis.index()],
            }),
            _ => Err(WallError::NotAxisAligned([normal.x, normal.y, normal.z])),
        }
    }

    pub fn perpendicular_to(axis: Axis, plane: i32) -> Self {
        Self { axis, plane }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn plane(&self) -> i32 {
        self.plane
    }

    /// Whether a footprint of `extent` cells per axis anchored at `origin` touches the plane.
    #[inline]
    fn blocks(&self, geometry: &SimulationBox, origin: Vector3D<i32>, extent: i32) -> bool {
        let offset = self.plane - self.axis.component(&origin);
        if geometry.is_periodic(self.axis) {
            offset.rem_euclid(geometry.size(self.axis)) < extent
        } else {
            (0..extent).contains(&offset)
        }
    }
}

/// Collection of impenetrable axis-aligned walls.
pub struct Walls {
    walls: Vec<Wall>,
    extent: i32,
}

impl Default for Walls {
    fn default() -> Self {
        Self::new()
    }
}

impl Walls {
    pub const NAME: &'static str = "walls";

    /// Walls for simple-cubic monomers (2-cell footprint).
    pub fn new() -> Self {
        Self {
            walls: Vec::new(),
            extent: 2,
        }
    }

    /// Footprint edge length in lattice cells; 1 for single-site models.
    pub fn with_extent(mut self, extent: i32) -> Self {
        self.extent = extent.max(1);
        self
    }

    pub fn with_wall(mut self, wall: Wall) -> Self {
        self.walls.push(wall);
        self
    }

    pub fn add_wall(&mut self, wall: Wall) -> &mut Self {
        self.walls.push(wall);
        self
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    fn is_clear(&self, geometry: &SimulationBox, origin: Vector3D<i32>) -> bool {
        !self
            .walls
            .iter()
            .any(|wall| wall.blocks(geometry, origin, self.extent))
    }
}

impl Feature for Walls {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check_move(&self, state: &SystemState, proposal: &mut Proposal) -> bool {
        match proposal.target_position(state.molecules()) {
            Some(target) => self.is_clear(state.geometry(), target),
            None => true,
        }
    }

    fn synchronize(&mut self, state: &SystemState) -> Result<(), EngineError> {
        let geometry = state.geometry();
        for wall in &self.walls {
            let size = geometry.size(wall.axis);
            if !(0..size).contains(&wall.plane) {
                return Err(WallError::OutsideBox {
                    axis: wall.axis,
                    plane: wall.plane,
                    size,
                }
                .into());
            }
        }
        for (monomer, m) in state.molecules().iter().enumerate() {
            if let Some(wall) = self
                .walls
                .iter()
                .find(|wall| wall.blocks(geometry, m.position, self.extent))
            {
                return Err(WallError::MonomerOnWall {
                    monomer,
                    position: m.position,
                    axis: wall.axis,
                    plane: wall.plane,
                }
                .into());
            }
        }
        Ok(())
    }

    fn write_metadata(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "#!feature {}", Self::NAME)?;
        for wall in &self.walls {
            writeln!(out, "#!wall {}={}", wall.axis, wall.plane)?;
        }
        Ok(())
    }
}
