use crate::core::models::vector::Vector3D;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum LatticeError {
    #[error("Box size along {axis} must be positive, got {size}")]
    NonPositiveSize { axis: Axis, size: i32 },
    #[error("Box size along {axis} is {size}, which is not a power of two as required by bitmask addressing")]
    NotPowerOfTwo { axis: Axis, size: i32 },
    #[error("Lattice of {0} cells cannot be allocated")]
    VolumeTooLarge(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    #[inline]
    pub fn component<T: Copy>(self, v: &Vector3D<T>) -> T {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// How unfolded coordinates are mapped into `[0, size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Addressing {
    /// Euclidean remainder, works for any box size.
    #[default]
    General,
    /// Bitwise AND with `size - 1`; requires power-of-two sizes.
    PowerOfTwo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AxisGeometry {
    size: i32,
    periodic: bool,
    mask: i32,
}

/// Box dimensions, per-axis periodicity and the folding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationBox {
    axes: [AxisGeometry; 3],
    addressing: Addressing,
}

impl SimulationBox {
    pub fn new(
        sizes: [i32; 3],
        periodic: [bool; 3],
        addressing: Addressing,
    ) -> Result<Self, LatticeError> {
        let mut axes = [AxisGeometry {
            size: 1,
            periodic: true,
            mask: 0,
        }; 3];
        for axis in Axis::ALL {
            let size = sizes[axis.index()];
            axes[axis.index()] = AxisGeometry {
                size,
                periodic: periodic[axis.index()],
                mask: size.wrapping_sub(1),
            };
        }
        let geometry = Self { axes, addressing };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Checks sizes against the addressing scheme.
    pub fn validate(&self) -> Result<(), LatticeError> {
        for axis in Axis::ALL {
            let size = self.size(axis);
            if size <= 0 {
                return Err(LatticeError::NonPositiveSize { axis, size });
            }
            if self.addressing == Addressing::PowerOfTwo && (size & (size - 1)) != 0 {
                return Err(LatticeError::NotPowerOfTwo { axis, size });
            }
        }
        let volume = self.volume_u64();
        if usize::try_from(volume).is_err() {
            return Err(LatticeError::VolumeTooLarge(volume));
        }
        Ok(())
    }

    #[inline]
    pub fn size(&self, axis: Axis) -> i32 {
        self.axes[axis.index()].size
    }

    #[inline]
    pub fn is_periodic(&self, axis: Axis) -> bool {
        self.axes[axis.index()].periodic
    }

    pub fn box_x(&self) -> i32 {
        self.size(Axis::X)
    }

    pub fn box_y(&self) -> i32 {
        self.size(Axis::Y)
    }

    pub fn box_z(&self) -> i32 {
        self.size(Axis::Z)
    }

    pub fn is_periodic_x(&self) -> bool {
        self.is_periodic(Axis::X)
    }

    pub fn is_periodic_y(&self) -> bool {
        self.is_periodic(Axis::Y)
    }

    pub fn is_periodic_z(&self) -> bool {
        self.is_periodic(Axis::Z)
    }

    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    fn volume_u64(&self) -> u64 {
        self.axes.iter().map(|a| a.size.max(0) as u64).product()
    }

    pub fn volume(&self) -> usize {
        self.volume_u64() as usize
    }

    /// Folds one coordinate into `[0, size)`.
    #[inline]
    pub fn fold_axis(&self, axis: Axis, c: i32) -> i32 {
        let geometry = &self.axes[axis.index()];
        match self.addressing {
            Addressing::General => c.rem_euclid(geometry.size),
            Addressing::PowerOfTwo => c & geometry.mask,
        }
    }

    #[inline]
    pub fn fold(&self, pos: Vector3D<i32>) -> Vector3D<i32> {
        Vector3D::new(
            self.fold_axis(Axis::X, pos.x),
            self.fold_axis(Axis::Y, pos.y),
            self.fold_axis(Axis::Z, pos.z),
        )
    }

    /// Folds a coordinate difference into `[-size/2, size - size/2)` on periodic axes.
    #[inline]
    pub fn minimum_image_axis(&self, axis: Axis, d: i32) -> i32 {
        let geometry = &self.axes[axis.index()];
        if !geometry.periodic {
            return d;
        }
        let half = geometry.size / 2;
        match self.addressing {
            Addressing::General => (d + half).rem_euclid(geometry.size) - half,
            Addressing::PowerOfTwo => ((d + half) & geometry.mask) - half,
        }
    }

    /// Whether the unfolded cell lies inside `[0, size)` on every non-periodic axis.
    #[inline]
    pub fn contains_on_closed_axes(&self, pos: Vector3D<i32>) -> bool {
        Axis::ALL.iter().all(|&axis| {
            self.is_periodic(axis) || (0..self.size(axis)).contains(&axis.component(&pos))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic(size: i32, addressing: Addressing) -> SimulationBox {
        SimulationBox::new([size; 3], [true; 3], addressing).unwrap()
    }

    #[test]
    fn rejects_non_positive_size() {
        assert_eq!(
            SimulationBox::new([8, 0, 8], [true; 3], Addressing::General),
            Err(LatticeError::NonPositiveSize {
                axis: Axis::Y,
                size: 0
            })
        );
    }

    #[test]
    fn power_of_two_addressing_rejects_other_sizes() {
        assert_eq!(
            SimulationBox::new([8, 8, 12], [true; 3], Addressing::PowerOfTwo),
            Err(LatticeError::NotPowerOfTwo {
                axis: Axis::Z,
                size: 12
            })
        );
        assert!(SimulationBox::new([8, 8, 12], [true; 3], Addressing::General).is_ok());
    }

    #[test]
    fn fold_is_invariant_under_box_translations() {
        for addressing in [Addressing::General, Addressing::PowerOfTwo] {
            let geometry = cubic(16, addressing);
            for x in -40..40 {
                for k in -3..=3 {
                    assert_eq!(
                        geometry.fold_axis(Axis::X, x),
                        geometry.fold_axis(Axis::X, x + k * 16)
                    );
                }
                assert!((0..16).contains(&geometry.fold_axis(Axis::X, x)));
            }
        }
    }

    #[test]
    fn modulo_and_mask_folding_agree_on_power_of_two_sizes() {
        for size in [1, 2, 8, 32, 64] {
            let general = cubic(size, Addressing::General);
            let masked = cubic(size, Addressing::PowerOfTwo);
            for c in -300..300 {
                assert_eq!(
                    general.fold_axis(Axis::Y, c),
                    masked.fold_axis(Axis::Y, c),
                    "size {size}, coordinate {c}"
                );
                assert_eq!(
                    general.minimum_image_axis(Axis::Y, c),
                    masked.minimum_image_axis(Axis::Y, c),
                    "size {size}, difference {c}"
                );
            }
        }
    }

    #[test]
    fn general_folding_handles_arbitrary_sizes() {
        let geometry = SimulationBox::new([10, 10, 10], [true; 3], Addressing::General).unwrap();
        assert_eq!(geometry.fold(Vector3D::new(-1, 10, 23)), Vector3D::new(9, 0, 3));
    }

    #[test]
    fn minimum_image_on_closed_axis_is_plain_difference() {
        let geometry =
            SimulationBox::new([8, 8, 8], [false, true, true], Addressing::General).unwrap();
        assert_eq!(geometry.minimum_image_axis(Axis::X, 7), 7);
        assert_eq!(geometry.minimum_image_axis(Axis::Y, 7), -1);
        assert_eq!(geometry.minimum_image_axis(Axis::Y, 4), -4);
        assert_eq!(geometry.minimum_image_axis(Axis::Y, 3), 3);
    }

    #[test]
    fn contains_on_closed_axes_ignores_periodic_axes() {
        let geometry =
            SimulationBox::new([8, 8, 8], [true, true, false], Addressing::General).unwrap();
        assert!(geometry.contains_on_closed_axes(Vector3D::new(-5, 100, 0)));
        assert!(!geometry.contains_on_closed_axes(Vector3D::new(0, 0, 8)));
        assert!(!geometry.contains_on_closed_axes(Vector3D::new(0, 0, -1)));
    }

    #[test]
    fn accessors_report_configuration() {
        let geometry =
            SimulationBox::new([4, 8, 16], [true, false, true], Addressing::PowerOfTwo).unwrap();
        assert_eq!((geometry.box_x(), geometry.box_y(), geometry.box_z()), (4, 8, 16));
        assert!(geometry.is_periodic_x());
        assert!(!geometry.is_periodic_y());
        assert!(geometry.is_periodic_z());
        assert_eq!(geometry.volume(), 512);
        assert_eq!(geometry.addressing(), Addressing::PowerOfTwo);
    }
}
