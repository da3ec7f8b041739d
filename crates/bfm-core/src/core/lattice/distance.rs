use super::geometry::{Axis, SimulationBox};
use crate::core::models::vector::Vector3D;
use nalgebra::Vector3;

/// Minimum-image displacements and distances for one simulation box.
#[derive(Debug, Clone, Copy)]
pub struct DistanceCalculator {
    geometry: SimulationBox,
}

impl DistanceCalculator {
    pub fn new(geometry: &SimulationBox) -> Self {
        Self {
            geometry: *geometry,
        }
    }

    pub fn geometry(&self) -> &SimulationBox {
        &self.geometry
    }

    /// Shortest lattice vector from `a` to `b` under the box's periodicity.
    #[inline]
    pub fn minimum_image_vector(&self, a: Vector3D<i32>, b: Vector3D<i32>) -> Vector3D<i32> {
        let d = b - a;
        Vector3D::new(
            self.geometry.minimum_image_axis(Axis::X, d.x),
            self.geometry.minimum_image_axis(Axis::Y, d.y),
            self.geometry.minimum_image_axis(Axis::Z, d.z),
        )
    }

    /// Continuous-space variant for off-lattice positions such as centres of mass.
    pub fn minimum_image_vector_f64(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
        let mut d = b - a;
        for axis in Axis::ALL {
            if self.geometry.is_periodic(axis) {
                let size = f64::from(self.geometry.size(axis));
                let i = axis.index();
                d[i] -= size * (d[i] / size).round();
            }
        }
        d
    }

    #[inline]
    pub fn distance_squared(&self, a: Vector3D<i32>, b: Vector3D<i32>) -> i64 {
        let d = self.minimum_image_vector(a, b).widen::<i64>();
        d * d
    }

    pub fn distance(&self, a: Vector3D<i32>, b: Vector3D<i32>) -> f64 {
        (self.distance_squared(a, b) as f64).sqrt()
    }
}
