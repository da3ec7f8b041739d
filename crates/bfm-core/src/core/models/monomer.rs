use super::vector::Vector3D;

/// Per-monomer tags consulted by rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonomerAttributes {
    /// Free-form type tag (interaction type, painted lattice value, ...).
    pub tag: i32,
    /// Immobile monomers are rejected by the fixed-monomer rule.
    pub movable: bool,
    /// Only reactive monomers take part in connect/break moves.
    pub reactive: bool,
}

impl Default for MonomerAttributes {
    fn default() -> Self {
        Self {
            tag: 0,
            movable: true,
            reactive: false,
        }
    }
}

impl MonomerAttributes {
    pub fn with_tag(tag: i32) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Monomer {
    /// Unfolded lattice position of the footprint's lower corner.
    pub position: Vector3D<i32>,
    pub attributes: MonomerAttributes,
}

impl Monomer {
    pub fn new(position: Vector3D<i32>) -> Self {
        Self {
            position,
            attributes: MonomerAttributes::default(),
        }
    }

    pub fn with_attributes(position: Vector3D<i32>, attributes: MonomerAttributes) -> Self {
        Self {
            position,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_attributes_are_movable_and_unreactive() {
        let attributes = MonomerAttributes::default();
        assert_eq!(attributes.tag, 0);
        assert!(attributes.movable);
        assert!(!attributes.reactive);
    }

    #[test]
    fn with_tag_keeps_remaining_defaults() {
        let monomer = Monomer::with_attributes(Vector3D::new(1, 2, 3), MonomerAttributes::with_tag(4));
        assert_eq!(monomer.attributes.tag, 4);
        assert!(monomer.attributes.movable);
        assert_eq!(monomer.position, Vector3D::new(1, 2, 3));
    }
}
