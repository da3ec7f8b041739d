use super::Feature;
use crate::core::lattice::Lattice;
use crate::core::models::vector::Vector3D;
use crate::engine::error::EngineError;
use crate::engine::moves::{MoveKind, Proposal};
use crate::engine::state::SystemState;
use std::fmt;
use tracing::{debug, instrument};

const DIAGONALS: [Vector3D<i32>; 8] = [
    Vector3D::new(1, 1, 1),
    Vector3D::new(1, 1, -1),
    Vector3D::new(1, -1, 1),
    Vector3D::new(1, -1, -1),
    Vector3D::new(-1, 1, 1),
    Vector3D::new(-1, 1, -1),
    Vector3D::new(-1, -1, 1),
    Vector3D::new(-1, -1, -1),
];

/// Excluded volume on the body-centred cubic lattice.
///
/// Each monomer occupies a single site and its eight body-diagonal neighbour
/// sites must stay empty. Bond vectors of the BCC set are long enough that
/// bonded partners never sit on each other's diagonals.
#[derive(Default)]
pub struct ExcludedVolumeBcc {
    lattice: Option<Lattice<bool>>,
}

impl ExcludedVolumeBcc {
    pub const NAME: &'static str = "excluded-volume-bcc";

    pub fn new() -> Self {
        Self::default()
    }

    /// `site` and its diagonal shell are free, ignoring `own` (the mover's old site).
    #[inline]
    fn shell_is_free(
        lattice: &Lattice<bool>,
        site: Vector3D<i32>,
        own: Option<Vector3D<i32>>,
    ) -> bool {
        let occupied_by_other = |cell: Vector3D<i32>| {
            lattice.entry(cell)
                && own.is_none_or(|own| lattice.index_of(own) != lattice.index_of(cell))
        };
        !occupied_by_other(site) && DIAGONALS.iter().all(|&d| !occupied_by_other(site + d))
    }
}

impl Feature for ExcludedVolumeBcc {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check_move(&self, state: &SystemState, proposal: &mut Proposal) -> bool {
        let Some(lattice) = &self.lattice else {
            return false;
        };
        match *proposal.kind() {
            MoveKind::Local { index, direction } => {
                let old = state.molecules().position(index);
                let new = old + direction;
                state.geometry().contains_on_closed_axes(new)
                    && Self::shell_is_free(lattice, new, Some(old))
            }
            MoveKind::Add { position, .. } => {
                state.geometry().contains_on_closed_axes(position)
                    && Self::shell_is_free(lattice, position, None)
            }
            MoveKind::Connect { .. } | MoveKind::Break { .. } => true,
        }
    }

    fn apply_move(&mut self, state: &mut SystemState, proposal: &Proposal) {
        let Some(lattice) = &mut self.lattice else {
            return;
        };
        match *proposal.kind() {
            MoveKind::Local { index, direction } => {
                let old = state.molecules().position(index);
                lattice.move_entry(old, old + direction);
            }
            MoveKind::Add { position, .. } => lattice.set_entry(position, true),
            MoveKind::Connect { .. } | MoveKind::Break { .. } => {}
        }
    }

    #[instrument(skip_all, name = "excluded_volume_bcc_sync")]
    fn synchronize(&mut self, state: &SystemState) -> Result<(), EngineError> {
        let mut lattice = Lattice::<bool>::new(state.geometry())?;
        for (index, monomer) in state.molecules().iter().enumerate() {
            let site = monomer.position;
            if !state.geometry().contains_on_closed_axes(site) {
                return Err(EngineError::MonomerOutsideBox {
                    monomer: index,
                    position: site,
                });
            }
            if let Some(cell) = std::iter::once(site)
                .chain(DIAGONALS.iter().map(|&d| site + d))
                .find(|&cell| lattice.entry(cell))
            {
                return Err(EngineError::DoubleOccupancy {
                    monomer: index,
                    cell,
                });
            }
            lattice.set_entry(site, true);
        }
        debug!(occupied = lattice.occupied_cells(), "BCC lattice rebuilt");
        self.lattice = Some(lattice);
        Ok(())
    }

    fn write_metadata(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "#!feature {}", Self::NAME)
    }

    fn lattice_entry(&self, pos: Vector3D<i32>) -> Option<u32> {
        self.lattice.as_ref().map(|l| u32::from(l.entry(pos)))
    }
}
