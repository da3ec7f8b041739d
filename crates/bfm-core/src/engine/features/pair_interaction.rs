use super::Feature;
use super::neighbor_list::NeighborList;
use crate::core::lattice::{Axis, DistanceCalculator};
use crate::core::models::graph::MoleculeGraph;
use crate::core::models::vector::Vector3D;
use crate::engine::error::EngineError;
use crate::engine::moves::{MoveKind, Proposal};
use crate::engine::state::SystemState;
use std::collections::BTreeMap;
use std::fmt;
use tracing::instrument;

/// Square-well contact energies between tagged monomers.
///
/// Two monomers whose minimum-image distance is at most `cutoff` contribute
/// the well depth registered for their tag pair (in kT, negative is
/// attractive). Local moves are weighted with `exp(-ΔE)`, add moves with
/// `exp(-E)` of the new site. Neighbours are found through a Verlet list that
/// is rebuilt in the finalize hook once any monomer strays more than half the
/// skin from its reference position.
pub struct PairInteraction {
    wells: BTreeMap<(i32, i32), f64>,
    list: NeighborList,
    distances: Option<DistanceCalculator>,
}

impl PairInteraction {
    pub const NAME: &'static str = "pair-interaction";

    pub fn new(cutoff: f64, skin: f64) -> Self {
        Self {
            wells: BTreeMap::new(),
            list: NeighborList::new(cutoff, skin),
            distances: None,
        }
    }

    pub fn with_well(mut self, a: i32, b: i32, energy: f64) -> Self {
        self.set_well(a, b, energy);
        self
    }

    pub fn set_well(&mut self, a: i32, b: i32, energy: f64) {
        self.wells.insert((a.min(b), a.max(b)), energy);
    }

    /// Well depth for a tag pair; zero when none is registered.
    pub fn well(&self, a: i32, b: i32) -> f64 {
        self.wells.get(&(a.min(b), a.max(b))).copied().unwrap_or(0.0)
    }

    pub fn neighbor_list(&self) -> &NeighborList {
        &self.list
    }

    fn site_energy(
        &self,
        distances: &DistanceCalculator,
        molecules: &MoleculeGraph,
        tag: i32,
        position: Vector3D<i32>,
        others: impl Iterator<Item = usize>,
    ) -> f64 {
        let limit = self.list.cutoff() * self.list.cutoff();
        others
            .filter(|&j| (distances.distance_squared(position, molecules.position(j)) as f64) <= limit)
            .map(|j| self.well(tag, molecules.attributes(j).tag))
            .sum()
    }

    fn local_energy_change(
        &self,
        distances: &DistanceCalculator,
        molecules: &MoleculeGraph,
        index: usize,
        new: Vector3D<i32>,
    ) -> f64 {
        let old = molecules.position(index);
        let tag = molecules.attributes(index).tag;
        if self.list.is_valid_for(molecules) && self.list.is_within_skin(index, new) {
            let neighbors = self.list.neighbors(index);
            self.site_energy(distances, molecules, tag, new, neighbors.iter().copied())
                - self.site_energy(distances, molecules, tag, old, neighbors.iter().copied())
        } else {
            let others = || (0..molecules.len()).filter(move |&j| j != index);
            self.site_energy(distances, molecules, tag, new, others())
                - self.site_energy(distances, molecules, tag, old, others())
        }
    }

    fn validate(&self, state: &SystemState) -> Result<(), EngineError> {
        let (cutoff, skin) = (self.list.cutoff(), self.list.skin());
        let misconfigured = |reason: String| EngineError::FeatureConfiguration {
            feature: Self::NAME,
            reason,
        };
        if !(cutoff.is_finite() && cutoff > 0.0) {
            return Err(misconfigured(format!("cutoff must be positive, got {cutoff}")));
        }
        if !(skin.is_finite() && skin >= 0.0) {
            return Err(misconfigured(format!("skin must be non-negative, got {skin}")));
        }
        let geometry = state.geometry();
        if let Some(axis) = Axis::ALL.into_iter().find(|&axis| {
            geometry.is_periodic(axis) && 2.0 * self.list.list_radius() > f64::from(geometry.size(axis))
        }) {
            return Err(misconfigured(format!(
                "cutoff + skin = {} exceeds half the periodic box along {axis}",
                self.list.list_radius()
            )));
        }
        Ok(())
    }
}

impl Feature for PairInteraction {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check_move(&self, state: &SystemState, proposal: &mut Proposal) -> bool {
        let Some(distances) = &self.distances else {
            return false;
        };
        let molecules = state.molecules();
        let delta = match *proposal.kind() {
            MoveKind::Local { index, direction } => {
                let new = molecules.position(index) + direction;
                self.local_energy_change(distances, molecules, index, new)
            }
            MoveKind::Add {
                position,
                attributes,
                ..
            } => self.site_energy(distances, molecules, attributes.tag, position, 0..molecules.len()),
            MoveKind::Connect { .. } | MoveKind::Break { .. } => 0.0,
        };
        if delta != 0.0 {
            proposal.multiply_probability((-delta).exp());
        }
        true
    }

    fn apply_move(&mut self, state: &mut SystemState, proposal: &Proposal) {
        match *proposal.kind() {
            MoveKind::Local { index, direction } => {
                let new = state.molecules().position(index) + direction;
                self.list.record_move(index, new);
            }
            MoveKind::Add { .. } => self.list.mark_stale(),
            MoveKind::Connect { .. } | MoveKind::Break { .. } => {}
        }
    }

    fn finalize_move(&mut self, state: &SystemState, _proposal: &Proposal) {
        if self.list.is_valid_for(state.molecules()) {
            return;
        }
        if let Some(distances) = &self.distances {
            self.list.rebuild(state.molecules(), distances);
        }
    }

    #[instrument(skip_all, name = "pair_interaction_sync")]
    fn synchronize(&mut self, state: &SystemState) -> Result<(), EngineError> {
        self.validate(state)?;
        let distances = DistanceCalculator::new(state.geometry());
        self.list.rebuild(state.molecules(), &distances);
        self.distances = Some(distances);
        Ok(())
    }

    fn write_metadata(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(
            out,
            "#!feature {} cutoff={} skin={}",
            Self::NAME,
            self.list.cutoff(),
            self.list.skin()
        )?;
        for (&(a, b), energy) in &self.wells {
            writeln!(out, "#!pair-well {a} {b} {energy}")?;
        }
        Ok(())
    }
}
