use super::config::SystemConfig;
use super::error::EngineError;
use super::features::{FeaturePipeline, FeatureRegistry};
use super::moves::{MoveKind, Proposal};
use super::state::SystemState;
use crate::core::lattice::{Axis, SimulationBox};
use crate::core::models::bondset::BondSet;
use crate::core::models::graph::MoleculeGraph;
use crate::core::models::monomer::Monomer;
use crate::core::models::vector::Vector3D;
use itertools::Itertools;
use std::fmt;
use tracing::{info, instrument, trace, warn};

/// A running simulation: molecules, bond vocabulary, box and the ordered rule
/// pipeline that validates and reacts to every move.
///
/// Moves borrow the system immutably for `check` and mutably for `apply`, so
/// a proposal can never observe a half-committed state. Every mutation bumps
/// [`revision`](Self::revision), which moves use to refuse applying a check
/// made against an older state.
pub struct LatticeSystem {
    state: SystemState,
    pipeline: FeaturePipeline,
    revision: u64,
}

impl fmt::Debug for LatticeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatticeSystem")
            .field("geometry", &self.state.geometry)
            .field("monomers", &self.state.molecules.len())
            .field("bond_vectors", &self.state.bondset.len())
            .field("features", &self.pipeline.names())
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl LatticeSystem {
    /// Builds an empty system and synchronizes every feature.
    ///
    /// # Errors
    ///
    /// Box validation, feature ordering and feature synchronization errors.
    pub fn new(config: &SystemConfig, registry: FeatureRegistry) -> Result<Self, EngineError> {
        Self::with_molecules(config, registry, MoleculeGraph::new(config.max_degree))
    }

    /// Builds a system around an existing configuration.
    ///
    /// The graph is copied into the configured degree capacity, failing with
    /// `DegreeOverflow` if any monomer has more links than allowed.
    #[instrument(skip_all, name = "lattice_system_setup")]
    pub fn with_molecules(
        config: &SystemConfig,
        registry: FeatureRegistry,
        molecules: MoleculeGraph,
    ) -> Result<Self, EngineError> {
        let geometry =
            SimulationBox::new(config.box_size, config.periodicity, config.addressing)?;
        let molecules = if molecules.max_degree() == config.max_degree {
            molecules
        } else {
            molecules.with_max_degree(config.max_degree)?
        };
        let pipeline = registry.build()?;
        let mut system = Self {
            state: SystemState::new(molecules, BondSet::from_kind(config.bond_set), geometry),
            pipeline,
            revision: 0,
        };
        system.synchronize()?;
        info!(
            box_size = ?config.box_size,
            monomers = system.molecules().len(),
            features = ?system.feature_names(),
            "Lattice system ready."
        );
        Ok(system)
    }

    pub fn box_x(&self) -> i32 {
        self.state.geometry.box_x()
    }

    pub fn box_y(&self) -> i32 {
        self.state.geometry.box_y()
    }

    pub fn box_z(&self) -> i32 {
        self.state.geometry.box_z()
    }

    pub fn is_periodic_x(&self) -> bool {
        self.state.geometry.is_periodic_x()
    }

    pub fn is_periodic_y(&self) -> bool {
        self.state.geometry.is_periodic_y()
    }

    pub fn is_periodic_z(&self) -> bool {
        self.state.geometry.is_periodic_z()
    }

    pub fn geometry(&self) -> &SimulationBox {
        &self.state.geometry
    }

    pub fn molecules(&self) -> &MoleculeGraph {
        &self.state.molecules
    }

    /// Direct access to the graph, e.g. for building an initial configuration.
    /// Feature caches are stale until [`synchronize`](Self::synchronize) runs.
    pub fn modify_molecules(&mut self) -> &mut MoleculeGraph {
        self.bump_revision();
        &mut self.state.molecules
    }

    pub fn bondset(&self) -> &BondSet {
        &self.state.bondset
    }

    /// Direct access to the bond set. Its lookup table is stale until
    /// [`synchronize`](Self::synchronize) runs, and stale lookups reject every
    /// bond vector.
    pub fn modify_bondset(&mut self) -> &mut BondSet {
        self.bump_revision();
        &mut self.state.bondset
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    /// Counter bumped by every commit, synchronize and mutable accessor.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump_revision(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn age(&self) -> u64 {
        self.state.molecules.age()
    }

    pub fn advance_age(&mut self, steps: u64) {
        self.state.molecules.advance_age(steps);
    }

    /// Rebuilds the bond lookup and every feature cache from the graph.
    ///
    /// # Errors
    ///
    /// The first invariant violation reported by a feature.
    #[instrument(skip_all, name = "lattice_system_sync")]
    pub fn synchronize(&mut self) -> Result<(), EngineError> {
        self.bump_revision();
        self.state.bondset.update_lookup_table();
        self.pipeline.synchronize(&self.state)
    }

    /// Replaces the box and resynchronizes every feature against it.
    ///
    /// If the current configuration does not fit the new box, the previous
    /// box is restored and resynchronized before the error is returned.
    ///
    /// # Errors
    ///
    /// The first invariant violation reported under the new box, e.g.
    /// `DoubleOccupancy` after shrinking a periodic box or
    /// `MonomerOutsideBox` for a closed one.
    #[instrument(skip_all, name = "lattice_system_resize")]
    pub fn set_geometry(&mut self, geometry: SimulationBox) -> Result<(), EngineError> {
        let previous = std::mem::replace(&mut self.state.geometry, geometry);
        if let Err(err) = self.synchronize() {
            warn!(
                error = %err,
                "Configuration does not fit the new box; restoring the previous one."
            );
            self.state.geometry = previous;
            self.synchronize()?;
            return Err(err);
        }
        info!(
            box_size = ?Axis::ALL.map(|axis| self.state.geometry.size(axis)),
            "Box replaced."
        );
        Ok(())
    }

    /// Occupancy value at `pos` from the first feature that owns a lattice.
    pub fn lattice_entry(&self, pos: Vector3D<i32>) -> Option<u32> {
        self.pipeline.lattice_entry(pos)
    }

    /// Feature names in execution order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.pipeline.names()
    }

    /// Writes the system header followed by every feature's metadata.
    pub fn write_metadata(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let geometry = &self.state.geometry;
        writeln!(
            out,
            "#!box {}",
            Axis::ALL.iter().map(|&axis| geometry.size(axis)).join(" ")
        )?;
        writeln!(
            out,
            "#!periodic {}",
            Axis::ALL
                .iter()
                .map(|&axis| u8::from(geometry.is_periodic(axis)))
                .join(" ")
        )?;
        writeln!(out, "#!monomers {}", self.state.molecules.len())?;
        writeln!(out, "#!max-degree {}", self.state.molecules.max_degree())?;
        writeln!(out, "#!bond-vectors {}", self.state.bondset.len())?;
        writeln!(out, "#!age {}", self.age())?;
        self.pipeline.write_metadata(out)
    }

    pub fn metadata(&self) -> String {
        let mut out = String::new();
        // fmt::Write for String is infallible.
        let _ = self.write_metadata(&mut out);
        out
    }

    pub(crate) fn check_proposal(&self, proposal: &mut Proposal) -> bool {
        self.pipeline.check(&self.state, proposal)
    }

    /// Feature apply hooks, the graph mutation and the finalize hooks, in that
    /// order. Add moves create the monomer before the apply hooks so features
    /// can read its attributes.
    pub(crate) fn commit(&mut self, proposal: &Proposal) -> Result<(), EngineError> {
        trace!(kind = ?proposal.kind(), "Committing move");
        self.bump_revision();
        match *proposal.kind() {
            MoveKind::Local { index, direction } => {
                let target = self.state.molecules.position(index) + direction;
                self.pipeline.apply(&mut self.state, proposal);
                self.state.molecules.set_position(index, target);
            }
            MoveKind::Add {
                index,
                position,
                attributes,
            } => {
                let len = self.state.molecules.len();
                if index != len {
                    return Err(EngineError::Internal(format!(
                        "add move targets index {index} but the graph holds {len} monomers"
                    )));
                }
                self.state
                    .molecules
                    .add_monomer_with(Monomer::with_attributes(position, attributes));
                self.pipeline.apply(&mut self.state, proposal);
            }
            MoveKind::Connect { index, partner } => {
                let molecules = &self.state.molecules;
                let vector = molecules.position(partner) - molecules.position(index);
                let info = self.state.bondset.identifier_of(&vector);
                self.pipeline.apply(&mut self.state, proposal);
                self.state.molecules.connect(index, partner, info)?;
            }
            MoveKind::Break { index, partner } => {
                self.pipeline.apply(&mut self.state, proposal);
                self.state.molecules.disconnect(index, partner)?;
            }
        }
        self.pipeline.finalize(&self.state, proposal);
        Ok(())
    }
}
