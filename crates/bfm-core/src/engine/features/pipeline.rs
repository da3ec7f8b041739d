use super::Feature;
use crate::core::models::vector::Vector3D;
use crate::engine::error::EngineError;
use crate::engine::moves::Proposal;
use crate::engine::state::SystemState;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, instrument, trace};

/// Collects features before their execution order is resolved.
#[derive(Default)]
pub struct FeatureRegistry {
    features: Vec<Box<dyn Feature>>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F: Feature + 'static>(&mut self, feature: F) -> &mut Self {
        self.features.push(Box::new(feature));
        self
    }

    pub fn register_boxed(&mut self, feature: Box<dyn Feature>) -> &mut Self {
        self.features.push(feature);
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Orders the registered features topologically.
    ///
    /// Uses Kahn's algorithm over the declared `runs_after` / `runs_before`
    /// relations. Among features that are ready at the same time, the one
    /// registered first runs first. Relations naming features that were never
    /// registered are ignored.
    ///
    /// # Errors
    ///
    /// `DuplicateFeature` when two features share a name, `FeatureCycle` when the
    /// relations cannot be satisfied.
    pub fn build(self) -> Result<FeaturePipeline, EngineError> {
        let n = self.features.len();
        let mut by_name = HashMap::with_capacity(n);
        for (i, feature) in self.features.iter().enumerate() {
            if by_name.insert(feature.name(), i).is_some() {
                return Err(EngineError::DuplicateFeature(feature.name()));
            }
        }

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];
        let mut add_edge = |from: usize, to: usize| {
            successors[from].push(to);
            in_degree[to] += 1;
        };
        for (i, feature) in self.features.iter().enumerate() {
            for name in feature.runs_after() {
                if let Some(&j) = by_name.get(name) {
                    add_edge(j, i);
                }
            }
            for name in feature.runs_before() {
                if let Some(&j) = by_name.get(name) {
                    add_edge(i, j);
                }
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &j in &successors[i] {
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    ready.insert(j);
                }
            }
        }

        if order.len() < n {
            let stuck = (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.features[i].name())
                .collect();
            return Err(EngineError::FeatureCycle(stuck));
        }

        let mut slots: Vec<Option<Box<dyn Feature>>> =
            self.features.into_iter().map(Some).collect();
        let features: Vec<_> = order.iter().filter_map(|&i| slots[i].take()).collect();
        debug!(
            order = ?features.iter().map(|f| f.name()).collect::<Vec<_>>(),
            "Resolved feature order"
        );
        Ok(FeaturePipeline { features })
    }
}

/// Features in resolved execution order.
#[derive(Default)]
pub struct FeaturePipeline {
    features: Vec<Box<dyn Feature>>,
}

impl FeaturePipeline {
    pub fn names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Logical AND of every feature's verdict, stopping at the first veto.
    #[inline]
    pub fn check(&self, state: &SystemState, proposal: &mut Proposal) -> bool {
        for feature in &self.features {
            if !feature.check_move(state, proposal) {
                trace!(feature = feature.name(), kind = ?proposal.kind(), "Move rejected");
                return false;
            }
        }
        true
    }

    pub fn apply(&mut self, state: &mut SystemState, proposal: &Proposal) {
        for feature in &mut self.features {
            feature.apply_move(state, proposal);
        }
    }

    pub fn finalize(&mut self, state: &SystemState, proposal: &Proposal) {
        for feature in &mut self.features {
            feature.finalize_move(state, proposal);
        }
    }

    #[instrument(skip_all, fields(features = self.features.len()))]
    pub fn synchronize(&mut self, state: &SystemState) -> Result<(), EngineError> {
        for feature in &mut self.features {
            debug!(feature = feature.name(), "Synchronizing feature");
            feature.synchronize(state)?;
        }
        Ok(())
    }

    /// Concatenates every feature's metadata in execution order.
    pub fn write_metadata(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.features.iter().try_for_each(|f| f.write_metadata(out))
    }

    /// Value from the first feature that owns a lattice.
    pub fn lattice_entry(&self, pos: Vector3D<i32>) -> Option<u32> {
        self.features.iter().find_map(|f| f.lattice_entry(pos))
    }
}
