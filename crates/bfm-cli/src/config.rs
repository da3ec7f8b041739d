use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use bfm::core::lattice::{Addressing, Axis};
use bfm::core::models::bondset::BondSetKind;
use bfm::core::models::graph::MoleculeGraph;
use bfm::core::models::monomer::{Monomer, MonomerAttributes};
use bfm::core::models::vector::Vector3D;
use bfm::engine::config::{self as core_config, SweepConfigBuilder, SystemConfigBuilder};
use bfm::engine::error::EngineError;
use bfm::engine::features::bond_set::BondSetRule;
use bfm::engine::features::excluded_volume::{
    BooleanOccupancy, ExcludedVolumeSc, MonomerIdOccupancy, TagOccupancy,
};
use bfm::engine::features::excluded_volume_bcc::ExcludedVolumeBcc;
use bfm::engine::features::external_field::ExternalField;
use bfm::engine::features::fixed::FixedMonomers;
use bfm::engine::features::pair_interaction::PairInteraction;
use bfm::engine::features::reactivity::Reactivity;
use bfm::engine::features::tagging::MonomerTagging;
use bfm::engine::features::wall::{Wall, Walls};
use bfm::engine::features::{Feature, FeatureRegistry};
use bfm::engine::moves::LocalMoveSet;
use bfm::engine::system::LatticeSystem;
use nalgebra::Vector3;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_CHAIN_BOND: [i32; 3] = [2, 0, 0];
const DEFAULT_CHAIN_SPACING: [i32; 3] = [0, 4, 0];
const DEFAULT_PAIR_SKIN: f64 = 1.0;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialBoxConfig {
    size: Option<[i32; 3]>,
    periodic: Option<[bool; 3]>,
    addressing: Option<Addressing>,
    #[serde(rename = "max-degree")]
    max_degree: Option<usize>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(deny_unknown_fields)]
struct PartialBondVector {
    vector: [i32; 3],
    id: i32,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialBondsConfig {
    set: Option<BondSetKind>,
    #[serde(default)]
    extra: Vec<PartialBondVector>,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
enum OccupancyKind {
    #[default]
    Boolean,
    MonomerId,
    Tag,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(deny_unknown_fields)]
struct PartialWallPlane {
    base: [i32; 3],
    normal: [i32; 3],
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(deny_unknown_fields)]
struct PartialWell {
    tags: [i32; 2],
    energy: f64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", tag = "type")]
enum PartialFeature {
    ExcludedVolumeSc {
        #[serde(default)]
        occupancy: OccupancyKind,
    },
    ExcludedVolumeBcc,
    BondSet,
    FixedMonomers,
    Walls {
        extent: Option<i32>,
        #[serde(default)]
        planes: Vec<PartialWallPlane>,
    },
    ExternalField {
        axis: Axis,
        strength: f64,
    },
    PairInteraction {
        cutoff: f64,
        skin: Option<f64>,
        #[serde(default)]
        wells: Vec<PartialWell>,
    },
    Reactivity,
    MonomerTagging {
        tag: i32,
    },
}

impl PartialFeature {
    fn into_feature(self) -> Result<Box<dyn Feature>> {
        let feature: Box<dyn Feature> = match self {
            PartialFeature::ExcludedVolumeSc { occupancy } => match occupancy {
                OccupancyKind::Boolean => Box::new(ExcludedVolumeSc::<BooleanOccupancy>::new()),
                OccupancyKind::MonomerId => Box::new(ExcludedVolumeSc::<MonomerIdOccupancy>::new()),
                OccupancyKind::Tag => Box::new(ExcludedVolumeSc::<TagOccupancy>::new()),
            },
            PartialFeature::ExcludedVolumeBcc => Box::new(ExcludedVolumeBcc::new()),
            PartialFeature::BondSet => Box::new(BondSetRule::new()),
            PartialFeature::FixedMonomers => Box::new(FixedMonomers::new()),
            PartialFeature::Walls { extent, planes } => {
                let mut walls = Walls::new();
                if let Some(extent) = extent {
                    walls = walls.with_extent(extent);
                }
                for plane in planes {
                    let wall = Wall::new(Vector3::from(plane.base), Vector3::from(plane.normal))
                        .map_err(EngineError::from)?;
                    walls.add_wall(wall);
                }
                Box::new(walls)
            }
            PartialFeature::ExternalField { axis, strength } => {
                Box::new(ExternalField::new(axis, strength))
            }
            PartialFeature::PairInteraction {
                cutoff,
                skin,
                wells,
            } => {
                let mut interaction =
                    PairInteraction::new(cutoff, skin.unwrap_or(DEFAULT_PAIR_SKIN));
                for well in wells {
                    interaction.set_well(well.tags[0], well.tags[1], well.energy);
                }
                Box::new(interaction)
            }
            PartialFeature::Reactivity => Box::new(Reactivity::new()),
            PartialFeature::MonomerTagging { tag } => Box::new(MonomerTagging::new(tag)),
        };
        Ok(feature)
    }
}

/// A block of identical linear chains laid out on a regular grid.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
struct PartialChainBlock {
    count: Option<usize>,
    length: usize,
    start: Option<[i32; 3]>,
    spacing: Option<[i32; 3]>,
    bond: Option<[i32; 3]>,
    tag: Option<i32>,
    movable: Option<bool>,
    reactive: Option<bool>,
}

impl PartialChainBlock {
    fn attributes(&self) -> MonomerAttributes {
        let defaults = MonomerAttributes::default();
        MonomerAttributes {
            tag: self.tag.unwrap_or(defaults.tag),
            movable: self.movable.unwrap_or(defaults.movable),
            reactive: self.reactive.unwrap_or(defaults.reactive),
        }
    }

    /// Appends the block to `molecules`, bonding consecutive monomers with `info`.
    fn populate(&self, molecules: &mut MoleculeGraph, info: Option<i32>) -> Result<()> {
        let start = self.start.unwrap_or([0; 3]);
        let spacing = self.spacing.unwrap_or(DEFAULT_CHAIN_SPACING);
        let bond = self.bond.unwrap_or(DEFAULT_CHAIN_BOND);
        let attributes = self.attributes();

        for chain in 0..self.count.unwrap_or(1) {
            let origin = offset(start, spacing, chain)?;
            let mut previous = None;
            for k in 0..self.length {
                let [x, y, z] = offset(origin, bond, k)?;
                let index = molecules
                    .add_monomer_with(Monomer::with_attributes(Vector3D::new(x, y, z), attributes));
                if let Some(previous) = previous {
                    molecules
                        .connect(previous, index, info)
                        .map_err(EngineError::from)?;
                }
                previous = Some(index);
            }
        }
        Ok(())
    }
}

fn offset(base: [i32; 3], step: [i32; 3], times: usize) -> Result<[i32; 3]> {
    let times = i32::try_from(times)
        .map_err(|_| CliError::Config(format!("Chain layout index {times} is too large")))?;
    let mut out = base;
    for (component, s) in out.iter_mut().zip(step) {
        let current = *component;
        *component = s
            .checked_mul(times)
            .and_then(|d| current.checked_add(d))
            .ok_or_else(|| CliError::Config("Chain layout overflows lattice coordinates".into()))?;
    }
    Ok(out)
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSimulationConfig {
    sweeps: Option<u64>,
    seed: Option<u64>,
    #[serde(rename = "move-set")]
    move_set: Option<LocalMoveSet>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    #[serde(rename = "box")]
    geometry: Option<PartialBoxConfig>,
    bonds: Option<PartialBondsConfig>,
    #[serde(default)]
    features: Vec<PartialFeature>,
    #[serde(default)]
    chains: Vec<PartialChainBlock>,
    simulation: Option<PartialSimulationConfig>,
}

/// Fully merged run configuration.
#[derive(Debug)]
pub struct RunConfig {
    pub system: core_config::SystemConfig,
    pub sweep: core_config::SweepConfig,
    /// `None` draws a seed from system entropy.
    pub seed: Option<u64>,
    extra_bonds: Vec<PartialBondVector>,
    features: Vec<PartialFeature>,
    chains: Vec<PartialChainBlock>,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Applies command-line overrides and validates through the core builders.
    pub fn merge_with_cli(self, args: &RunArgs) -> Result<RunConfig> {
        let geometry = self.geometry.unwrap_or_default();
        let bonds = self.bonds.unwrap_or_default();
        let simulation = self.simulation.unwrap_or_default();

        let [px, py, pz] = geometry.periodic.unwrap_or([true; 3]);
        let mut system_builder = SystemConfigBuilder::new()
            .periodicity(px, py, pz)
            .bond_set(bonds.set.unwrap_or(BondSetKind::ClassicSc));
        if let Some([x, y, z]) = geometry.size {
            system_builder = system_builder.box_size(x, y, z);
        }
        if let Some(addressing) = geometry.addressing {
            system_builder = system_builder.addressing(addressing);
        }
        if let Some(max_degree) = geometry.max_degree {
            system_builder = system_builder.max_degree(max_degree);
        }
        let system = system_builder.build().map_err(EngineError::from)?;

        let mut sweep_builder = SweepConfigBuilder::new();
        if let Some(sweeps) = args.sweeps.or(simulation.sweeps) {
            sweep_builder = sweep_builder.sweeps(sweeps);
        }
        if let Some(move_set) = simulation.move_set {
            sweep_builder = sweep_builder.move_set(move_set);
        }
        let sweep = sweep_builder.build().map_err(EngineError::from)?;

        if self.chains.iter().any(|block| block.count == Some(0)) {
            return Err(CliError::Config(
                "Chain blocks must contain at least one chain".to_string(),
            ));
        }

        Ok(RunConfig {
            system,
            sweep,
            seed: args.seed.or(simulation.seed),
            extra_bonds: bonds.extra,
            features: self.features,
            chains: self.chains,
        })
    }
}

impl RunConfig {
    /// Builds the system, adds the extra bond vectors, lays out the chains and
    /// synchronizes every feature against the result.
    pub fn build_system(&self) -> Result<LatticeSystem> {
        let mut registry = FeatureRegistry::new();
        for feature in &self.features {
            registry.register_boxed(feature.clone().into_feature()?);
        }
        let mut system = LatticeSystem::new(&self.system, registry)?;

        for extra in &self.extra_bonds {
            let [x, y, z] = extra.vector;
            system
                .modify_bondset()
                .add_bond(Vector3D::new(x, y, z), extra.id)
                .map_err(EngineError::from)?;
        }

        for block in &self.chains {
            let [x, y, z] = block.bond.unwrap_or(DEFAULT_CHAIN_BOND);
            let info = system.bondset().identifier_of(&Vector3D::new(x, y, z));
            block.populate(system.modify_molecules(), info)?;
        }
        system.synchronize()?;

        info!(
            monomers = system.molecules().len(),
            bonds = system.molecules().edges().count(),
            "Initial configuration built."
        );
        Ok(system)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn args(sweeps: Option<u64>, seed: Option<u64>) -> RunArgs {
        RunArgs {
            config: PathBuf::from("unused.toml"),
            sweeps,
            seed,
        }
    }

    fn parse(content: &str) -> PartialRunConfig {
        PartialRunConfig::from_toml(content).unwrap()
    }

    const MELT: &str = r#"
        [box]
        size = [32, 32, 32]
        addressing = "power-of-two"

        [bonds]
        set = "classic-sc"

        [[features]]
        type = "excluded-volume-sc"

        [[features]]
        type = "bond-set"

        [[chains]]
        count = 3
        length = 4
        start = [2, 2, 2]

        [simulation]
        sweeps = 20
        seed = 11
        move-set = "simple-cubic"
    "#;

    #[test]
    fn loads_configuration_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MELT.as_bytes()).unwrap();
        let config = PartialRunConfig::from_file(file.path())
            .unwrap()
            .merge_with_cli(&args(None, None))
            .unwrap();
        assert_eq!(config.system.box_size, [32, 32, 32]);
        assert_eq!(config.system.periodicity, [true; 3]);
        assert_eq!(config.system.addressing, Addressing::PowerOfTwo);
        assert_eq!(config.sweep.sweeps, 20);
        assert_eq!(config.seed, Some(11));
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[box]\nsize = \"large\"\n").unwrap();
        let err = PartialRunConfig::from_file(file.path()).unwrap_err();
        match err {
            CliError::FileParsing { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(PartialRunConfig::from_toml("[box]\nsizes = [8, 8, 8]\n").is_err());
        assert!(PartialRunConfig::from_toml("[simulation]\nsweep = 3\n").is_err());
    }

    #[test]
    fn command_line_overrides_file_values() {
        let config = parse(MELT).merge_with_cli(&args(Some(5), Some(99))).unwrap();
        assert_eq!(config.sweep.sweeps, 5);
        assert_eq!(config.seed, Some(99));
    }

    #[test]
    fn missing_box_size_and_sweeps_are_reported() {
        let err = parse("[simulation]\nsweeps = 3\n")
            .merge_with_cli(&args(None, None))
            .unwrap_err();
        assert!(err.to_string().contains("box_size"));

        let err = parse("[box]\nsize = [8, 8, 8]\n")
            .merge_with_cli(&args(None, None))
            .unwrap_err();
        assert!(err.to_string().contains("sweeps"));
    }

    #[test]
    fn builds_chains_with_bonds_and_features() {
        let system = parse(MELT)
            .merge_with_cli(&args(None, None))
            .unwrap()
            .build_system()
            .unwrap();
        assert_eq!(system.molecules().len(), 12);
        assert_eq!(system.molecules().edges().count(), 9);
        assert_eq!(system.molecules().position(4), Vector3D::new(2, 6, 2));
        assert_eq!(system.molecules().position(7), Vector3D::new(8, 6, 2));
        assert_eq!(
            system.feature_names(),
            vec![ExcludedVolumeSc::<BooleanOccupancy>::NAME, BondSetRule::NAME]
        );
        let info = system.molecules().link_info(0, 1).unwrap();
        assert_eq!(info, system.bondset().identifier_of(&Vector3D::new(2, 0, 0)));
    }

    #[test]
    fn overlapping_chains_fail_synchronization() {
        let content = r#"
            [box]
            size = [16, 16, 16]

            [[features]]
            type = "excluded-volume-sc"

            [[chains]]
            count = 2
            length = 2
            spacing = [0, 1, 0]

            [simulation]
            sweeps = 1
        "#;
        let err = parse(content)
            .merge_with_cli(&args(None, None))
            .unwrap()
            .build_system()
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Engine(EngineError::DoubleOccupancy { .. })
        ));
    }

    #[test]
    fn every_feature_type_is_recognised() {
        let content = r#"
            [box]
            size = [32, 32, 32]

            [bonds]
            extra = [{ vector = [1, 0, 0], id = 1000 }]

            [[features]]
            type = "excluded-volume-sc"
            occupancy = "tag"

            [[features]]
            type = "fixed-monomers"

            [[features]]
            type = "walls"
            planes = [{ base = [0, 0, 0], normal = [0, 0, 1] }]

            [[features]]
            type = "external-field"
            axis = "x"
            strength = 0.5

            [[features]]
            type = "pair-interaction"
            cutoff = 3.0
            wells = [{ tags = [1, 1], energy = -0.2 }]

            [[features]]
            type = "reactivity"

            [[features]]
            type = "monomer-tagging"
            tag = 4

            [[chains]]
            length = 5
            start = [4, 4, 4]
            tag = 1
            reactive = true

            [simulation]
            sweeps = 1
        "#;
        let system = parse(content)
            .merge_with_cli(&args(None, None))
            .unwrap()
            .build_system()
            .unwrap();
        assert_eq!(system.feature_names().len(), 7);
        assert_eq!(system.bondset().identifier_of(&Vector3D::new(1, 0, 0)), Some(1000));
        assert!(system.molecules().attributes(0).reactive);
        assert_eq!(system.molecules().attributes(4).tag, 1);
    }

    #[test]
    fn tilted_wall_normal_is_a_wall_error() {
        let content = r#"
            [box]
            size = [16, 16, 16]

            [[features]]
            type = "walls"
            planes = [{ base = [0, 0, 0], normal = [1, 1, 0] }]

            [simulation]
            sweeps = 1
        "#;
        let err = parse(content)
            .merge_with_cli(&args(None, None))
            .unwrap()
            .build_system()
            .unwrap_err();
        assert!(matches!(err, CliError::Engine(EngineError::Wall { .. })));
    }
}
