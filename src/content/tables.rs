use crate::content::records::{
    AbilityRecord, BuildingRecord, ClassSpecAbilityRecord, ClassSpecRecord, FollowerAbilityRecord,
    FollowerRecord, GameObjectRecord, PlotBuildingRecord, PlotFinalizeRecord, PlotInstanceRecord,
    PlotPlaceholderRecord, PlotRecord, SiteLevelPlotRecord, SiteLevelRecord,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Game-content records the garrison reads. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentTables {
    pub site_levels: Vec<SiteLevelRecord>,
    pub plots: Vec<PlotRecord>,
    pub plot_instances: Vec<PlotInstanceRecord>,
    pub site_level_plots: Vec<SiteLevelPlotRecord>,
    pub plot_buildings: Vec<PlotBuildingRecord>,
    pub buildings: Vec<BuildingRecord>,
    pub followers: Vec<FollowerRecord>,
    pub abilities: Vec<AbilityRecord>,
    pub follower_abilities: Vec<FollowerAbilityRecord>,
    pub class_specs: Vec<ClassSpecRecord>,
    pub game_objects: Vec<GameObjectRecord>,
    pub plot_placeholders: Vec<PlotPlaceholderRecord>,
}

/// World-specific tables maintained next to the content: finalize decorations and
/// class-spec ability pools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTables {
    pub plot_finalize: Vec<PlotFinalizeRecord>,
    pub class_spec_abilities: Vec<ClassSpecAbilityRecord>,
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ContentTables {
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        load_yaml(path)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

impl WorldTables {
    /// A missing file means the world carries no finalize decorations or class-spec pools.
    pub fn load_optional(path: &Path) -> Result<Self, ContentError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        load_yaml(path)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

fn load_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ContentError> {
    let data = std::fs::read_to_string(path).map_err(|source| ContentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&data).map_err(|source| ContentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
