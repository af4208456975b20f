use crate::content::{
    AbilityId, BuildingId, BuildingType, ClassSpecId, FollowerTemplateId, GameObjectTemplateId,
    MapId, PerFaction, PlotId, PlotInstanceId, SiteId, SiteLevelId, FOLLOWER_TYPE_GARRISON,
};
use crate::world::position::{Position, PositionDelta};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteLevelRecord {
    pub id: SiteLevelId,
    pub site_id: SiteId,
    pub level: u8,
    pub map_id: MapId,
    pub max_building_level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotRecord {
    pub id: PlotId,
    #[serde(default)]
    pub name: String,
    /// Scaffolding shown while a building on this plot is under construction.
    #[serde(default)]
    pub construct_objects: PerFaction<GameObjectTemplateId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotInstanceRecord {
    pub id: PlotInstanceId,
    pub plot_id: PlotId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteLevelPlotRecord {
    pub site_level_id: SiteLevelId,
    pub plot_instance_id: PlotInstanceId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotBuildingRecord {
    pub plot_id: PlotId,
    pub building_id: BuildingId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub id: BuildingId,
    pub building_type: BuildingType,
    pub upgrade_level: u8,
    #[serde(default)]
    pub name: String,
    pub objects: PerFaction<GameObjectTemplateId>,
    #[serde(default)]
    pub currency_type: u32,
    #[serde(default)]
    pub currency_qty: u32,
    #[serde(default)]
    pub gold_cost: u32,
    #[serde(default)]
    pub build_seconds: u64,
    /// Placeable from a learned blueprint. Buildings without it are quest rewards.
    #[serde(default)]
    pub needs_plan: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowerRecord {
    pub id: FollowerTemplateId,
    #[serde(default = "default_follower_type")]
    pub follower_type: u8,
    pub quality: u8,
    pub level: u8,
    pub item_level_weapon: u32,
    pub item_level_armor: u32,
    #[serde(default)]
    pub class_specs: PerFaction<ClassSpecId>,
}

/// Named ability capabilities. Parsed from the content's flag-name list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AbilityFlags {
    pub is_trait: bool,
    pub cannot_roll: bool,
    pub horde_only: bool,
    pub alliance_only: bool,
    pub cannot_remove: bool,
    pub exclusive: bool,
}

impl AbilityFlags {
    pub fn from_list(list: &[String]) -> Self {
        let mut flags = Self::default();
        for entry in list {
            match entry.as_str() {
                "Trait" => flags.is_trait = true,
                "CannotRoll" => flags.cannot_roll = true,
                "HordeOnly" => flags.horde_only = true,
                "AllianceOnly" => flags.alliance_only = true,
                "CannotRemove" => flags.cannot_remove = true,
                "Exclusive" => flags.exclusive = true,
                _ => {}
            }
        }
        flags
    }

    pub fn to_list(self) -> Vec<String> {
        let mut list = Vec::new();
        for (set, name) in [
            (self.is_trait, "Trait"),
            (self.cannot_roll, "CannotRoll"),
            (self.horde_only, "HordeOnly"),
            (self.alliance_only, "AllianceOnly"),
            (self.cannot_remove, "CannotRemove"),
            (self.exclusive, "Exclusive"),
        ] {
            if set {
                list.push(name.to_string());
            }
        }
        list
    }

    pub fn available_to(self, faction: crate::content::Faction) -> bool {
        match faction {
            crate::content::Faction::Horde => !self.alliance_only,
            crate::content::Faction::Alliance => !self.horde_only,
        }
    }
}

impl From<Vec<String>> for AbilityFlags {
    fn from(list: Vec<String>) -> Self {
        Self::from_list(&list)
    }
}

impl From<AbilityFlags> for Vec<String> {
    fn from(flags: AbilityFlags) -> Self {
        flags.to_list()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityRecord {
    pub id: AbilityId,
    #[serde(default = "default_follower_type")]
    pub follower_type: u8,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub flags: AbilityFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowerAbilityRecord {
    pub follower_id: FollowerTemplateId,
    pub ability_id: AbilityId,
    /// 0 horde, 1 alliance; anything else only feeds the random-trait pool.
    pub faction_index: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpecRecord {
    pub id: ClassSpecId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameObjectKind {
    #[default]
    Generic,
    Goober,
    GarrisonPlot,
    GarrisonBuilding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AncillaryKind {
    Creature,
    GameObject,
}

/// Creature or prop that appears around a finished building, placed relative to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncillarySpawn {
    pub kind: AncillaryKind,
    pub template_id: u32,
    pub offset: PositionDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObjectRecord {
    pub id: GameObjectTemplateId,
    #[serde(default)]
    pub kind: GameObjectKind,
    #[serde(default)]
    pub spawns: Vec<AncillarySpawn>,
}

/// Placeholder object marking where a plot sits on a garrison map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotPlaceholderRecord {
    pub map_id: MapId,
    pub plot_instance_id: PlotInstanceId,
    pub game_object: GameObjectTemplateId,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalizeDecoration {
    pub game_object: GameObjectTemplateId,
    pub position: Position,
    #[serde(default)]
    pub anim_kit: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotFinalizeRecord {
    pub plot_instance_id: PlotInstanceId,
    pub horde: FinalizeDecoration,
    pub alliance: FinalizeDecoration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpecAbilityRecord {
    pub class_spec_id: ClassSpecId,
    pub ability_id: AbilityId,
}

fn default_follower_type() -> u8 {
    FOLLOWER_TYPE_GARRISON
}
