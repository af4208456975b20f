use crate::content::{
    AbilityId, BuildingId, FollowerDbId, FollowerTemplateId, GameObjectTemplateId, OwnerId,
    PlotInstanceId, SiteId, SiteLevelId,
};
use crate::garrison::errors::GarrisonResult;
use crate::world::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingInfo {
    pub plot_instance_id: PlotInstanceId,
    pub building_id: BuildingId,
    pub time_built: u64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerInfo {
    pub db_id: FollowerDbId,
    pub template_id: FollowerTemplateId,
    pub quality: u8,
    pub level: u8,
    pub item_level_weapon: u32,
    pub item_level_armor: u32,
    pub xp: u32,
    pub current_building_id: Option<BuildingId>,
    pub current_mission_id: Option<u32>,
    pub status: u32,
    pub abilities: Vec<AbilityId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotInfo {
    pub plot_instance_id: PlotInstanceId,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingLandmark {
    pub game_object: GameObjectTemplateId,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GarrisonSnapshot {
    pub site_id: SiteId,
    pub site_level_id: SiteLevelId,
    pub activations_remaining: u32,
    pub plots: Vec<PlotInfo>,
    pub buildings: Vec<BuildingInfo>,
    pub followers: Vec<FollowerInfo>,
}

/// Result structures delivered to the owning player's client.
#[derive(Debug, Clone, PartialEq)]
pub enum GarrisonPacket {
    CreateResult {
        result: GarrisonResult,
        site_level_id: Option<SiteLevelId>,
    },
    DeleteResult {
        result: GarrisonResult,
        site_id: SiteId,
    },
    PlaceBuildingResult {
        result: GarrisonResult,
        building: Option<BuildingInfo>,
        play_activation_cinematic: bool,
    },
    BuildingRemoved {
        result: GarrisonResult,
        plot_instance_id: PlotInstanceId,
        building_id: BuildingId,
    },
    BuildingActivated {
        plot_instance_id: PlotInstanceId,
    },
    PlotPlaced {
        plot: PlotInfo,
    },
    PlotRemoved {
        plot_instance_id: PlotInstanceId,
    },
    LearnBlueprintResult {
        result: GarrisonResult,
        building_id: BuildingId,
    },
    UnlearnBlueprintResult {
        result: GarrisonResult,
        building_id: BuildingId,
    },
    AddFollowerResult {
        result: GarrisonResult,
        follower: Option<FollowerInfo>,
    },
    FollowerChangedQuality {
        result: GarrisonResult,
        follower: Option<FollowerInfo>,
    },
    Info(GarrisonSnapshot),
    RemoteInfo {
        site_level_id: SiteLevelId,
        buildings: Vec<BuildingInfo>,
    },
    BlueprintData {
        blueprints: Vec<BuildingId>,
    },
    BuildingLandmarks {
        landmarks: Vec<BuildingLandmark>,
    },
    MapData {
        plots: Vec<PlotInfo>,
    },
}

/// One-way sink for result structures. Implementations serialize and deliver;
/// nothing they return feeds back into garrison state.
pub trait GarrisonReporter {
    fn send(&mut self, owner: OwnerId, packet: GarrisonPacket);
}

/// Reporter for contexts without a connected client.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardReporter;

impl GarrisonReporter for DiscardReporter {
    fn send(&mut self, _owner: OwnerId, _packet: GarrisonPacket) {}
}
