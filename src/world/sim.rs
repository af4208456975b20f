use crate::content::OwnerId;
use crate::world::position::Position;

/// Opaque handle to a loaded map instance, issued by the world simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapHandle(pub u64);

/// Opaque handle to a spawned world object. Only the world simulation can resolve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    GameObject,
    Creature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub kind: SpawnKind,
    pub template_id: u32,
    pub position: Position,
    pub anim_kit: Option<u16>,
    /// Object removes itself once a player has used it.
    pub despawn_after_use: bool,
}

impl SpawnRequest {
    pub fn game_object(template_id: u32, position: Position) -> Self {
        Self {
            kind: SpawnKind::GameObject,
            template_id,
            position,
            anim_kit: None,
            despawn_after_use: false,
        }
    }

    pub fn creature(template_id: u32, position: Position) -> Self {
        Self {
            kind: SpawnKind::Creature,
            template_id,
            position,
            anim_kit: None,
            despawn_after_use: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaType {
    PlaceGarrisonBuilding,
    ActivateGarrisonBuilding,
    RecruitGarrisonFollower,
}

/// Spatial collaborator. Every call is best effort: a `None` from `find_map` or `spawn`
/// only skips the visual side of a garrison change, never the change itself.
pub trait WorldSim {
    fn find_map(&self, owner: OwnerId) -> Option<MapHandle>;

    fn spawn(&mut self, map: MapHandle, request: &SpawnRequest) -> Option<ObjectHandle>;

    fn despawn(&mut self, map: MapHandle, handle: ObjectHandle);

    fn update_criteria(&mut self, owner: OwnerId, criteria: CriteriaType, asset: u64);
}

/// World stand-in for owners whose map is not loaded (offline saves, tooling).
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedWorld;

impl WorldSim for DetachedWorld {
    fn find_map(&self, _owner: OwnerId) -> Option<MapHandle> {
        None
    }

    fn spawn(&mut self, _map: MapHandle, _request: &SpawnRequest) -> Option<ObjectHandle> {
        None
    }

    fn despawn(&mut self, _map: MapHandle, _handle: ObjectHandle) {}

    fn update_criteria(&mut self, _owner: OwnerId, _criteria: CriteriaType, _asset: u64) {}
}
