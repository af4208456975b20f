use crate::content::records::{AncillaryKind, BuildingRecord, GameObjectKind};
use crate::content::{BuildingId, Faction, GameObjectTemplateId, PlotId, PlotInstanceId};
use crate::garrison::packets::{BuildingInfo, PlotInfo};
use crate::garrison::static_data::GarrisonStaticData;
use crate::telemetry::logging;
use crate::world::position::Position;
use crate::world::sim::{MapHandle, ObjectHandle, SpawnRequest, WorldSim};

/// Construction occupying a plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Building {
    pub id: BuildingId,
    pub time_built: u64,
    pub active: bool,
}

impl Building {
    pub fn under_construction(id: BuildingId, now: u64) -> Self {
        Self {
            id,
            time_built: now,
            active: false,
        }
    }

    /// Construction time has elapsed. Says nothing about whether it was activated yet.
    pub fn can_activate(&self, record: &BuildingRecord, now: u64) -> bool {
        self.time_built.saturating_add(record.build_seconds) <= now
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    pub instance_id: PlotInstanceId,
    pub plot_id: PlotId,
    pub position: Position,
    pub placeholder: GameObjectTemplateId,
    pub building: Option<Building>,
    /// Main object first, then decoration and ancillary spawns.
    spawned: Vec<ObjectHandle>,
}

impl Plot {
    pub fn new(
        instance_id: PlotInstanceId,
        plot_id: PlotId,
        placeholder: GameObjectTemplateId,
        position: Position,
    ) -> Self {
        Self {
            instance_id,
            plot_id,
            position,
            placeholder,
            building: None,
            spawned: Vec::new(),
        }
    }

    pub fn info(&self) -> PlotInfo {
        PlotInfo {
            plot_instance_id: self.instance_id,
            position: self.position,
        }
    }

    pub fn building_info(&self) -> Option<BuildingInfo> {
        self.building.map(|building| BuildingInfo {
            plot_instance_id: self.instance_id,
            building_id: building.id,
            time_built: building.time_built,
            active: building.active,
        })
    }

    /// Returns true when the plot was empty before.
    pub fn set_building(&mut self, building: Building) -> bool {
        self.building.replace(building).is_none()
    }

    pub fn clear_building(&mut self) -> Option<Building> {
        self.building.take()
    }

    pub fn spawned(&self) -> &[ObjectHandle] {
        &self.spawned
    }

    /// Object template representing the plot in the world right now.
    pub fn representation(&self, data: &GarrisonStaticData, faction: Faction) -> GameObjectTemplateId {
        let Some(building) = self.building else {
            return self.placeholder;
        };
        let finished = data
            .building(building.id)
            .map(|record| record.objects.get(faction))
            .unwrap_or_default();
        if building.active {
            return finished;
        }
        let construct = data
            .plot(self.plot_id)
            .map(|plot| plot.construct_objects.get(faction))
            .unwrap_or_default();
        if construct == GameObjectTemplateId::default() {
            finished
        } else {
            construct
        }
    }

    pub fn spawn(
        &mut self,
        map: MapHandle,
        world: &mut dyn WorldSim,
        data: &GarrisonStaticData,
        faction: Faction,
        now: u64,
    ) {
        let entry = self.representation(data, faction);
        let Some(template) = data.game_object(entry) else {
            logging::log_error(&format!(
                "garrison plot {}: game object template {} not found, nothing spawned",
                self.instance_id, entry
            ));
            return;
        };
        let Some(handle) = world.spawn(map, &SpawnRequest::game_object(entry.0, self.position)) else {
            return;
        };
        self.spawned.push(handle);

        if let Some(building) = self.building {
            let ready = data
                .building(building.id)
                .map_or(false, |record| building.can_activate(record, now));
            if ready && !building.active {
                if let Some(finalize) = data.plot_finalize_info(self.instance_id) {
                    let decoration = finalize.get(faction);
                    let request = SpawnRequest {
                        anim_kit: Some(decoration.anim_kit),
                        despawn_after_use: true,
                        ..SpawnRequest::game_object(decoration.game_object.0, decoration.position)
                    };
                    if let Some(handle) = world.spawn(map, &request) {
                        self.spawned.push(handle);
                    }
                }
            }
        }

        if template.kind == GameObjectKind::GarrisonBuilding {
            for ancillary in &template.spawns {
                let position = self.position.offset(ancillary.offset);
                let request = match ancillary.kind {
                    AncillaryKind::Creature => SpawnRequest::creature(ancillary.template_id, position),
                    AncillaryKind::GameObject => {
                        SpawnRequest::game_object(ancillary.template_id, position)
                    }
                };
                if let Some(handle) = world.spawn(map, &request) {
                    self.spawned.push(handle);
                }
            }
        }
    }

    pub fn despawn(&mut self, map: MapHandle, world: &mut dyn WorldSim) {
        for handle in self.spawned.drain(..) {
            world.despawn(map, handle);
        }
    }

    /// Drops handles whose map is gone.
    pub fn forget_spawns(&mut self) {
        self.spawned.clear();
    }
}
