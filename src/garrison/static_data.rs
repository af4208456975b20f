use crate::content::records::{
    AbilityRecord, BuildingRecord, ClassSpecAbilityRecord, FinalizeDecoration, FollowerRecord,
    GameObjectKind, GameObjectRecord, PlotFinalizeRecord, PlotInstanceRecord, PlotRecord,
    SiteLevelRecord,
};
use crate::content::tables::{ContentTables, WorldTables};
use crate::content::{
    AbilityId, BuildingId, BuildingType, ClassSpecId, Faction, FollowerTemplateId,
    GameObjectTemplateId, MapId, PerFaction, PlotId, PlotInstanceId, SiteId, SiteLevelId,
    FOLLOWER_TYPE_GARRISON,
};
use crate::telemetry::logging;
use crate::world::position::Position;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Abilities a follower template carries for one faction, split by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowerAbilities {
    pub counters: BTreeSet<AbilityId>,
    pub traits: BTreeSet<AbilityId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotPlaceholder {
    pub game_object: GameObjectTemplateId,
    pub position: Position,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticDataSummary {
    pub site_levels: usize,
    pub plot_instances: usize,
    pub buildings: usize,
    pub followers: usize,
    pub abilities: usize,
    pub random_traits: usize,
    pub class_spec_pools: usize,
    pub finalize_entries: usize,
    pub warnings: usize,
}

/// Lookup tables derived once from game content. Immutable after `initialize`,
/// shared behind an `Arc` by every garrison.
#[derive(Debug, Default)]
pub struct GarrisonStaticData {
    site_levels: HashMap<SiteLevelId, SiteLevelRecord>,
    plots: HashMap<PlotId, PlotRecord>,
    plot_instances: HashMap<PlotInstanceId, PlotInstanceRecord>,
    buildings: HashMap<BuildingId, BuildingRecord>,
    followers: HashMap<FollowerTemplateId, FollowerRecord>,
    abilities: HashMap<AbilityId, AbilityRecord>,
    class_specs: HashSet<ClassSpecId>,
    game_objects: HashMap<GameObjectTemplateId, GameObjectRecord>,
    plot_inst_by_site_level: HashMap<SiteLevelId, Vec<PlotInstanceId>>,
    plot_placeholders: HashMap<MapId, HashMap<PlotInstanceId, PlotPlaceholder>>,
    buildings_by_plot: HashMap<PlotId, HashSet<BuildingId>>,
    buildings_by_type: HashMap<BuildingType, Vec<BuildingId>>,
    follower_abilities: [HashMap<FollowerTemplateId, FollowerAbilities>; 2],
    random_traits: BTreeSet<AbilityId>,
    class_spec_abilities: HashMap<ClassSpecId, Vec<AbilityId>>,
    plot_finalize: HashMap<PlotInstanceId, PerFaction<FinalizeDecoration>>,
    warnings: Vec<String>,
}

impl GarrisonStaticData {
    pub fn initialize(content: ContentTables, world: WorldTables) -> Self {
        let mut data = Self::default();

        for record in content.site_levels {
            if let Some(previous) = data.site_levels.insert(record.id, record) {
                data.warn(format!("duplicate site level {} in content", previous.id));
            }
        }
        for record in content.plots {
            data.plots.insert(record.id, record);
        }
        for record in content.plot_instances {
            data.plot_instances.insert(record.id, record);
        }
        for record in content.buildings {
            if let Some(previous) = data.buildings.insert(record.id, record) {
                data.warn(format!("duplicate building {} in content", previous.id));
            }
        }
        for record in content.followers {
            if let Some(previous) = data.followers.insert(record.id, record) {
                data.warn(format!("duplicate follower {} in content", previous.id));
            }
        }
        for record in content.abilities {
            if let Some(previous) = data.abilities.insert(record.id, record) {
                data.warn(format!("duplicate ability {} in content", previous.id));
            }
        }
        for record in content.class_specs {
            data.class_specs.insert(record.id);
        }
        for record in content.game_objects {
            data.game_objects.insert(record.id, record);
        }

        for row in content.site_level_plots {
            data.plot_inst_by_site_level
                .entry(row.site_level_id)
                .or_default()
                .push(row.plot_instance_id);
        }

        for placeholder in content.plot_placeholders {
            data.plot_placeholders
                .entry(placeholder.map_id)
                .or_default()
                .insert(
                    placeholder.plot_instance_id,
                    PlotPlaceholder {
                        game_object: placeholder.game_object,
                        position: placeholder.position,
                    },
                );
        }

        for row in content.plot_buildings {
            data.buildings_by_plot
                .entry(row.plot_id)
                .or_default()
                .insert(row.building_id);
        }

        let mut by_type: Vec<&BuildingRecord> = data.buildings.values().collect();
        by_type.sort_by_key(|building| (building.building_type, building.upgrade_level, building.id));
        let mut buildings_by_type: HashMap<BuildingType, Vec<BuildingId>> = HashMap::new();
        for building in by_type {
            buildings_by_type
                .entry(building.building_type)
                .or_default()
                .push(building.id);
        }
        data.buildings_by_type = buildings_by_type;

        for row in content.follower_abilities {
            let Some((ability_id, follower_type, flags)) = data
                .abilities
                .get(&row.ability_id)
                .map(|ability| (ability.id, ability.follower_type, ability.flags))
            else {
                continue;
            };
            if follower_type != FOLLOWER_TYPE_GARRISON {
                continue;
            }
            if flags.is_trait && !flags.cannot_roll {
                data.random_traits.insert(ability_id);
            }
            let Some(faction) = Faction::from_index(row.faction_index) else {
                continue;
            };
            let entry = data.follower_abilities[faction.index()]
                .entry(row.follower_id)
                .or_default();
            if flags.is_trait {
                entry.traits.insert(ability_id);
            } else {
                entry.counters.insert(ability_id);
            }
        }

        data.load_plot_finalize_info(world.plot_finalize);
        data.load_class_spec_abilities(world.class_spec_abilities);
        data
    }

    fn load_plot_finalize_info(&mut self, rows: Vec<PlotFinalizeRecord>) {
        for row in rows {
            if !self.plot_instances.contains_key(&row.plot_instance_id) {
                self.warn(format!(
                    "plot finalize info references unknown plot instance {}, skipped",
                    row.plot_instance_id
                ));
                continue;
            }
            let mut valid = true;
            for decoration in [&row.horde, &row.alliance] {
                let kind = self
                    .game_objects
                    .get(&decoration.game_object)
                    .map(|object| object.kind);
                match kind {
                    None => {
                        self.warn(format!(
                            "plot finalize info for plot instance {} references unknown game object {}, skipped",
                            row.plot_instance_id, decoration.game_object
                        ));
                        valid = false;
                    }
                    Some(kind) if kind != GameObjectKind::Goober => {
                        self.warn(format!(
                            "plot finalize info for plot instance {} uses game object {} which is not a goober, skipped",
                            row.plot_instance_id, decoration.game_object
                        ));
                        valid = false;
                    }
                    Some(_) => {}
                }
            }
            if valid {
                self.plot_finalize.insert(
                    row.plot_instance_id,
                    PerFaction {
                        horde: row.horde,
                        alliance: row.alliance,
                    },
                );
            }
        }
    }

    fn load_class_spec_abilities(&mut self, rows: Vec<ClassSpecAbilityRecord>) {
        for row in rows {
            if !self.class_specs.contains(&row.class_spec_id) {
                self.warn(format!(
                    "class spec ability row references unknown class spec {}, skipped",
                    row.class_spec_id
                ));
                continue;
            }
            if !self.abilities.contains_key(&row.ability_id) {
                self.warn(format!(
                    "class spec ability row references unknown ability {}, skipped",
                    row.ability_id
                ));
                continue;
            }
            self.class_spec_abilities
                .entry(row.class_spec_id)
                .or_default()
                .push(row.ability_id);
        }
        for abilities in self.class_spec_abilities.values_mut() {
            abilities.sort();
            abilities.dedup();
        }
    }

    fn warn(&mut self, message: String) {
        logging::log_error(&format!("garrison static data: {}", message));
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn summary(&self) -> StaticDataSummary {
        StaticDataSummary {
            site_levels: self.site_levels.len(),
            plot_instances: self.plot_instances.len(),
            buildings: self.buildings.len(),
            followers: self.followers.len(),
            abilities: self.abilities.len(),
            random_traits: self.random_traits.len(),
            class_spec_pools: self.class_spec_abilities.len(),
            finalize_entries: self.plot_finalize.len(),
            warnings: self.warnings.len(),
        }
    }

    pub fn site_level(&self, site_id: SiteId, level: u8) -> Option<&SiteLevelRecord> {
        self.site_levels
            .values()
            .find(|record| record.site_id == site_id && record.level == level)
    }

    pub fn site_level_by_id(&self, id: SiteLevelId) -> Option<&SiteLevelRecord> {
        self.site_levels.get(&id)
    }

    pub fn plot_instances_for_site_level(&self, site_level_id: SiteLevelId) -> &[PlotInstanceId] {
        self.plot_inst_by_site_level
            .get(&site_level_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn plot_game_object(
        &self,
        map_id: MapId,
        plot_instance_id: PlotInstanceId,
    ) -> Option<&PlotPlaceholder> {
        self.plot_placeholders.get(&map_id)?.get(&plot_instance_id)
    }

    pub fn is_plot_matching_building(&self, plot_id: PlotId, building_id: BuildingId) -> bool {
        self.buildings_by_plot
            .get(&plot_id)
            .map_or(false, |buildings| buildings.contains(&building_id))
    }

    pub fn previous_level_building_id(
        &self,
        building_type: BuildingType,
        current_level: u8,
    ) -> Option<BuildingId> {
        let target = current_level.checked_sub(1)?;
        self.buildings_by_type
            .get(&building_type)?
            .iter()
            .copied()
            .find(|id| {
                self.buildings
                    .get(id)
                    .map_or(false, |building| building.upgrade_level == target)
            })
    }

    pub fn plot_finalize_info(
        &self,
        plot_instance_id: PlotInstanceId,
    ) -> Option<&PerFaction<FinalizeDecoration>> {
        self.plot_finalize.get(&plot_instance_id)
    }

    pub fn follower_abilities(
        &self,
        faction: Faction,
        follower_id: FollowerTemplateId,
    ) -> Option<&FollowerAbilities> {
        self.follower_abilities[faction.index()].get(&follower_id)
    }

    pub fn random_traits(&self) -> &BTreeSet<AbilityId> {
        &self.random_traits
    }

    /// Class-spec ability pool for the follower's faction-specific class spec, sorted by id.
    pub fn class_spec_abilities(&self, follower: &FollowerRecord, faction: Faction) -> &[AbilityId] {
        let class_spec = follower.class_specs.get(faction);
        if !self.class_specs.contains(&class_spec) {
            return &[];
        }
        self.class_spec_abilities
            .get(&class_spec)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn building(&self, id: BuildingId) -> Option<&BuildingRecord> {
        self.buildings.get(&id)
    }

    pub fn plot(&self, id: PlotId) -> Option<&PlotRecord> {
        self.plots.get(&id)
    }

    pub fn plot_instance(&self, id: PlotInstanceId) -> Option<&PlotInstanceRecord> {
        self.plot_instances.get(&id)
    }

    pub fn follower(&self, id: FollowerTemplateId) -> Option<&FollowerRecord> {
        self.followers.get(&id)
    }

    pub fn ability(&self, id: AbilityId) -> Option<&AbilityRecord> {
        self.abilities.get(&id)
    }

    pub fn game_object(&self, id: GameObjectTemplateId) -> Option<&GameObjectRecord> {
        self.game_objects.get(&id)
    }
}
