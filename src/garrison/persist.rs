use crate::content::{Faction, OwnerId, GARRISON_TYPE_GARRISON};
use crate::garrison::aggregate::Garrison;
use crate::garrison::follower::Follower;
use crate::garrison::plot::Building;
use crate::garrison::static_data::GarrisonStaticData;
use crate::persistence::rows::{
    BlueprintRow, BuildingRow, FollowerAbilityRow, FollowerRow, GarrisonRow, RowSet, Statement,
    Transaction,
};
use crate::telemetry::logging;
use std::sync::Arc;

impl Garrison {
    /// Rebuilds a garrison from its stored rows. Rows referring to content that no longer
    /// exists are logged and dropped; stored abilities are kept as they are.
    pub fn load_from_db(
        data: Arc<GarrisonStaticData>,
        owner: OwnerId,
        faction: Faction,
        rows: &RowSet,
    ) -> Option<Self> {
        let row = rows.garrison.as_ref()?;
        let Some(site_level) = data.site_level_by_id(row.site_level_id).cloned() else {
            logging::log_error(&format!(
                "garrison of owner {} references unknown site level {}, not loaded",
                owner, row.site_level_id
            ));
            return None;
        };

        let mut garrison = Garrison::new(data, owner, faction);
        garrison.site_level = Some(site_level);
        garrison.follower_activations_remaining = row.follower_activations_remaining;
        garrison.initialize_plots();

        for blueprint in &rows.blueprints {
            if garrison.data.building(blueprint.building_id).is_none() {
                logging::log_error(&format!(
                    "garrison of owner {} knows unknown building {}, dropped",
                    owner, blueprint.building_id
                ));
                continue;
            }
            garrison.known_buildings.insert(blueprint.building_id);
        }

        for building in &rows.buildings {
            let known = garrison.data.building(building.building_id).is_some();
            let Some(plot) = garrison
                .plots
                .get_mut(&building.plot_instance_id)
                .filter(|_| known)
            else {
                logging::log_error(&format!(
                    "garrison of owner {} has building {} on invalid plot {}, dropped",
                    owner, building.building_id, building.plot_instance_id
                ));
                continue;
            };
            plot.set_building(Building {
                id: building.building_id,
                time_built: building.time_built,
                active: building.active,
            });
        }

        for follower in &rows.followers {
            if garrison.data.follower(follower.template_id).is_none() {
                logging::log_error(&format!(
                    "garrison of owner {} has follower {} of unknown template {}, dropped",
                    owner, follower.db_id, follower.template_id
                ));
                continue;
            }
            let mut abilities = Vec::new();
            for row in rows.abilities_of(follower.db_id) {
                if garrison.data.ability(row.ability_id).is_none() {
                    logging::log_error(&format!(
                        "garrison of owner {} has follower {} with unknown ability {}, dropped",
                        owner, follower.db_id, row.ability_id
                    ));
                    continue;
                }
                abilities.push(row.ability_id);
            }
            garrison.follower_ids.insert(follower.template_id);
            garrison.followers.insert(
                follower.db_id,
                Follower {
                    db_id: follower.db_id,
                    template_id: follower.template_id,
                    quality: follower.quality,
                    level: follower.level,
                    item_level_weapon: follower.item_level_weapon,
                    item_level_armor: follower.item_level_armor,
                    xp: follower.xp,
                    current_building_id: follower.current_building_id,
                    current_mission_id: follower.current_mission_id,
                    status: follower.status,
                    abilities,
                },
            );
        }
        Some(garrison)
    }

    /// Replaces every stored row of this garrison with its current state.
    pub fn save_to_db(&self, tx: &mut Transaction) {
        Self::delete_from_db(self.owner, tx);
        let Some(site_level) = &self.site_level else {
            return;
        };
        let owner = self.owner;
        tx.push(Statement::InsertGarrison(GarrisonRow {
            owner,
            garrison_type: GARRISON_TYPE_GARRISON,
            site_level_id: site_level.id,
            follower_activations_remaining: self.follower_activations_remaining,
        }));
        for building_id in &self.known_buildings {
            tx.push(Statement::InsertBlueprint(BlueprintRow {
                owner,
                garrison_type: GARRISON_TYPE_GARRISON,
                building_id: *building_id,
            }));
        }
        for info in self.plots.values().filter_map(|plot| plot.building_info()) {
            tx.push(Statement::InsertBuilding(BuildingRow {
                owner,
                garrison_type: GARRISON_TYPE_GARRISON,
                plot_instance_id: info.plot_instance_id,
                building_id: info.building_id,
                time_built: info.time_built,
                active: info.active,
            }));
        }
        for follower in self.followers.values() {
            tx.push(Statement::InsertFollower(FollowerRow {
                db_id: follower.db_id,
                owner,
                garrison_type: GARRISON_TYPE_GARRISON,
                template_id: follower.template_id,
                quality: follower.quality,
                level: follower.level,
                item_level_weapon: follower.item_level_weapon,
                item_level_armor: follower.item_level_armor,
                xp: follower.xp,
                current_building_id: follower.current_building_id,
                current_mission_id: follower.current_mission_id,
                status: follower.status,
            }));
            for (slot, ability_id) in follower.abilities.iter().enumerate() {
                tx.push(Statement::InsertFollowerAbility {
                    owner,
                    row: FollowerAbilityRow {
                        follower_db_id: follower.db_id,
                        ability_id: *ability_id,
                        slot: u8::try_from(slot).unwrap_or(u8::MAX),
                    },
                });
            }
        }
    }

    pub fn delete_from_db(owner: OwnerId, tx: &mut Transaction) {
        tx.push(Statement::DeleteGarrison { owner });
        tx.push(Statement::DeleteBlueprints { owner });
        tx.push(Statement::DeleteBuildings { owner });
        tx.push(Statement::DeleteFollowerAbilities { owner });
        tx.push(Statement::DeleteFollowers { owner });
    }
}
