use crate::content::records::SiteLevelRecord;
use crate::content::{
    BuildingId, Faction, FollowerDbId, FollowerTemplateId, OwnerId, PlotInstanceId, SiteId, GOLD,
};
use crate::garrison::errors::{GarrisonError, GarrisonResult};
use crate::garrison::follower::Follower;
use crate::garrison::ids::FollowerIdAllocator;
use crate::garrison::packets::{
    BuildingInfo, BuildingLandmark, GarrisonPacket, GarrisonReporter, GarrisonSnapshot,
};
use crate::garrison::plot::{Building, Plot};
use crate::garrison::roller::{FollowerAbilityRoller, MAX_FOLLOWER_QUALITY};
use crate::garrison::static_data::GarrisonStaticData;
use crate::persistence::rows::Transaction;
use crate::player::economy::PlayerEconomy;
use crate::telemetry::logging;
use crate::world::sim::{CriteriaType, MapHandle, WorldSim};
use rand::RngCore;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

/// Collaborators lent to a garrison for the duration of one request.
pub struct GarrisonContext<'a> {
    pub world: &'a mut dyn WorldSim,
    pub economy: &'a mut dyn PlayerEconomy,
    pub reporter: &'a mut dyn GarrisonReporter,
    pub ids: &'a FollowerIdAllocator,
    pub rng: &'a mut dyn RngCore,
    pub now: u64,
}

/// Validated building placement, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementPlan {
    pub plot_instance_id: PlotInstanceId,
    pub building_id: BuildingId,
    /// Building currently on the plot when it is replaced by another type.
    pub replaced: Option<BuildingId>,
    pub currency_type: u32,
    pub currency_qty: u32,
    pub gold_copper: u64,
}

/// Validated construction cancel, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPlan {
    pub plot_instance_id: PlotInstanceId,
    pub building_id: BuildingId,
    pub refund_currency_type: u32,
    pub refund_currency_qty: u32,
    pub refund_gold_copper: u64,
    /// Previous level restored in place when an upgrade is canceled.
    pub restore: Option<BuildingId>,
}

/// Per-player garrison: plots, followers, blueprints and the daily activation counter.
pub struct Garrison {
    pub(super) data: Arc<GarrisonStaticData>,
    pub(super) owner: OwnerId,
    pub(super) faction: Faction,
    pub(super) strict_unlearn: bool,
    pub(super) site_level: Option<SiteLevelRecord>,
    pub(super) plots: BTreeMap<PlotInstanceId, Plot>,
    pub(super) followers: BTreeMap<FollowerDbId, Follower>,
    pub(super) follower_ids: HashSet<FollowerTemplateId>,
    pub(super) known_buildings: BTreeSet<BuildingId>,
    pub(super) follower_activations_remaining: u32,
}

impl Garrison {
    pub fn new(data: Arc<GarrisonStaticData>, owner: OwnerId, faction: Faction) -> Self {
        Self {
            data,
            owner,
            faction,
            strict_unlearn: false,
            site_level: None,
            plots: BTreeMap::new(),
            followers: BTreeMap::new(),
            follower_ids: HashSet::new(),
            known_buildings: BTreeSet::new(),
            follower_activations_remaining: 1,
        }
    }

    pub fn with_strict_unlearn(mut self, strict: bool) -> Self {
        self.strict_unlearn = strict;
        self
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn faction(&self) -> Faction {
        self.faction
    }

    pub fn site_level(&self) -> Option<&SiteLevelRecord> {
        self.site_level.as_ref()
    }

    pub fn plots(&self) -> impl Iterator<Item = &Plot> {
        self.plots.values()
    }

    pub fn plot(&self, plot_instance_id: PlotInstanceId) -> Option<&Plot> {
        self.plots.get(&plot_instance_id)
    }

    pub fn followers(&self) -> impl Iterator<Item = &Follower> {
        self.followers.values()
    }

    pub fn follower(&self, db_id: FollowerDbId) -> Option<&Follower> {
        self.followers.get(&db_id)
    }

    pub fn count_followers(&self, predicate: impl Fn(&Follower) -> bool) -> usize {
        self.followers.values().filter(|follower| predicate(follower)).count()
    }

    pub fn known_buildings(&self) -> &BTreeSet<BuildingId> {
        &self.known_buildings
    }

    pub fn has_blueprint(&self, building_id: BuildingId) -> bool {
        self.known_buildings.contains(&building_id)
    }

    pub fn follower_activations_remaining(&self) -> u32 {
        self.follower_activations_remaining
    }

    /// Lays out level one of the site. A garrison is created once; later calls fail
    /// without touching plots or spawns.
    pub fn create(&mut self, site_id: SiteId, ctx: &mut GarrisonContext<'_>) -> GarrisonResult {
        let site_level = match (&self.site_level, self.data.site_level(site_id, 1)) {
            (Some(_), _) => Err(GarrisonError::GarrisonExists),
            (None, Some(site_level)) => Ok(site_level.clone()),
            (None, None) => Err(GarrisonError::InvalidSite),
        };
        let site_level = match site_level {
            Ok(site_level) => site_level,
            Err(err) => {
                ctx.reporter.send(
                    self.owner,
                    GarrisonPacket::CreateResult {
                        result: Err(err),
                        site_level_id: None,
                    },
                );
                return Err(err);
            }
        };
        let site_level_id = site_level.id;
        self.site_level = Some(site_level);
        self.follower_activations_remaining = 1;
        self.initialize_plots();
        ctx.reporter.send(
            self.owner,
            GarrisonPacket::CreateResult {
                result: Ok(()),
                site_level_id: Some(site_level_id),
            },
        );
        logging::log_garrison(&format!(
            "owner {} created garrison on site {} (level {})",
            self.owner, site_id, site_level_id
        ));
        self.send_remote_info(ctx.reporter);
        Ok(())
    }

    /// Queues removal of every stored row of this garrison.
    pub fn delete(
        &mut self,
        tx: &mut Transaction,
        reporter: &mut dyn GarrisonReporter,
    ) -> GarrisonResult {
        let Some(site_id) = self.site_level.as_ref().map(|site_level| site_level.site_id) else {
            reporter.send(
                self.owner,
                GarrisonPacket::DeleteResult {
                    result: Err(GarrisonError::InvalidSite),
                    site_id: SiteId::default(),
                },
            );
            return Err(GarrisonError::InvalidSite);
        };
        Self::delete_from_db(self.owner, tx);
        reporter.send(
            self.owner,
            GarrisonPacket::DeleteResult {
                result: Ok(()),
                site_id,
            },
        );
        logging::log_garrison(&format!("owner {} deleted garrison on site {}", self.owner, site_id));
        Ok(())
    }

    pub(super) fn initialize_plots(&mut self) {
        self.plots.clear();
        let Some(site_level) = &self.site_level else {
            return;
        };
        for plot_instance_id in self.data.plot_instances_for_site_level(site_level.id) {
            let Some(instance) = self.data.plot_instance(*plot_instance_id) else {
                logging::log_error(&format!(
                    "garrison site level {} lists unknown plot instance {}",
                    site_level.id, plot_instance_id
                ));
                continue;
            };
            let Some(placeholder) = self
                .data
                .plot_game_object(site_level.map_id, *plot_instance_id)
            else {
                logging::log_error(&format!(
                    "garrison plot instance {} has no placeholder object on map {}",
                    plot_instance_id, site_level.map_id
                ));
                continue;
            };
            self.plots.insert(
                *plot_instance_id,
                Plot::new(
                    *plot_instance_id,
                    instance.plot_id,
                    placeholder.game_object,
                    placeholder.position,
                ),
            );
        }
    }

    pub fn check_building_placement(
        &self,
        plot_instance_id: PlotInstanceId,
        building_id: BuildingId,
        economy: &dyn PlayerEconomy,
    ) -> GarrisonResult<PlacementPlan> {
        let plot = self
            .plots
            .get(&plot_instance_id)
            .ok_or(GarrisonError::InvalidPlotInstance)?;
        let building = self
            .data
            .building(building_id)
            .ok_or(GarrisonError::InvalidBuilding)?;
        if !self.data.is_plot_matching_building(plot.plot_id, building_id) {
            return Err(GarrisonError::InvalidPlotBuilding);
        }
        let max_level = self
            .site_level
            .as_ref()
            .map_or(0, |site_level| site_level.max_building_level);
        if building.upgrade_level > max_level {
            return Err(GarrisonError::UpgradeLevelExceedsGarrisonLevel);
        }
        if !building.needs_plan {
            return Err(GarrisonError::NotPlaceable);
        }
        if !self.has_blueprint(building_id) {
            return Err(GarrisonError::RequiresBlueprint);
        }

        // A type may only appear again as the next level on the plot it already occupies.
        for other in self.plots.values() {
            let Some(existing) = other
                .building
                .and_then(|existing| self.data.building(existing.id))
            else {
                continue;
            };
            if existing.building_type == building.building_type
                && (other.instance_id != plot_instance_id
                    || existing.upgrade_level + 1 != building.upgrade_level)
            {
                return Err(GarrisonError::BuildingExists);
            }
        }

        if !economy.has_currency(building.currency_type, building.currency_qty) {
            return Err(GarrisonError::NotEnoughCurrency);
        }
        let gold_copper = u64::from(building.gold_cost) * GOLD;
        if !economy.has_enough_money(gold_copper) {
            return Err(GarrisonError::NotEnoughGold);
        }
        if plot.building.map_or(false, |current| !current.active) {
            return Err(GarrisonError::UnderConstruction);
        }

        let replaced = plot.building.and_then(|current| {
            let same_type = self
                .data
                .building(current.id)
                .map_or(false, |record| record.building_type == building.building_type);
            (!same_type).then_some(current.id)
        });
        Ok(PlacementPlan {
            plot_instance_id,
            building_id,
            replaced,
            currency_type: building.currency_type,
            currency_qty: building.currency_qty,
            gold_copper,
        })
    }

    pub fn place_building(
        &mut self,
        plot_instance_id: PlotInstanceId,
        building_id: BuildingId,
        ctx: &mut GarrisonContext<'_>,
    ) -> GarrisonResult {
        match self.check_building_placement(plot_instance_id, building_id, &*ctx.economy) {
            Ok(plan) => {
                self.apply_building_placement(plan, ctx);
                Ok(())
            }
            Err(err) => {
                ctx.reporter.send(
                    self.owner,
                    GarrisonPacket::PlaceBuildingResult {
                        result: Err(err),
                        building: None,
                        play_activation_cinematic: false,
                    },
                );
                Err(err)
            }
        }
    }

    pub fn apply_building_placement(&mut self, plan: PlacementPlan, ctx: &mut GarrisonContext<'_>) {
        let owner = self.owner;
        let map = ctx.world.find_map(owner);
        let Some(plot) = self.plots.get_mut(&plan.plot_instance_id) else {
            return;
        };
        despawn_plot(plot, map, ctx.world);
        if plan.replaced.is_some() {
            plot.clear_building();
            ctx.reporter
                .send(owner, GarrisonPacket::PlotPlaced { plot: plot.info() });
        }
        let was_empty = plot.set_building(Building::under_construction(plan.building_id, ctx.now));
        if was_empty {
            ctx.reporter.send(
                owner,
                GarrisonPacket::PlotRemoved {
                    plot_instance_id: plan.plot_instance_id,
                },
            );
        }
        if let Some(map) = map {
            plot.spawn(map, ctx.world, &self.data, self.faction, ctx.now);
        }
        let building = plot.building_info();

        ctx.economy.remove_currency(plan.currency_type, plan.currency_qty);
        ctx.economy.modify_money(-copper_delta(plan.gold_copper));

        if let Some(replaced) = plan.replaced {
            ctx.reporter.send(
                owner,
                GarrisonPacket::BuildingRemoved {
                    result: Ok(()),
                    plot_instance_id: plan.plot_instance_id,
                    building_id: replaced,
                },
            );
        }
        ctx.world.update_criteria(
            owner,
            CriteriaType::PlaceGarrisonBuilding,
            u64::from(plan.building_id.0),
        );
        ctx.reporter.send(
            owner,
            GarrisonPacket::PlaceBuildingResult {
                result: Ok(()),
                building,
                play_activation_cinematic: false,
            },
        );
        logging::log_garrison(&format!(
            "owner {} placed building {} on plot {}",
            owner, plan.building_id, plan.plot_instance_id
        ));
    }

    pub fn check_building_removal(
        &self,
        plot_instance_id: PlotInstanceId,
        now: u64,
    ) -> GarrisonResult<RemovalPlan> {
        let plot = self
            .plots
            .get(&plot_instance_id)
            .ok_or(GarrisonError::InvalidPlotInstance)?;
        let building = plot.building.ok_or(GarrisonError::NoBuilding)?;
        let record = self
            .data
            .building(building.id)
            .ok_or(GarrisonError::NoBuilding)?;
        if building.active || building.can_activate(record, now) {
            return Err(GarrisonError::ConstructionComplete);
        }
        let restore = if record.upgrade_level > 1 {
            let previous = self
                .data
                .previous_level_building_id(record.building_type, record.upgrade_level);
            if previous.is_none() {
                logging::log_error(&format!(
                    "garrison building {} has no previous level to restore",
                    record.id
                ));
            }
            previous
        } else {
            None
        };
        Ok(RemovalPlan {
            plot_instance_id,
            building_id: building.id,
            refund_currency_type: record.currency_type,
            refund_currency_qty: record.currency_qty,
            refund_gold_copper: u64::from(record.gold_cost) * GOLD,
            restore,
        })
    }

    pub fn cancel_building_construction(
        &mut self,
        plot_instance_id: PlotInstanceId,
        ctx: &mut GarrisonContext<'_>,
    ) -> GarrisonResult {
        match self.check_building_removal(plot_instance_id, ctx.now) {
            Ok(plan) => {
                self.apply_building_removal(plan, ctx);
                Ok(())
            }
            Err(err) => {
                ctx.reporter.send(
                    self.owner,
                    GarrisonPacket::BuildingRemoved {
                        result: Err(err),
                        plot_instance_id,
                        building_id: BuildingId::default(),
                    },
                );
                Err(err)
            }
        }
    }

    pub fn apply_building_removal(&mut self, plan: RemovalPlan, ctx: &mut GarrisonContext<'_>) {
        let owner = self.owner;
        let map = ctx.world.find_map(owner);
        let Some(plot) = self.plots.get_mut(&plan.plot_instance_id) else {
            return;
        };
        despawn_plot(plot, map, ctx.world);
        plot.clear_building();
        ctx.reporter
            .send(owner, GarrisonPacket::PlotPlaced { plot: plot.info() });
        ctx.reporter.send(
            owner,
            GarrisonPacket::BuildingRemoved {
                result: Ok(()),
                plot_instance_id: plan.plot_instance_id,
                building_id: plan.building_id,
            },
        );

        ctx.economy
            .add_currency(plan.refund_currency_type, plan.refund_currency_qty);
        ctx.economy.modify_money(copper_delta(plan.refund_gold_copper));

        if let Some(restore) = plan.restore {
            plot.set_building(Building {
                id: restore,
                time_built: ctx.now,
                active: true,
            });
            ctx.reporter.send(
                owner,
                GarrisonPacket::PlotRemoved {
                    plot_instance_id: plan.plot_instance_id,
                },
            );
            ctx.reporter.send(
                owner,
                GarrisonPacket::PlaceBuildingResult {
                    result: Ok(()),
                    building: plot.building_info(),
                    play_activation_cinematic: false,
                },
            );
        }
        if let Some(map) = map {
            plot.spawn(map, ctx.world, &self.data, self.faction, ctx.now);
        }
        logging::log_garrison(&format!(
            "owner {} canceled building {} on plot {}",
            owner, plan.building_id, plan.plot_instance_id
        ));
    }

    pub fn check_building_activation(
        &self,
        plot_instance_id: PlotInstanceId,
        now: u64,
    ) -> GarrisonResult<BuildingId> {
        let plot = self
            .plots
            .get(&plot_instance_id)
            .ok_or(GarrisonError::InvalidPlotInstance)?;
        let building = plot.building.ok_or(GarrisonError::NoBuilding)?;
        let record = self
            .data
            .building(building.id)
            .ok_or(GarrisonError::NoBuilding)?;
        if building.active {
            return Err(GarrisonError::BuildingAlreadyActive);
        }
        if !building.can_activate(record, now) {
            return Err(GarrisonError::BuildingNotReady);
        }
        Ok(building.id)
    }

    /// Finishes construction. A failed check sends nothing.
    pub fn activate_building(
        &mut self,
        plot_instance_id: PlotInstanceId,
        ctx: &mut GarrisonContext<'_>,
    ) -> GarrisonResult {
        let building_id = self.check_building_activation(plot_instance_id, ctx.now)?;
        let owner = self.owner;
        let map = ctx.world.find_map(owner);
        let Some(plot) = self.plots.get_mut(&plot_instance_id) else {
            return Err(GarrisonError::InvalidPlotInstance);
        };
        if let Some(building) = plot.building.as_mut() {
            building.active = true;
        }
        despawn_plot(plot, map, ctx.world);
        if let Some(map) = map {
            plot.spawn(map, ctx.world, &self.data, self.faction, ctx.now);
        }
        ctx.reporter
            .send(owner, GarrisonPacket::BuildingActivated { plot_instance_id });
        ctx.world.update_criteria(
            owner,
            CriteriaType::ActivateGarrisonBuilding,
            u64::from(building_id.0),
        );
        logging::log_garrison(&format!(
            "owner {} activated building {} on plot {}",
            owner, building_id, plot_instance_id
        ));
        Ok(())
    }

    pub fn learn_blueprint(
        &mut self,
        building_id: BuildingId,
        reporter: &mut dyn GarrisonReporter,
    ) -> GarrisonResult {
        let result = if self.data.building(building_id).is_none() {
            Err(GarrisonError::InvalidBuilding)
        } else if self.has_blueprint(building_id) {
            Err(GarrisonError::BlueprintExists)
        } else {
            self.known_buildings.insert(building_id);
            Ok(())
        };
        reporter.send(
            self.owner,
            GarrisonPacket::LearnBlueprintResult {
                result,
                building_id,
            },
        );
        result
    }

    /// Without strict mode this rejects blueprints the player knows and reports success
    /// for ones they don't, leaving the set unchanged either way. Existing clients rely on
    /// that answer; strict mode removes known blueprints instead.
    pub fn unlearn_blueprint(
        &mut self,
        building_id: BuildingId,
        reporter: &mut dyn GarrisonReporter,
    ) -> GarrisonResult {
        let result = if self.data.building(building_id).is_none() {
            Err(GarrisonError::InvalidBuilding)
        } else if self.strict_unlearn {
            if self.known_buildings.remove(&building_id) {
                Ok(())
            } else {
                Err(GarrisonError::RequiresBlueprint)
            }
        } else if self.has_blueprint(building_id) {
            Err(GarrisonError::RequiresBlueprint)
        } else {
            self.known_buildings.remove(&building_id);
            Ok(())
        };
        reporter.send(
            self.owner,
            GarrisonPacket::UnlearnBlueprintResult {
                result,
                building_id,
            },
        );
        result
    }

    pub fn add_follower(
        &mut self,
        template_id: FollowerTemplateId,
        ctx: &mut GarrisonContext<'_>,
    ) -> GarrisonResult<FollowerDbId> {
        let template = match self.data.follower(template_id) {
            Some(template) if !self.follower_ids.contains(&template_id) => template,
            _ => {
                ctx.reporter.send(
                    self.owner,
                    GarrisonPacket::AddFollowerResult {
                        result: Err(GarrisonError::FollowerExists),
                        follower: None,
                    },
                );
                return Err(GarrisonError::FollowerExists);
            }
        };

        let db_id = ctx.ids.generate();
        let mut follower = Follower::recruit(db_id, template);
        follower.abilities = FollowerAbilityRoller::new(&self.data).roll(
            template,
            follower.quality,
            self.faction,
            true,
            &mut *ctx.rng,
        );
        let info = follower.info();
        self.follower_ids.insert(template_id);
        self.followers.insert(db_id, follower);

        ctx.reporter.send(
            self.owner,
            GarrisonPacket::AddFollowerResult {
                result: Ok(()),
                follower: Some(info),
            },
        );
        ctx.world
            .update_criteria(self.owner, CriteriaType::RecruitGarrisonFollower, db_id.0);
        logging::log_garrison(&format!(
            "owner {} recruited follower {} as {}",
            self.owner, template_id, db_id
        ));
        Ok(db_id)
    }

    /// Sets a new quality and re-draws the rollable abilities for it.
    pub fn change_follower_quality(
        &mut self,
        db_id: FollowerDbId,
        quality: u8,
        ctx: &mut GarrisonContext<'_>,
    ) -> GarrisonResult {
        let template = self
            .followers
            .get(&db_id)
            .and_then(|follower| self.data.follower(follower.template_id));
        let (Some(template), Some(follower)) = (template, self.followers.get_mut(&db_id)) else {
            ctx.reporter.send(
                self.owner,
                GarrisonPacket::FollowerChangedQuality {
                    result: Err(GarrisonError::FollowerNotFound),
                    follower: None,
                },
            );
            return Err(GarrisonError::FollowerNotFound);
        };
        follower.quality = quality.min(MAX_FOLLOWER_QUALITY);
        follower.abilities = FollowerAbilityRoller::new(&self.data).roll(
            template,
            follower.quality,
            self.faction,
            false,
            &mut *ctx.rng,
        );
        ctx.reporter.send(
            self.owner,
            GarrisonPacket::FollowerChangedQuality {
                result: Ok(()),
                follower: Some(follower.info()),
            },
        );
        Ok(())
    }

    pub fn reset_follower_activation_limit(&mut self) {
        self.follower_activations_remaining = 1;
    }

    /// Shows every plot on the owner's map. Does nothing while the map is not loaded.
    pub fn spawn_plots(&mut self, world: &mut dyn WorldSim, now: u64) {
        let Some(map) = world.find_map(self.owner) else {
            return;
        };
        for plot in self.plots.values_mut() {
            plot.spawn(map, world, &self.data, self.faction, now);
        }
    }

    pub fn despawn_plots(&mut self, world: &mut dyn WorldSim) {
        let map = world.find_map(self.owner);
        for plot in self.plots.values_mut() {
            despawn_plot(plot, map, world);
        }
    }

    fn building_infos(&self) -> Vec<BuildingInfo> {
        self.plots.values().filter_map(Plot::building_info).collect()
    }

    pub fn send_info(&self, reporter: &mut dyn GarrisonReporter) {
        let Some(site_level) = &self.site_level else {
            return;
        };
        reporter.send(
            self.owner,
            GarrisonPacket::Info(GarrisonSnapshot {
                site_id: site_level.site_id,
                site_level_id: site_level.id,
                activations_remaining: self.follower_activations_remaining,
                plots: self.plots.values().map(Plot::info).collect(),
                buildings: self.building_infos(),
                followers: self.followers.values().map(Follower::info).collect(),
            }),
        );
    }

    pub fn send_remote_info(&self, reporter: &mut dyn GarrisonReporter) {
        let Some(site_level) = &self.site_level else {
            return;
        };
        reporter.send(
            self.owner,
            GarrisonPacket::RemoteInfo {
                site_level_id: site_level.id,
                buildings: self.building_infos(),
            },
        );
    }

    pub fn send_blueprint_data(&self, reporter: &mut dyn GarrisonReporter) {
        reporter.send(
            self.owner,
            GarrisonPacket::BlueprintData {
                blueprints: self.known_buildings.iter().copied().collect(),
            },
        );
    }

    pub fn send_building_landmarks(&self, reporter: &mut dyn GarrisonReporter) {
        let landmarks = self
            .plots
            .values()
            .filter(|plot| plot.building.is_some())
            .map(|plot| BuildingLandmark {
                game_object: plot.representation(&self.data, self.faction),
                position: plot.position,
            })
            .collect();
        reporter.send(self.owner, GarrisonPacket::BuildingLandmarks { landmarks });
    }

    pub fn send_map_data(&self, reporter: &mut dyn GarrisonReporter) {
        reporter.send(
            self.owner,
            GarrisonPacket::MapData {
                plots: self.plots.values().map(Plot::info).collect(),
            },
        );
    }
}

fn despawn_plot(plot: &mut Plot, map: Option<MapHandle>, world: &mut dyn WorldSim) {
    match map {
        Some(map) => plot.despawn(map, world),
        None => plot.forget_spawns(),
    }
}

fn copper_delta(copper: u64) -> i64 {
    i64::try_from(copper).unwrap_or(i64::MAX)
}
