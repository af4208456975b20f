use crate::content::records::{
    AbilityFlags, AbilityRecord, AncillaryKind, AncillarySpawn, BuildingRecord,
    ClassSpecAbilityRecord, ClassSpecRecord, FinalizeDecoration, FollowerAbilityRecord,
    FollowerRecord, GameObjectKind, GameObjectRecord, PlotBuildingRecord, PlotFinalizeRecord,
    PlotInstanceRecord, PlotPlaceholderRecord, PlotRecord, SiteLevelPlotRecord, SiteLevelRecord,
};
use crate::content::tables::{ContentTables, WorldTables};
use crate::content::{
    AbilityId, BuildingId, BuildingType, ClassSpecId, FollowerTemplateId, GameObjectTemplateId,
    MapId, OwnerId, PerFaction, PlotId, PlotInstanceId, SiteId, SiteLevelId,
    FOLLOWER_TYPE_GARRISON,
};
use crate::garrison::aggregate::GarrisonContext;
use crate::garrison::ids::FollowerIdAllocator;
use crate::garrison::packets::{GarrisonPacket, GarrisonReporter};
use crate::garrison::static_data::GarrisonStaticData;
use crate::player::economy::Wallet;
use crate::world::position::{Position, PositionDelta};
use crate::world::sim::{CriteriaType, MapHandle, ObjectHandle, SpawnRequest, WorldSim};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const OWNER: OwnerId = OwnerId(4242);

pub const SITE: SiteId = SiteId(2);
pub const SITE_LEVEL_1: SiteLevelId = SiteLevelId(5);
pub const SITE_LEVEL_2: SiteLevelId = SiteLevelId(258);
pub const MAP: MapId = MapId(1152);

pub const SMALL_PLOT: PlotId = PlotId(1);
pub const LARGE_PLOT: PlotId = PlotId(3);
pub const PLOT_A: PlotInstanceId = PlotInstanceId(18);
pub const PLOT_B: PlotInstanceId = PlotInstanceId(19);
pub const PLOT_C: PlotInstanceId = PlotInstanceId(20);
pub const PLOT_D: PlotInstanceId = PlotInstanceId(22);

pub const PLACEHOLDER_OBJECT: GameObjectTemplateId = GameObjectTemplateId(233083);
pub const CONSTRUCT_HORDE: GameObjectTemplateId = GameObjectTemplateId(233248);
pub const CONSTRUCT_ALLIANCE: GameObjectTemplateId = GameObjectTemplateId(233249);
pub const FINALIZE_HORDE: GameObjectTemplateId = GameObjectTemplateId(233250);
pub const FINALIZE_ALLIANCE: GameObjectTemplateId = GameObjectTemplateId(233251);
pub const FINALIZE_ANIM_KIT: u16 = 1696;

pub const BARN_TYPE: BuildingType = BuildingType(24);
pub const BARN_1: BuildingId = BuildingId(24);
pub const BARN_2: BuildingId = BuildingId(25);
pub const BARN_3: BuildingId = BuildingId(133);
pub const BARN_1_HORDE: GameObjectTemplateId = GameObjectTemplateId(7001);
pub const BARN_2_HORDE: GameObjectTemplateId = GameObjectTemplateId(7003);
pub const BARN_CURRENCY: u32 = 824;
pub const BARN_STABLEHAND: u32 = 3000;
pub const BARN_TROUGH: u32 = 3001;

pub const TOWER_TYPE: BuildingType = BuildingType(9);
pub const TOWER_1: BuildingId = BuildingId(9);
pub const TOWER_1_HORDE: GameObjectTemplateId = GameObjectTemplateId(7011);

pub const QUEST_BUILDING: BuildingId = BuildingId(65);

pub const CLASS_SPEC: ClassSpecId = ClassSpecId(53);

pub const COUNTER_FORCED: AbilityId = AbilityId(100);
pub const COUNTER_ROLL: [AbilityId; 3] = [AbilityId(101), AbilityId(102), AbilityId(103)];
pub const COUNTER_SPEC: [AbilityId; 4] =
    [AbilityId(110), AbilityId(111), AbilityId(112), AbilityId(113)];
pub const COUNTER_HORDE_ONLY: AbilityId = AbilityId(120);
pub const TRAIT_FORCED_EXCLUSIVE: AbilityId = AbilityId(200);
pub const TRAIT_PLAIN: [AbilityId; 6] = [
    AbilityId(201),
    AbilityId(202),
    AbilityId(203),
    AbilityId(204),
    AbilityId(205),
    AbilityId(206),
];
pub const TRAIT_EXCLUSIVE: [AbilityId; 3] = [AbilityId(210), AbilityId(211), AbilityId(212)];
pub const TRAIT_NO_ROLL: AbilityId = AbilityId(220);

pub const FOLLOWER_PLAIN: FollowerTemplateId = FollowerTemplateId(34);
pub const FOLLOWER_FORCED: FollowerTemplateId = FollowerTemplateId(153);
pub const FOLLOWER_ROLLABLE: FollowerTemplateId = FollowerTemplateId(180);

/// Follower id used only to feed abilities into the global trait pool.
const POOL_ONLY_FOLLOWER: FollowerTemplateId = FollowerTemplateId(0);

pub fn plot_position(plot: PlotInstanceId) -> Position {
    let step = plot.0 as f32;
    Position::new(5600.0 + step * 10.0, 4500.0 - step * 5.0, 130.0, 1.5)
}

pub fn finalize_decoration() -> FinalizeDecoration {
    FinalizeDecoration {
        game_object: FINALIZE_HORDE,
        position: Position::new(5790.0, 4410.0, 132.0, 0.0),
        anim_kit: FINALIZE_ANIM_KIT,
    }
}

fn flags(names: &[&str]) -> AbilityFlags {
    let list: Vec<String> = names.iter().map(|name| name.to_string()).collect();
    AbilityFlags::from_list(&list)
}

fn ability(id: AbilityId, names: &[&str]) -> AbilityRecord {
    AbilityRecord {
        id,
        follower_type: FOLLOWER_TYPE_GARRISON,
        name: format!("ability {}", id),
        flags: flags(names),
    }
}

fn ability_row(follower_id: FollowerTemplateId, ability_id: AbilityId, faction_index: u8) -> FollowerAbilityRecord {
    FollowerAbilityRecord {
        follower_id,
        ability_id,
        faction_index,
    }
}

fn follower(id: FollowerTemplateId, quality: u8, level: u8, item_level: u32) -> FollowerRecord {
    FollowerRecord {
        id,
        follower_type: FOLLOWER_TYPE_GARRISON,
        quality,
        level,
        item_level_weapon: item_level,
        item_level_armor: item_level + 15,
        class_specs: PerFaction {
            horde: CLASS_SPEC,
            alliance: CLASS_SPEC,
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn building(
    id: BuildingId,
    building_type: BuildingType,
    upgrade_level: u8,
    objects: (u32, u32),
    currency_qty: u32,
    gold_cost: u32,
    build_seconds: u64,
    needs_plan: bool,
) -> BuildingRecord {
    BuildingRecord {
        id,
        building_type,
        upgrade_level,
        name: format!("building {}", id),
        objects: PerFaction {
            horde: GameObjectTemplateId(objects.0),
            alliance: GameObjectTemplateId(objects.1),
        },
        currency_type: if currency_qty > 0 { BARN_CURRENCY } else { 0 },
        currency_qty,
        gold_cost,
        build_seconds,
        needs_plan,
    }
}

fn game_object(id: u32, kind: GameObjectKind) -> GameObjectRecord {
    GameObjectRecord {
        id: GameObjectTemplateId(id),
        kind,
        spawns: Vec::new(),
    }
}

/// Two-level site with three plots at level one (two small, one large) and a fourth small
/// plot at level two. Barns upgrade through three levels on small plots.
pub fn content_tables() -> ContentTables {
    let mut content = ContentTables::default();

    content.site_levels = vec![
        SiteLevelRecord {
            id: SITE_LEVEL_1,
            site_id: SITE,
            level: 1,
            map_id: MAP,
            max_building_level: 2,
        },
        SiteLevelRecord {
            id: SITE_LEVEL_2,
            site_id: SITE,
            level: 2,
            map_id: MAP,
            max_building_level: 3,
        },
    ];
    content.plots = vec![
        PlotRecord {
            id: SMALL_PLOT,
            name: "small".to_string(),
            construct_objects: PerFaction {
                horde: CONSTRUCT_HORDE,
                alliance: CONSTRUCT_ALLIANCE,
            },
        },
        PlotRecord {
            id: LARGE_PLOT,
            name: "large".to_string(),
            construct_objects: PerFaction::default(),
        },
    ];
    content.plot_instances = vec![
        PlotInstanceRecord {
            id: PLOT_A,
            plot_id: SMALL_PLOT,
        },
        PlotInstanceRecord {
            id: PLOT_B,
            plot_id: SMALL_PLOT,
        },
        PlotInstanceRecord {
            id: PLOT_C,
            plot_id: LARGE_PLOT,
        },
        PlotInstanceRecord {
            id: PLOT_D,
            plot_id: SMALL_PLOT,
        },
    ];
    for plot in [PLOT_A, PLOT_B, PLOT_C] {
        content.site_level_plots.push(SiteLevelPlotRecord {
            site_level_id: SITE_LEVEL_1,
            plot_instance_id: plot,
        });
    }
    for plot in [PLOT_A, PLOT_B, PLOT_C, PLOT_D] {
        content.site_level_plots.push(SiteLevelPlotRecord {
            site_level_id: SITE_LEVEL_2,
            plot_instance_id: plot,
        });
        content.plot_placeholders.push(PlotPlaceholderRecord {
            map_id: MAP,
            plot_instance_id: plot,
            game_object: PLACEHOLDER_OBJECT,
            position: plot_position(plot),
        });
    }
    for building_id in [BARN_1, BARN_2, BARN_3, QUEST_BUILDING] {
        content.plot_buildings.push(PlotBuildingRecord {
            plot_id: SMALL_PLOT,
            building_id,
        });
    }
    content.plot_buildings.push(PlotBuildingRecord {
        plot_id: LARGE_PLOT,
        building_id: TOWER_1,
    });

    content.buildings = vec![
        building(BARN_1, BARN_TYPE, 1, (7001, 7002), 100, 10, 3600, true),
        building(BARN_2, BARN_TYPE, 2, (7003, 7004), 150, 25, 7200, true),
        building(BARN_3, BARN_TYPE, 3, (7005, 7006), 300, 50, 14400, true),
        building(TOWER_1, TOWER_TYPE, 1, (7011, 7012), 0, 0, 0, true),
        building(QUEST_BUILDING, BuildingType(41), 1, (7021, 7022), 0, 0, 600, false),
    ];

    content.game_objects = vec![
        game_object(PLACEHOLDER_OBJECT.0, GameObjectKind::GarrisonPlot),
        game_object(CONSTRUCT_HORDE.0, GameObjectKind::Generic),
        game_object(CONSTRUCT_ALLIANCE.0, GameObjectKind::Generic),
        game_object(FINALIZE_HORDE.0, GameObjectKind::Goober),
        game_object(FINALIZE_ALLIANCE.0, GameObjectKind::Goober),
        GameObjectRecord {
            id: BARN_1_HORDE,
            kind: GameObjectKind::GarrisonBuilding,
            spawns: vec![
                AncillarySpawn {
                    kind: AncillaryKind::Creature,
                    template_id: BARN_STABLEHAND,
                    offset: PositionDelta {
                        dx: 2.0,
                        ..PositionDelta::default()
                    },
                },
                AncillarySpawn {
                    kind: AncillaryKind::GameObject,
                    template_id: BARN_TROUGH,
                    offset: PositionDelta {
                        dy: 1.0,
                        ..PositionDelta::default()
                    },
                },
            ],
        },
    ];
    for id in [7002, 7003, 7004, 7005, 7006, 7011, 7012, 7021, 7022] {
        content
            .game_objects
            .push(game_object(id, GameObjectKind::GarrisonBuilding));
    }

    content.followers = vec![
        follower(FOLLOWER_PLAIN, 3, 90, 600),
        follower(FOLLOWER_FORCED, 4, 100, 645),
        follower(FOLLOWER_ROLLABLE, 2, 95, 630),
    ];

    content.abilities.push(ability(COUNTER_FORCED, &["CannotRemove"]));
    for id in COUNTER_ROLL.iter().chain(COUNTER_SPEC.iter()) {
        content.abilities.push(ability(*id, &[]));
    }
    content.abilities.push(ability(COUNTER_HORDE_ONLY, &["HordeOnly"]));
    content.abilities.push(ability(
        TRAIT_FORCED_EXCLUSIVE,
        &["Trait", "CannotRemove", "Exclusive", "CannotRoll"],
    ));
    for id in TRAIT_PLAIN {
        content.abilities.push(ability(id, &["Trait"]));
    }
    for id in TRAIT_EXCLUSIVE {
        content.abilities.push(ability(id, &["Trait", "Exclusive"]));
    }
    content.abilities.push(ability(TRAIT_NO_ROLL, &["Trait", "CannotRoll"]));

    content.follower_abilities.push(ability_row(FOLLOWER_FORCED, COUNTER_FORCED, 0));
    content
        .follower_abilities
        .push(ability_row(FOLLOWER_FORCED, TRAIT_FORCED_EXCLUSIVE, 0));
    for faction_index in [0u8, 1] {
        for id in COUNTER_ROLL {
            content
                .follower_abilities
                .push(ability_row(FOLLOWER_ROLLABLE, id, faction_index));
        }
        for id in [TRAIT_PLAIN[0], TRAIT_PLAIN[1], TRAIT_EXCLUSIVE[0], TRAIT_EXCLUSIVE[1]] {
            content
                .follower_abilities
                .push(ability_row(FOLLOWER_ROLLABLE, id, faction_index));
        }
    }
    content
        .follower_abilities
        .push(ability_row(FOLLOWER_ROLLABLE, COUNTER_HORDE_ONLY, 1));
    for id in TRAIT_PLAIN.iter().chain(TRAIT_EXCLUSIVE.iter()) {
        content
            .follower_abilities
            .push(ability_row(POOL_ONLY_FOLLOWER, *id, 2));
    }
    content
        .follower_abilities
        .push(ability_row(POOL_ONLY_FOLLOWER, TRAIT_NO_ROLL, 2));

    content.class_specs = vec![ClassSpecRecord {
        id: CLASS_SPEC,
        name: "Arms".to_string(),
    }];
    content
}

pub fn world_tables() -> WorldTables {
    let mut class_spec_abilities: Vec<ClassSpecAbilityRecord> = COUNTER_SPEC
        .iter()
        .rev()
        .map(|ability_id| ClassSpecAbilityRecord {
            class_spec_id: CLASS_SPEC,
            ability_id: *ability_id,
        })
        .collect();
    class_spec_abilities.push(ClassSpecAbilityRecord {
        class_spec_id: CLASS_SPEC,
        ability_id: COUNTER_SPEC[0],
    });
    WorldTables {
        plot_finalize: vec![PlotFinalizeRecord {
            plot_instance_id: PLOT_A,
            horde: finalize_decoration(),
            alliance: FinalizeDecoration {
                game_object: FINALIZE_ALLIANCE,
                ..finalize_decoration()
            },
        }],
        class_spec_abilities,
    }
}

pub fn static_data() -> Arc<GarrisonStaticData> {
    Arc::new(GarrisonStaticData::initialize(content_tables(), world_tables()))
}

/// One follower template, one class-spec counter and one random trait.
pub fn sparse_static_data() -> Arc<GarrisonStaticData> {
    let content = ContentTables {
        followers: vec![follower(FOLLOWER_PLAIN, 3, 90, 600)],
        abilities: vec![
            ability(COUNTER_SPEC[0], &[]),
            ability(TRAIT_PLAIN[0], &["Trait"]),
        ],
        follower_abilities: vec![ability_row(POOL_ONLY_FOLLOWER, TRAIT_PLAIN[0], 2)],
        class_specs: vec![ClassSpecRecord {
            id: CLASS_SPEC,
            name: "Arms".to_string(),
        }],
        ..ContentTables::default()
    };
    let world = WorldTables {
        class_spec_abilities: vec![ClassSpecAbilityRecord {
            class_spec_id: CLASS_SPEC,
            ability_id: COUNTER_SPEC[0],
        }],
        ..WorldTables::default()
    };
    Arc::new(GarrisonStaticData::initialize(content, world))
}

/// World simulation double that remembers what is currently spawned.
#[derive(Debug, Default)]
pub struct RecordingWorld {
    pub map: Option<MapHandle>,
    next_handle: u64,
    pub live: BTreeMap<ObjectHandle, SpawnRequest>,
    pub despawned: Vec<ObjectHandle>,
    pub criteria: Vec<(CriteriaType, u64)>,
}

impl RecordingWorld {
    pub fn loaded() -> Self {
        Self {
            map: Some(MapHandle(1)),
            ..Self::default()
        }
    }

    pub fn unloaded() -> Self {
        Self::default()
    }

    pub fn live_templates(&self) -> Vec<u32> {
        let mut templates: Vec<u32> = self.live.values().map(|request| request.template_id).collect();
        templates.sort_unstable();
        templates
    }

    pub fn is_live(&self, template_id: u32) -> bool {
        self.live.values().any(|request| request.template_id == template_id)
    }
}

impl WorldSim for RecordingWorld {
    fn find_map(&self, _owner: OwnerId) -> Option<MapHandle> {
        self.map
    }

    fn spawn(&mut self, _map: MapHandle, request: &SpawnRequest) -> Option<ObjectHandle> {
        self.next_handle += 1;
        let handle = ObjectHandle(self.next_handle);
        self.live.insert(handle, request.clone());
        Some(handle)
    }

    fn despawn(&mut self, _map: MapHandle, handle: ObjectHandle) {
        self.live.remove(&handle);
        self.despawned.push(handle);
    }

    fn update_criteria(&mut self, _owner: OwnerId, criteria: CriteriaType, asset: u64) {
        self.criteria.push((criteria, asset));
    }
}

#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub packets: Vec<(OwnerId, GarrisonPacket)>,
}

impl RecordingReporter {
    pub fn take(&mut self) -> Vec<GarrisonPacket> {
        self.packets.drain(..).map(|(_, packet)| packet).collect()
    }
}

impl GarrisonReporter for RecordingReporter {
    fn send(&mut self, owner: OwnerId, packet: GarrisonPacket) {
        self.packets.push((owner, packet));
    }
}

/// Collaborators of one player session, lent out as a `GarrisonContext`.
pub struct Harness {
    pub world: RecordingWorld,
    pub wallet: Wallet,
    pub reporter: RecordingReporter,
    pub ids: FollowerIdAllocator,
    pub rng: StdRng,
    pub now: u64,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            world: RecordingWorld::loaded(),
            wallet: Wallet::new(1_000 * crate::content::GOLD).with_currency(BARN_CURRENCY, 1_000),
            reporter: RecordingReporter::default(),
            ids: FollowerIdAllocator::default(),
            rng: StdRng::seed_from_u64(11),
            now: 1_700_000_000,
        }
    }

    pub fn ctx(&mut self) -> GarrisonContext<'_> {
        GarrisonContext {
            world: &mut self.world,
            economy: &mut self.wallet,
            reporter: &mut self.reporter,
            ids: &self.ids,
            rng: &mut self.rng,
            now: self.now,
        }
    }
}

/// Unique directory under the system temp dir, removed again when dropped.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(label: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!(
            "garrison-{}-{}-{}",
            label,
            std::process::id(),
            nanos
        ));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
