use crate::content::records::FollowerRecord;
use crate::content::{AbilityId, BuildingId, FollowerDbId, FollowerTemplateId};
use crate::garrison::packets::FollowerInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Follower {
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
    /// Ordered; never holds the same ability twice.
    pub abilities: Vec<AbilityId>,
}

impl Follower {
    /// Fresh recruit with the template's baseline stats and no abilities yet.
    pub fn recruit(db_id: FollowerDbId, template: &FollowerRecord) -> Self {
        Self {
            db_id,
            template_id: template.id,
            quality: template.quality,
            level: template.level,
            item_level_weapon: template.item_level_weapon,
            item_level_armor: template.item_level_armor,
            xp: 0,
            current_building_id: None,
            current_mission_id: None,
            status: 0,
            abilities: Vec::new(),
        }
    }

    pub fn item_level(&self) -> u32 {
        (self.item_level_weapon + self.item_level_armor) / 2
    }

    pub fn has_ability(&self, ability: AbilityId) -> bool {
        self.abilities.contains(&ability)
    }

    pub fn info(&self) -> FollowerInfo {
        FollowerInfo {
            db_id: self.db_id,
            template_id: self.template_id,
            quality: self.quality,
            level: self.level,
            item_level_weapon: self.item_level_weapon,
            item_level_armor: self.item_level_armor,
            xp: self.xp,
            current_building_id: self.current_building_id,
            current_mission_id: self.current_mission_id,
            status: self.status,
            abilities: self.abilities.clone(),
        }
    }
}
