use crate::content::{
    AbilityId, BuildingId, FollowerDbId, FollowerTemplateId, OwnerId, PlotInstanceId, SiteLevelId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarrisonRow {
    pub owner: OwnerId,
    pub garrison_type: u8,
    pub site_level_id: SiteLevelId,
    pub follower_activations_remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintRow {
    pub owner: OwnerId,
    pub garrison_type: u8,
    pub building_id: BuildingId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingRow {
    pub owner: OwnerId,
    pub garrison_type: u8,
    pub plot_instance_id: PlotInstanceId,
    pub building_id: BuildingId,
    pub time_built: u64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerRow {
    pub db_id: FollowerDbId,
    pub owner: OwnerId,
    pub garrison_type: u8,
    pub template_id: FollowerTemplateId,
    pub quality: u8,
    pub level: u8,
    pub item_level_weapon: u32,
    pub item_level_armor: u32,
    pub xp: u32,
    #[serde(default)]
    pub current_building_id: Option<BuildingId>,
    #[serde(default)]
    pub current_mission_id: Option<u32>,
    #[serde(default)]
    pub status: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerAbilityRow {
    pub follower_db_id: FollowerDbId,
    pub ability_id: AbilityId,
    pub slot: u8,
}

/// Every persisted row belonging to one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowSet {
    pub garrison: Option<GarrisonRow>,
    pub blueprints: Vec<BlueprintRow>,
    pub buildings: Vec<BuildingRow>,
    pub followers: Vec<FollowerRow>,
    pub follower_abilities: Vec<FollowerAbilityRow>,
}

impl RowSet {
    pub fn is_empty(&self) -> bool {
        self.garrison.is_none()
            && self.blueprints.is_empty()
            && self.buildings.is_empty()
            && self.followers.is_empty()
            && self.follower_abilities.is_empty()
    }

    pub fn max_follower_db_id(&self) -> u64 {
        self.followers
            .iter()
            .map(|row| row.db_id.0)
            .max()
            .unwrap_or(0)
    }

    /// Ability rows of one follower, ordered by slot.
    pub fn abilities_of(&self, follower: FollowerDbId) -> Vec<&FollowerAbilityRow> {
        let mut rows: Vec<&FollowerAbilityRow> = self
            .follower_abilities
            .iter()
            .filter(|row| row.follower_db_id == follower)
            .collect();
        rows.sort_by_key(|row| row.slot);
        rows
    }

    /// Checks the relations a committed row set must satisfy.
    pub fn check_integrity(&self, owner: OwnerId) -> Result<(), String> {
        let has_children = !self.blueprints.is_empty()
            || !self.buildings.is_empty()
            || !self.followers.is_empty()
            || !self.follower_abilities.is_empty();
        match &self.garrison {
            Some(row) if row.owner != owner => {
                return Err(format!("garrison row owner {} stored under {}", row.owner, owner));
            }
            None if has_children => {
                return Err(format!("owner {} has garrison rows without a garrison", owner));
            }
            _ => {}
        }
        if let Some(row) = self.blueprints.iter().find(|row| row.owner != owner) {
            return Err(format!("blueprint row owner {} stored under {}", row.owner, owner));
        }
        if let Some(row) = self.buildings.iter().find(|row| row.owner != owner) {
            return Err(format!("building row owner {} stored under {}", row.owner, owner));
        }
        if let Some(row) = self.followers.iter().find(|row| row.owner != owner) {
            return Err(format!("follower row owner {} stored under {}", row.owner, owner));
        }
        let followers: HashSet<FollowerDbId> = self.followers.iter().map(|row| row.db_id).collect();
        if let Some(row) = self
            .follower_abilities
            .iter()
            .find(|row| !followers.contains(&row.follower_db_id))
        {
            return Err(format!(
                "ability {} references missing follower {}",
                row.ability_id, row.follower_db_id
            ));
        }
        Ok(())
    }
}

/// One write against the garrison tables. Deletes address every row of an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    DeleteGarrison { owner: OwnerId },
    DeleteBlueprints { owner: OwnerId },
    DeleteBuildings { owner: OwnerId },
    DeleteFollowerAbilities { owner: OwnerId },
    DeleteFollowers { owner: OwnerId },
    InsertGarrison(GarrisonRow),
    InsertBlueprint(BlueprintRow),
    InsertBuilding(BuildingRow),
    InsertFollower(FollowerRow),
    InsertFollowerAbility { owner: OwnerId, row: FollowerAbilityRow },
}

impl Statement {
    pub fn owner(&self) -> OwnerId {
        match self {
            Statement::DeleteGarrison { owner }
            | Statement::DeleteBlueprints { owner }
            | Statement::DeleteBuildings { owner }
            | Statement::DeleteFollowerAbilities { owner }
            | Statement::DeleteFollowers { owner }
            | Statement::InsertFollowerAbility { owner, .. } => *owner,
            Statement::InsertGarrison(row) => row.owner,
            Statement::InsertBlueprint(row) => row.owner,
            Statement::InsertBuilding(row) => row.owner,
            Statement::InsertFollower(row) => row.owner,
        }
    }

    /// Applies the statement to the owner's staged rows.
    pub fn apply(self, rows: &mut RowSet) -> Result<(), String> {
        match self {
            Statement::DeleteGarrison { .. } => rows.garrison = None,
            Statement::DeleteBlueprints { .. } => rows.blueprints.clear(),
            Statement::DeleteBuildings { .. } => rows.buildings.clear(),
            Statement::DeleteFollowerAbilities { .. } => rows.follower_abilities.clear(),
            Statement::DeleteFollowers { .. } => {
                rows.followers.clear();
                rows.follower_abilities.clear();
            }
            Statement::InsertGarrison(row) => {
                if rows.garrison.is_some() {
                    return Err(format!("duplicate garrison row for owner {}", row.owner));
                }
                rows.garrison = Some(row);
            }
            Statement::InsertBlueprint(row) => {
                if rows.blueprints.iter().any(|existing| existing.building_id == row.building_id) {
                    return Err(format!("duplicate blueprint {} for owner {}", row.building_id, row.owner));
                }
                rows.blueprints.push(row);
            }
            Statement::InsertBuilding(row) => {
                if rows
                    .buildings
                    .iter()
                    .any(|existing| existing.plot_instance_id == row.plot_instance_id)
                {
                    return Err(format!(
                        "duplicate building row on plot {} for owner {}",
                        row.plot_instance_id, row.owner
                    ));
                }
                rows.buildings.push(row);
            }
            Statement::InsertFollower(row) => {
                if rows.followers.iter().any(|existing| existing.db_id == row.db_id) {
                    return Err(format!("duplicate follower {}", row.db_id));
                }
                rows.followers.push(row);
            }
            Statement::InsertFollowerAbility { row, .. } => {
                if rows.follower_abilities.iter().any(|existing| {
                    existing.follower_db_id == row.follower_db_id
                        && existing.ability_id == row.ability_id
                }) {
                    return Err(format!(
                        "duplicate ability {} on follower {}",
                        row.ability_id, row.follower_db_id
                    ));
                }
                rows.follower_abilities.push(row);
            }
        }
        Ok(())
    }
}

/// Ordered batch of statements committed all-or-nothing by a `RowStore`.
/// Dropping it without committing writes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    statements: Vec<Statement>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Runs every statement against staged copies fetched through `current`, then checks
    /// integrity. Nothing is published here; the caller swaps the staged sets in on success.
    pub fn stage<F, E>(self, mut current: F) -> Result<BTreeMap<OwnerId, RowSet>, StageError<E>>
    where
        F: FnMut(OwnerId) -> Result<RowSet, E>,
    {
        let mut staged: BTreeMap<OwnerId, RowSet> = BTreeMap::new();
        for statement in self.statements {
            let owner = statement.owner();
            if !staged.contains_key(&owner) {
                let rows = current(owner).map_err(StageError::Fetch)?;
                staged.insert(owner, rows);
            }
            let Some(rows) = staged.get_mut(&owner) else {
                continue;
            };
            statement.apply(rows).map_err(StageError::Integrity)?;
        }
        for (owner, rows) in &staged {
            rows.check_integrity(*owner).map_err(StageError::Integrity)?;
        }
        Ok(staged)
    }
}

#[derive(Debug)]
pub enum StageError<E> {
    Fetch(E),
    Integrity(String),
}
