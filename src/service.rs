use crate::content::{Faction, OwnerId};
use crate::garrison::{FollowerIdAllocator, Garrison, GarrisonStaticData};
use crate::persistence::autosave::{self, AutosaveConfig, AutosaveReport, AutosaveState};
use crate::persistence::rows::Transaction;
use crate::persistence::store::{RowStore, StoreError};
use crate::telemetry::logging;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Garrisons of the players currently online, backed by a row store.
pub struct GarrisonService {
    data: Arc<GarrisonStaticData>,
    store: Box<dyn RowStore>,
    ids: FollowerIdAllocator,
    autosave: AutosaveState,
    strict_unlearn: bool,
    garrisons: BTreeMap<OwnerId, Garrison>,
}

impl GarrisonService {
    /// Seeds the follower id allocator past every id already persisted.
    pub fn new(
        data: Arc<GarrisonStaticData>,
        mut store: Box<dyn RowStore>,
        autosave: AutosaveConfig,
        strict_unlearn: bool,
        now: Instant,
    ) -> Result<Self, StoreError> {
        let ids = FollowerIdAllocator::from_max_persisted(store.max_follower_db_id()?);
        Ok(Self {
            data,
            store,
            ids,
            autosave: AutosaveState::new(autosave, now),
            strict_unlearn,
            garrisons: BTreeMap::new(),
        })
    }

    pub fn data(&self) -> &Arc<GarrisonStaticData> {
        &self.data
    }

    pub fn ids(&self) -> &FollowerIdAllocator {
        &self.ids
    }

    pub fn loaded(&self) -> usize {
        self.garrisons.len()
    }

    pub fn garrison(&self, owner: OwnerId) -> Option<&Garrison> {
        self.garrisons.get(&owner)
    }

    /// Garrison together with the allocator a `GarrisonContext` borrows.
    pub fn session(&mut self, owner: OwnerId) -> Option<(&mut Garrison, &FollowerIdAllocator)> {
        let ids = &self.ids;
        self.garrisons.get_mut(&owner).map(|garrison| (garrison, ids))
    }

    /// Loads the owner's garrison on first use. Owners without stored rows get an
    /// uncreated garrison.
    pub fn login(&mut self, owner: OwnerId, faction: Faction) -> Result<&mut Garrison, StoreError> {
        match self.garrisons.entry(owner) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let rows = self.store.load(owner)?;
                let garrison = Garrison::load_from_db(self.data.clone(), owner, faction, &rows)
                    .unwrap_or_else(|| Garrison::new(self.data.clone(), owner, faction))
                    .with_strict_unlearn(self.strict_unlearn);
                Ok(entry.insert(garrison))
            }
        }
    }

    /// Saves and unloads the owner's garrison.
    pub fn logout(&mut self, owner: OwnerId) -> Result<(), StoreError> {
        let Some(garrison) = self.garrisons.remove(&owner) else {
            return Ok(());
        };
        let mut tx = Transaction::new();
        garrison.save_to_db(&mut tx);
        self.store.commit(tx)
    }

    /// Commits a transaction built by a garrison operation, such as `Garrison::delete`.
    pub fn commit(&mut self, tx: Transaction) -> Result<(), StoreError> {
        self.store.commit(tx)
    }

    pub fn autosave_if_due(&mut self, now: Instant) -> Option<AutosaveReport> {
        if !self.autosave.due(now) {
            return None;
        }
        let report = autosave::autosave_garrisons(self.garrisons.values(), self.store.as_mut());
        self.autosave.mark_saved(now);
        for err in &report.garrison_errors {
            logging::log_error(&format!("autosave failed: {}", err));
        }
        logging::log_game(&format!(
            "autosave: saved {} garrisons, {} errors",
            report.saved_garrisons,
            report.garrison_errors.len()
        ));
        Some(report)
    }
}
