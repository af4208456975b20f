use crate::content::OwnerId;
use crate::persistence::rows::{RowSet, StageError, Transaction};
use crate::telemetry::logging;
use lru::LruCache;
use std::collections::BTreeMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("garrison store io failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("garrison store parse failed for {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("garrison store integrity violation: {0}")]
    Integrity(String),
}

impl From<StageError<StoreError>> for StoreError {
    fn from(err: StageError<StoreError>) -> Self {
        match err {
            StageError::Fetch(err) => err,
            StageError::Integrity(message) => StoreError::Integrity(message),
        }
    }
}

/// Row storage for garrison tables. `commit` is all-or-nothing.
pub trait RowStore {
    fn load(&mut self, owner: OwnerId) -> Result<RowSet, StoreError>;

    fn commit(&mut self, tx: Transaction) -> Result<(), StoreError>;

    fn max_follower_db_id(&mut self) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRowStore {
    owners: BTreeMap<OwnerId, RowSet>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self, owner: OwnerId) -> Option<&RowSet> {
        self.owners.get(&owner)
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }
}

impl RowStore for MemoryRowStore {
    fn load(&mut self, owner: OwnerId) -> Result<RowSet, StoreError> {
        Ok(self.owners.get(&owner).cloned().unwrap_or_default())
    }

    fn commit(&mut self, tx: Transaction) -> Result<(), StoreError> {
        let owners = &self.owners;
        let staged = tx.stage(|owner| {
            Ok::<_, StoreError>(owners.get(&owner).cloned().unwrap_or_default())
        })?;
        for (owner, rows) in staged {
            if rows.is_empty() {
                self.owners.remove(&owner);
            } else {
                self.owners.insert(owner, rows);
            }
        }
        Ok(())
    }

    fn max_follower_db_id(&mut self) -> Result<u64, StoreError> {
        Ok(self
            .owners
            .values()
            .map(RowSet::max_follower_db_id)
            .max()
            .unwrap_or(0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct StoreValidationReport {
    pub garrison_files: usize,
    pub parsed: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub missing_dir: bool,
}

/// One YAML document per owner under `save/garrisons/`. The previous version of each
/// file is kept next to it with a `#` suffix and read when the primary is unreadable.
pub struct FileRowStore {
    dir: PathBuf,
    cache: LruCache<OwnerId, RowSet>,
    stats: CacheStats,
}

impl FileRowStore {
    pub fn from_root(root: &Path, cache_size: usize) -> Self {
        Self::new(root.join("save").join("garrisons"), cache_size)
    }

    pub fn new(dir: impl Into<PathBuf>, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            dir: dir.into(),
            cache: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn owner_path(&self, owner: OwnerId) -> PathBuf {
        self.dir.join(format!("{}.yml", owner.0))
    }

    fn owner_backup_path(&self, owner: OwnerId) -> PathBuf {
        self.dir.join(format!("{}.yml#", owner.0))
    }

    fn owner_temp_path(&self, owner: OwnerId) -> PathBuf {
        self.dir.join(format!("{}.yml.tmp", owner.0))
    }

    fn read_owner(&self, owner: OwnerId) -> Result<RowSet, StoreError> {
        let path = self.owner_path(owner);
        let backup_path = self.owner_backup_path(owner);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(read_rows(&backup_path)?.unwrap_or_default());
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        match serde_yaml::from_str::<RowSet>(&data) {
            Ok(rows) => Ok(rows),
            Err(source) => {
                if let Some(fallback) = read_rows(&backup_path)? {
                    logging::log_error(&format!(
                        "garrison save parse failed for {}, using backup: {}",
                        path.display(),
                        source
                    ));
                    return Ok(fallback);
                }
                Err(StoreError::Yaml { path, source })
            }
        }
    }

    fn write_owner(&self, owner: OwnerId, rows: &RowSet) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.owner_path(owner);
        let backup_path = self.owner_backup_path(owner);
        if path.exists() {
            fs::copy(&path, &backup_path).map_err(|source| StoreError::Io {
                path: backup_path.clone(),
                source,
            })?;
        }
        if rows.is_empty() {
            return match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(StoreError::Io { path, source }),
            };
        }
        let data = serde_yaml::to_string(rows).map_err(|source| StoreError::Yaml {
            path: path.clone(),
            source,
        })?;
        let temp_path = self.owner_temp_path(owner);
        fs::write(&temp_path, data).map_err(|source| StoreError::Io {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &path).map_err(|source| StoreError::Io { path, source })
    }

    fn owner_files(&self) -> Result<Vec<(OwnerId, PathBuf)>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if let Some(owner) = owner_from_path(&path) {
                files.push((owner, path));
            }
        }
        files.sort();
        Ok(files)
    }

    /// Parses every garrison file and checks its row relations.
    pub fn validate(&self) -> StoreValidationReport {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return StoreValidationReport {
                    missing_dir: true,
                    ..StoreValidationReport::default()
                };
            }
            Err(err) => {
                return StoreValidationReport {
                    errors: vec![format!(
                        "garrison save dir read failed for {}: {}",
                        self.dir.display(),
                        err
                    )],
                    ..StoreValidationReport::default()
                };
            }
        };

        let mut report = StoreValidationReport::default();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    report.errors.push(format!(
                        "garrison save dir entry failed for {}: {}",
                        self.dir.display(),
                        err
                    ));
                    continue;
                }
            };
            let path = entry.path();
            let Some(owner) = owner_from_path(&path) else {
                report.skipped += 1;
                continue;
            };
            report.garrison_files += 1;
            let rows = match read_rows(&path) {
                Ok(Some(rows)) => rows,
                Ok(None) => continue,
                Err(err) => {
                    report.errors.push(err.to_string());
                    continue;
                }
            };
            if let Err(err) = rows.check_integrity(owner) {
                report
                    .errors
                    .push(format!("garrison save {} invalid: {}", path.display(), err));
                continue;
            }
            report.parsed += 1;
        }
        report
    }
}

impl RowStore for FileRowStore {
    fn load(&mut self, owner: OwnerId) -> Result<RowSet, StoreError> {
        if let Some(rows) = self.cache.get(&owner) {
            self.stats.hits += 1;
            return Ok(rows.clone());
        }
        self.stats.misses += 1;
        let rows = self.read_owner(owner)?;
        self.cache.put(owner, rows.clone());
        Ok(rows)
    }

    fn commit(&mut self, tx: Transaction) -> Result<(), StoreError> {
        let staged = tx.stage(|owner| self.load(owner))?;
        for (owner, rows) in staged {
            if let Err(err) = self.write_owner(owner, &rows) {
                self.cache.pop(&owner);
                return Err(err);
            }
            self.cache.put(owner, rows);
        }
        Ok(())
    }

    fn max_follower_db_id(&mut self) -> Result<u64, StoreError> {
        let mut max = 0;
        for (owner, _) in self.owner_files()? {
            max = max.max(self.load(owner)?.max_follower_db_id());
        }
        Ok(max)
    }
}

fn read_rows(path: &Path) -> Result<Option<RowSet>, StoreError> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_yaml::from_str(&data)
        .map(Some)
        .map_err(|source| StoreError::Yaml {
            path: path.to_path_buf(),
            source,
        })
}

fn owner_from_path(path: &Path) -> Option<OwnerId> {
    let is_save = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);
    if !is_save {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.parse().ok())
        .map(OwnerId)
}
