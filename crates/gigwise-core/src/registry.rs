//! Fitted model registry
//!
//! Owns the per-process income forecasters and expense clusterers, keyed
//! by generic / per-user variant. A model is loaded from the
//! [`ModelStore`] or fitted on first use, then reused until an explicit
//! `retrain`, `reload` or `clear`.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clustering::ExpenseClusterModel;
use crate::error::{Error, Result};
use crate::forecast::IncomeForecaster;
use crate::ml::BoostingParams;
use crate::models::{ExpenseRecord, IncomeRecord};
use crate::policy::ExpensePolicy;

/// Which kind of model a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    IncomeForecaster,
    ExpenseAnalyzer,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::IncomeForecaster, ModelKind::ExpenseAnalyzer];

    /// File name stem
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::IncomeForecaster => "income_forecaster",
            ModelKind::ExpenseAnalyzer => "expense_analyzer",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Generic model or a per-user variant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKey {
    Generic,
    User(String),
}

impl ModelKey {
    /// Key for an optional user id. Ids end up in file names, so only
    /// ASCII letters, digits, `-` and `_` are accepted.
    pub fn for_user(user_id: Option<&str>) -> Result<Self> {
        match user_id.map(str::trim) {
            None | Some("") => Ok(ModelKey::Generic),
            Some(id)
                if id.len() <= 64
                    && id
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
            {
                Ok(ModelKey::User(id.to_string()))
            }
            Some(id) => Err(Error::validation(format!("Invalid userId: {:?}", id))),
        }
    }

    /// File name for this key, e.g. `income_forecaster_user_7.json`
    pub fn file_name(&self, kind: ModelKind) -> String {
        match self {
            ModelKey::Generic => format!("{}.json", kind.as_str()),
            ModelKey::User(id) => format!("{}_user_{}.json", kind.as_str(), id),
        }
    }

    /// Inverse of [`ModelKey::file_name`]
    pub fn parse_file_name(name: &str) -> Option<(ModelKind, ModelKey)> {
        let stem = name.strip_suffix(".json")?;
        ModelKind::ALL.iter().find_map(|kind| {
            let rest = stem.strip_prefix(kind.as_str())?;
            if rest.is_empty() {
                return Some((*kind, ModelKey::Generic));
            }
            let id = rest.strip_prefix("_user_")?;
            ModelKey::for_user(Some(id))
                .ok()
                .filter(|key| *key != ModelKey::Generic)
                .map(|key| (*kind, key))
        })
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKey::Generic => write!(f, "generic"),
            ModelKey::User(id) => write!(f, "user {}", id),
        }
    }
}

/// A model file found in the store
#[derive(Debug, Clone, Serialize)]
pub struct StoredModel {
    pub kind: ModelKind,
    pub key: ModelKey,
    pub file_name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Directory of JSON-serialized models
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// The directory is created lazily on first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: ModelKind, key: &ModelKey) -> PathBuf {
        self.dir.join(key.file_name(kind))
    }

    /// Write a model atomically (temp file in the same directory, then rename)
    pub fn save<T: Serialize>(&self, kind: ModelKind, key: &ModelKey, model: &T) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            Error::Store(format!(
                "Failed to create model directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.path_for(kind, key);
        let tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, model)?;
            writer.flush()?;
        }
        tmp.persist(&path)
            .map_err(|e| Error::Store(format!("Failed to write {}: {}", path.display(), e)))?;

        info!(model = %kind, key = %key, path = %path.display(), "Saved model");
        Ok(path)
    }

    /// Load a model, `Ok(None)` when no file exists for this key
    pub fn load<T: DeserializeOwned>(&self, kind: ModelKind, key: &ModelKey) -> Result<Option<T>> {
        let path = self.path_for(kind, key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let model = serde_json::from_str(&content).map_err(|e| {
            Error::Store(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        debug!(model = %kind, key = %key, path = %path.display(), "Loaded model");
        Ok(Some(model))
    }

    /// Model files in the directory, sorted by file name
    pub fn list(&self) -> Result<Vec<StoredModel>> {
        let mut models = Vec::new();
        if !self.dir.exists() {
            return Ok(models);
        }

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = match entry.file_name().to_str() {
                Some(name) => name.to_string(),
                None => continue,
            };
            let Some((kind, key)) = ModelKey::parse_file_name(&file_name) else {
                continue;
            };
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            models.push(StoredModel {
                kind,
                key,
                file_name,
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        models.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(models)
    }
}

type ModelMap<T> = RwLock<HashMap<ModelKey, Arc<T>>>;

/// Shared owner of fitted models
#[derive(Debug, Default)]
pub struct ModelRegistry {
    store: Option<ModelStore>,
    forecasters: ModelMap<IncomeForecaster>,
    clusterers: ModelMap<ExpenseClusterModel>,
}

impl ModelRegistry {
    /// Registry that loads from and saves to `store`
    pub fn new(store: ModelStore) -> Self {
        Self {
            store: Some(store),
            ..Default::default()
        }
    }

    /// Registry that never touches disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn store(&self) -> Option<&ModelStore> {
        self.store.as_ref()
    }

    /// Cached or persisted forecaster for `key`, fitting on `records` if neither exists.
    ///
    /// Concurrent first calls for one key fit at most once.
    pub fn forecaster(
        &self,
        key: &ModelKey,
        records: &[IncomeRecord],
        params: &BoostingParams,
    ) -> Result<Arc<IncomeForecaster>> {
        if let Some(model) = read(&self.forecasters)?.get(key) {
            return Ok(model.clone());
        }

        let mut map = write(&self.forecasters)?;
        if let Some(model) = map.get(key) {
            return Ok(model.clone());
        }

        let model = match self.load(ModelKind::IncomeForecaster, key)? {
            Some(model) => model,
            None => {
                let model = IncomeForecaster::fit(records, *params)?;
                self.persist(ModelKind::IncomeForecaster, key, &model);
                model
            }
        };

        let model = Arc::new(model);
        map.insert(key.clone(), model.clone());
        Ok(model)
    }

    /// Cached or persisted expense clusters for `key`, fitting on `records`
    /// if neither exists. `Ok(None)` when there are too few records to fit.
    pub fn clusterer(
        &self,
        key: &ModelKey,
        records: &[ExpenseRecord],
        policy: &ExpensePolicy,
    ) -> Result<Option<Arc<ExpenseClusterModel>>> {
        if let Some(model) = read(&self.clusterers)?.get(key) {
            return Ok(Some(model.clone()));
        }

        let mut map = write(&self.clusterers)?;
        if let Some(model) = map.get(key) {
            return Ok(Some(model.clone()));
        }

        let model = match self.load(ModelKind::ExpenseAnalyzer, key)? {
            Some(model) => model,
            None => match ExpenseClusterModel::train(records, policy)? {
                Some(model) => {
                    self.persist(ModelKind::ExpenseAnalyzer, key, &model);
                    model
                }
                None => return Ok(None),
            },
        };

        let model = Arc::new(model);
        map.insert(key.clone(), model.clone());
        Ok(Some(model))
    }

    /// Fit a fresh forecaster, replacing any cached or persisted one
    pub fn retrain_forecaster(
        &self,
        key: &ModelKey,
        records: &[IncomeRecord],
        params: &BoostingParams,
    ) -> Result<Arc<IncomeForecaster>> {
        let model = Arc::new(IncomeForecaster::fit(records, *params)?);
        if let Some(store) = &self.store {
            store.save(ModelKind::IncomeForecaster, key, model.as_ref())?;
        }
        write(&self.forecasters)?.insert(key.clone(), model.clone());
        info!(key = %key, samples = model.samples, "Retrained income forecaster");
        Ok(model)
    }

    /// Fit fresh expense clusters, replacing any cached or persisted ones.
    /// Returns `Ok(None)` (and leaves the existing model alone) when there
    /// are too few records.
    pub fn retrain_clusterer(
        &self,
        key: &ModelKey,
        records: &[ExpenseRecord],
        policy: &ExpensePolicy,
    ) -> Result<Option<Arc<ExpenseClusterModel>>> {
        let Some(model) = ExpenseClusterModel::train(records, policy)? else {
            return Ok(None);
        };
        let model = Arc::new(model);
        if let Some(store) = &self.store {
            store.save(ModelKind::ExpenseAnalyzer, key, model.as_ref())?;
        }
        write(&self.clusterers)?.insert(key.clone(), model.clone());
        info!(key = %key, clusters = model.k(), "Retrained expense clusters");
        Ok(Some(model))
    }

    /// Drop every cached model and load all models found in the store.
    /// Files that fail to load are logged and skipped. Returns how many
    /// were loaded.
    pub fn reload(&self) -> Result<usize> {
        let mut forecasters = write(&self.forecasters)?;
        let mut clusterers = write(&self.clusterers)?;
        forecasters.clear();
        clusterers.clear();

        let Some(store) = &self.store else {
            return Ok(0);
        };

        for stored in store.list()? {
            let loaded = match stored.kind {
                ModelKind::IncomeForecaster => store
                    .load::<IncomeForecaster>(stored.kind, &stored.key)
                    .map(|model| {
                        if let Some(model) = model {
                            forecasters.insert(stored.key.clone(), Arc::new(model));
                        }
                    }),
                ModelKind::ExpenseAnalyzer => store
                    .load::<ExpenseClusterModel>(stored.kind, &stored.key)
                    .map(|model| {
                        if let Some(model) = model {
                            clusterers.insert(stored.key.clone(), Arc::new(model));
                        }
                    }),
            };
            if let Err(e) = loaded {
                warn!(file = %stored.file_name, error = %e, "Skipping unreadable model");
            }
        }

        let loaded = forecasters.len() + clusterers.len();
        info!(loaded, dir = %store.dir().display(), "Reloaded models");
        Ok(loaded)
    }

    /// Forget every cached model (files on disk are untouched)
    pub fn clear(&self) -> Result<()> {
        write(&self.forecasters)?.clear();
        write(&self.clusterers)?.clear();
        Ok(())
    }

    /// Number of models currently held in memory
    pub fn cached(&self) -> Result<usize> {
        Ok(read(&self.forecasters)?.len() + read(&self.clusterers)?.len())
    }

    fn load<T: DeserializeOwned>(&self, kind: ModelKind, key: &ModelKey) -> Result<Option<T>> {
        match &self.store {
            Some(store) => store.load(kind, key),
            None => Ok(None),
        }
    }

    /// Save after a first-use fit. A failed save only costs a refit in the
    /// next process, so the fitted model is still served.
    fn persist<T: Serialize>(&self, kind: ModelKind, key: &ModelKey, model: &T) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(kind, key, model) {
                warn!(model = %kind, key = %key, error = %e, "Failed to persist model");
            }
        }
    }
}

fn read<T>(lock: &ModelMap<T>) -> Result<RwLockReadGuard<'_, HashMap<ModelKey, Arc<T>>>> {
    lock.read()
        .map_err(|_| Error::Store("Failed to acquire model registry lock".into()))
}

fn write<T>(lock: &ModelMap<T>) -> Result<RwLockWriteGuard<'_, HashMap<ModelKey, Arc<T>>>> {
    lock.write()
        .map_err(|_| Error::Store("Failed to acquire model registry lock".into()))
}
