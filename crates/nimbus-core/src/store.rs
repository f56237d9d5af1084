//! Persisted dashboard preferences.
//!
//! The store is created once at startup, handed to whoever needs it, and
//! flushed on shutdown. Each key is decoded on its own: a corrupt or missing
//! entry is dropped without affecting the others.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Unit;
use crate::error::StorageError;

const KEY_UNIT: &str = "unit";
const KEY_RECENT_CITIES: &str = "recentCities";
const KEY_RECENT_PLACES: &str = "recentPlaces";
const KEY_LAST_SNAPSHOT: &str = "lastSnapshot";

/// Where the serialized store lives.
pub trait StateBackend: Send {
    /// Returns `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>, StorageError>;
    fn write(&mut self, contents: &str) -> Result<(), StorageError>;
}

/// JSON file in the config directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateBackend for FileBackend {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read(e.to_string())),
        }
    }

    fn write(&mut self, contents: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Write(e.to_string()))?;
        }
        std::fs::write(&self.path, contents).map_err(|e| StorageError::Write(e.to_string()))
    }
}

/// Shared in-memory backend. Clones see the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryBackend {
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Arc::new(Mutex::new(Some(contents.into()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl StateBackend for MemoryBackend {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.contents.lock().clone())
    }

    fn write(&mut self, contents: &str) -> Result<(), StorageError> {
        *self.contents.lock() = Some(contents.to_string());
        Ok(())
    }
}

/// A place the user picked, remembered with its coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlace {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
}

pub struct PreferenceStore {
    backend: Box<dyn StateBackend>,
    limit: usize,
    unit: Option<Unit>,
    recent_cities: Vec<String>,
    recent_places: Vec<SavedPlace>,
    last_snapshot: Option<Value>,
    dirty: bool,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("unit", &self.unit)
            .field("recent_cities", &self.recent_cities)
            .field("recent_places", &self.recent_places.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

fn decode_key<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = map.remove(key)?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("Ignoring unreadable stored {}: {}", key, e);
            None
        }
    }
}

impl PreferenceStore {
    /// Load the store. Never fails: unreadable state starts empty.
    pub fn load(backend: Box<dyn StateBackend>, limit: usize) -> Self {
        let mut store = Self {
            backend,
            limit,
            unit: None,
            recent_cities: Vec::new(),
            recent_places: Vec::new(),
            last_snapshot: None,
            dirty: false,
        };

        let raw = match store.backend.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => return store,
            Err(e) => {
                tracing::warn!("Preference store unavailable: {}", e);
                return store;
            }
        };

        let mut map = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::debug!("Ignoring corrupt preference store");
                return store;
            }
        };

        store.unit = decode_key(&mut map, KEY_UNIT);
        store.recent_cities = decode_key::<Vec<String>>(&mut map, KEY_RECENT_CITIES)
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .collect();
        store.recent_places = decode_key::<Vec<SavedPlace>>(&mut map, KEY_RECENT_PLACES)
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .collect();
        store.last_snapshot = map.remove(KEY_LAST_SNAPSHOT).filter(|v| !v.is_null());

        store
    }

    pub fn unit(&self) -> Option<Unit> {
        self.unit
    }

    pub fn set_unit(&mut self, unit: Unit) {
        if self.unit != Some(unit) {
            self.unit = Some(unit);
            self.dirty = true;
        }
    }

    /// Most recent first.
    pub fn recent_cities(&self) -> &[String] {
        &self.recent_cities
    }

    /// Move `name` to the front, dropping case-insensitive duplicates.
    pub fn add_recent_city(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() || self.limit == 0 {
            return;
        }
        let lower = name.to_lowercase();
        self.recent_cities.retain(|c| c.to_lowercase() != lower);
        self.recent_cities.insert(0, name.to_string());
        self.recent_cities.truncate(self.limit);
        self.dirty = true;
    }

    pub fn recent_places(&self) -> &[SavedPlace] {
        &self.recent_places
    }

    pub fn add_recent_place(&mut self, place: SavedPlace) {
        if self.limit == 0 {
            return;
        }
        let lower = place.name.to_lowercase();
        self.recent_places
            .retain(|p| p.name.to_lowercase() != lower);
        self.recent_places.insert(0, place);
        self.recent_places.truncate(self.limit);
        self.dirty = true;
    }

    pub fn last_snapshot(&self) -> Option<&Value> {
        self.last_snapshot.as_ref()
    }

    pub fn set_last_snapshot(&mut self, snapshot: Value) {
        self.last_snapshot = Some(snapshot);
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Persist pending changes. A clean store is not rewritten.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        if !self.dirty {
            return Ok(());
        }

        let mut map = Map::new();
        if let Some(unit) = self.unit {
            map.insert(KEY_UNIT.to_string(), Value::String(unit.as_str().to_string()));
        }
        map.insert(
            KEY_RECENT_CITIES.to_string(),
            serde_json::to_value(&self.recent_cities)
                .map_err(|e| StorageError::Encode(e.to_string()))?,
        );
        map.insert(
            KEY_RECENT_PLACES.to_string(),
            serde_json::to_value(&self.recent_places)
                .map_err(|e| StorageError::Encode(e.to_string()))?,
        );
        if let Some(snapshot) = &self.last_snapshot {
            map.insert(KEY_LAST_SNAPSHOT.to_string(), snapshot.clone());
        }

        let contents = serde_json::to_string_pretty(&Value::Object(map))
            .map_err(|e| StorageError::Encode(e.to_string()))?;
        self.backend.write(&contents)?;
        self.dirty = false;

        tracing::debug!("Preference store flushed");
        Ok(())
    }
}

/// Store handle shared between the app lifecycle and the dashboard.
pub type SharedStore = Arc<Mutex<PreferenceStore>>;
