use anyhow::Context;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::event::{classify_department, DayOverride, Event, EventUpdate, InvalidEvent};
use crate::seed;

/// Key under which the whole event collection is stored.
pub const STORAGE_KEY: &str = "pekom-events";

const DEFAULT_STORE_FILE: &str = "planner-store.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed store data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("an event with id '{0}' already exists")]
    DuplicateId(String),
    #[error(transparent)]
    InvalidEvent(#[from] InvalidEvent),
}

/// Flat string key-value storage backing the event store.
pub trait KeyValue {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// A JSON object on disk mapping keys to string values.
#[derive(Debug, Clone)]
pub struct FileKeyValue {
    path: PathBuf,
}

impl FileKeyValue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl KeyValue for FileKeyValue {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(StoreError::Json(e)) => {
                tracing::warn!("Replacing unreadable store file {}: {}", self.path.display(), e);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value.to_string());

        let content = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, content).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Persisted shape of an event. Field names follow the snapshot format
/// written by earlier versions so old stores keep loading.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEvent {
    id: String,
    #[serde(with = "calendar_date")]
    start_date: NaiveDate,
    #[serde(with = "calendar_date")]
    end_date: NaiveDate,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    department: Option<String>,
    #[serde(default)]
    is_public_holiday: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default, with = "crate::event::hhmm", skip_serializing_if = "Option::is_none")]
    start_time: Option<chrono::NaiveTime>,
    #[serde(default, with = "crate::event::hhmm", skip_serializing_if = "Option::is_none")]
    end_time: Option<chrono::NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    per_day: BTreeMap<NaiveDate, DayOverride>,
}

impl From<&Event> for StoredEvent {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            start_date: event.start_date,
            end_date: event.end_date,
            name: event.name.clone(),
            department: event.department.map(|d| d.as_str().to_string()),
            is_public_holiday: Some(event.is_public_holiday),
            location: event.location.clone(),
            start_time: event.start_time,
            end_time: event.end_time,
            description: event.description.clone(),
            per_day: event.per_day.clone(),
        }
    }
}

impl From<StoredEvent> for Event {
    /// Reapplies department normalization: `Collaboration` becomes `A&W` and a
    /// `Public Holiday` category becomes the holiday flag.
    fn from(stored: StoredEvent) -> Self {
        let (department, holiday_category) = classify_department(stored.department.as_deref());
        let is_public_holiday = holiday_category || stored.is_public_holiday.unwrap_or(false);

        Event {
            id: stored.id,
            start_date: stored.start_date,
            end_date: stored.end_date,
            name: stored.name,
            department: if is_public_holiday { None } else { department },
            is_public_holiday,
            location: stored.location,
            start_time: stored.start_time,
            end_time: stored.end_time,
            description: stored.description,
            per_day: stored.per_day,
        }
    }
}

/// Dates persisted as `YYYY-MM-DD`. Older snapshots hold full instants, which
/// are read back as the local calendar date.
mod calendar_date {
    use chrono::{DateTime, Local, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&crate::dates::format_iso(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.contains('T') {
            return DateTime::parse_from_rfc3339(raw.trim())
                .map(|dt| dt.with_timezone(&Local).date_naive())
                .map_err(serde::de::Error::custom);
        }
        crate::dates::parse_iso(&raw).map_err(serde::de::Error::custom)
    }
}

pub fn encode(events: &[Event]) -> Result<String, serde_json::Error> {
    let stored: Vec<StoredEvent> = events.iter().map(StoredEvent::from).collect();
    serde_json::to_string(&stored)
}

pub fn decode(raw: &str) -> Result<Vec<Event>, serde_json::Error> {
    let stored: Vec<StoredEvent> = serde_json::from_str(raw)?;
    Ok(stored.into_iter().map(Event::from).collect())
}

/// Owns the event collection and its persisted mirror. Every mutation writes
/// the full snapshot back through the backend.
#[derive(Debug)]
pub struct EventStore<B: KeyValue> {
    backend: B,
    events: Vec<Event>,
}

impl<B: KeyValue> EventStore<B> {
    /// Load the stored collection, seeding it when nothing has been stored yet.
    /// Unreadable data is logged and treated as an empty collection.
    pub fn open(backend: B) -> Result<Self, StoreError> {
        let stored = match backend.get(STORAGE_KEY) {
            Ok(stored) => stored,
            Err(StoreError::Json(e)) => {
                tracing::error!("Failed to read store: {}", e);
                return Ok(Self {
                    backend,
                    events: Vec::new(),
                });
            }
            Err(e) => return Err(e),
        };

        let mut store = Self {
            backend,
            events: Vec::new(),
        };

        match stored {
            Some(raw) => match decode(&raw) {
                Ok(events) => {
                    tracing::debug!("Loaded {} events from store", events.len());
                    store.events = events;
                }
                Err(e) => tracing::error!("Failed to load events: {}", e),
            },
            None => {
                store.events = seed::initial_events();
                tracing::info!("Seeded store with {} initial events", store.events.len());
                store.persist()?;
            }
        }

        Ok(store)
    }

    pub fn all(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Add a user-created event. User events are never public holidays.
    pub fn add(&mut self, mut event: Event) -> Result<(), StoreError> {
        event.is_public_holiday = false;
        event.validate()?;
        if self.get(&event.id).is_some() {
            return Err(StoreError::DuplicateId(event.id));
        }

        tracing::info!("Added event: {}", event.name);
        self.events.push(event);
        self.persist()
    }

    /// Shallow-merge `update` into the event with `id`. Returns `Ok(false)`
    /// when no such event exists.
    pub fn update(&mut self, id: &str, update: EventUpdate) -> Result<bool, StoreError> {
        let Some(index) = self.events.iter().position(|e| e.id == id) else {
            tracing::debug!("Ignoring update for unknown event: {}", id);
            return Ok(false);
        };

        let mut updated = self.events[index].clone();
        updated.apply(update);
        updated.validate()?;

        tracing::info!("Updated event: {}", updated.name);
        self.events[index] = updated;
        self.persist()?;
        Ok(true)
    }

    /// Remove the event with `id`. Returns `Ok(false)` when no such event exists.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        if self.events.len() == before {
            tracing::debug!("Ignoring delete for unknown event: {}", id);
            return Ok(false);
        }

        tracing::info!("Deleted event: {}", id);
        self.persist()?;
        Ok(true)
    }

    /// Replace the collection with the initial dataset.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.events = seed::initial_events();
        tracing::info!("Reset store to {} initial events", self.events.len());
        self.persist()
    }

    /// A fresh id based on the current time in milliseconds.
    pub fn next_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.get(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let snapshot = encode(&self.events)?;
        self.backend.set(STORAGE_KEY, &snapshot)
    }
}

/// Store file location: `PLANNER_STORE_PATH`, else a file in the current directory.
pub fn default_store_path() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var("PLANNER_STORE_PATH") {
        return Ok(PathBuf::from(path));
    }

    let path = std::env::current_dir()
        .context("Failed to resolve current directory")?
        .join(DEFAULT_STORE_FILE);
    Ok(path)
}
