use std::{
    collections::HashMap,
    fs,
    future::Future,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use serde::{Deserialize, Serialize};

use crate::{append_runtime_log, runtime_paths, TABS_STATE_FILE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRecord {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabEvent {
    Inserted(TabRecord),
    Updated(TabRecord),
    Deleted(String),
}

pub type TabListener = Arc<dyn Fn(&TabEvent) + Send + Sync>;

/// Persistent storage layer opened at bootstrap and closed during shutdown.
pub trait Storage: Send + Sync {
    fn init(&self) -> impl Future<Output = Result<(), String>> + Send;
    fn close(&self) -> impl Future<Output = Result<(), String>> + Send;
}

/// Ordered, observable view over the tab records.
pub trait RecordView: Send + Sync {
    fn subscribe(&self, listener: TabListener);
    fn sorted_view(&self) -> Vec<TabRecord>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreStatus {
    Uninitialized,
    Open,
    Closed,
}

struct StoreInner {
    status: StoreStatus,
    records: HashMap<String, TabRecord>,
}

pub struct TabStore {
    path: PathBuf,
    direction: SortDirection,
    inner: Mutex<StoreInner>,
    listeners: Mutex<Vec<TabListener>>,
}

impl TabStore {
    pub fn new(path: PathBuf, direction: SortDirection) -> Self {
        Self {
            path,
            direction,
            inner: Mutex::new(StoreInner {
                status: StoreStatus::Uninitialized,
                records: HashMap::new(),
            }),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn for_root(root_dir: &Path) -> Self {
        Self::new(
            runtime_paths::data_file_path(root_dir, TABS_STATE_FILE),
            SortDirection::Ascending,
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_inner(&self) -> MutexGuard<'_, StoreInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(error) => {
                append_runtime_log("tab store lock poisoned; recovering");
                error.into_inner()
            }
        }
    }

    fn ensure_open(inner: &StoreInner) -> Result<(), String> {
        match inner.status {
            StoreStatus::Open => Ok(()),
            StoreStatus::Uninitialized => Err("Tab storage is not initialized.".to_string()),
            StoreStatus::Closed => Err("Tab storage is closed.".to_string()),
        }
    }

    pub fn get(&self, id: &str) -> Option<TabRecord> {
        self.lock_inner().records.get(id).cloned()
    }

    pub fn insert(&self, record: TabRecord) -> Result<(), String> {
        {
            let mut inner = self.lock_inner();
            Self::ensure_open(&inner)?;
            if inner.records.contains_key(&record.id) {
                return Err(format!("Tab {} already exists.", record.id));
            }
            inner.records.insert(record.id.clone(), record.clone());
        }
        self.notify(&TabEvent::Inserted(record));
        Ok(())
    }

    pub fn update(&self, record: TabRecord) -> Result<(), String> {
        {
            let mut inner = self.lock_inner();
            Self::ensure_open(&inner)?;
            let Some(existing) = inner.records.get_mut(&record.id) else {
                return Err(format!("Tab {} does not exist.", record.id));
            };
            *existing = record.clone();
        }
        self.notify(&TabEvent::Updated(record));
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<(), String> {
        {
            let mut inner = self.lock_inner();
            Self::ensure_open(&inner)?;
            if inner.records.remove(id).is_none() {
                return Err(format!("Tab {id} does not exist."));
            }
        }
        self.notify(&TabEvent::Deleted(id.to_string()));
        Ok(())
    }

    fn notify(&self, event: &TabEvent) {
        let listeners = match self.listeners.lock() {
            Ok(guard) => guard.clone(),
            Err(error) => error.into_inner().clone(),
        };
        for listener in listeners {
            listener(event);
        }
    }

    fn sort_records(&self, mut records: Vec<TabRecord>) -> Vec<TabRecord> {
        records.sort_by(|left, right| {
            let by_position = match self.direction {
                SortDirection::Ascending => left.position.cmp(&right.position),
                SortDirection::Descending => right.position.cmp(&left.position),
            };
            by_position.then_with(|| left.id.cmp(&right.id))
        });
        records
    }

    fn load_records(&self) -> Result<Vec<TabRecord>, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => {
                return Err(format!(
                    "Failed to read tab storage {}: {}",
                    self.path.display(),
                    error
                ));
            }
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|error| {
            format!(
                "Failed to parse tab storage {}: {}",
                self.path.display(),
                error
            )
        })
    }

    fn write_records(&self, records: Vec<TabRecord>) -> Result<(), String> {
        if let Some(parent_dir) = self.path.parent() {
            fs::create_dir_all(parent_dir).map_err(|error| {
                format!(
                    "Failed to create tab storage directory {}: {}",
                    parent_dir.display(),
                    error
                )
            })?;
        }
        let serialized = serde_json::to_string_pretty(&self.sort_records(records))
            .map_err(|error| format!("Failed to serialize tab storage: {error}"))?;
        fs::write(&self.path, serialized).map_err(|error| {
            format!(
                "Failed to write tab storage {}: {}",
                self.path.display(),
                error
            )
        })
    }
}

impl Storage for TabStore {
    async fn init(&self) -> Result<(), String> {
        {
            let inner = self.lock_inner();
            match inner.status {
                StoreStatus::Open => return Ok(()),
                StoreStatus::Closed => {
                    return Err("Tab storage was closed and cannot be reopened.".to_string())
                }
                StoreStatus::Uninitialized => {}
            }
        }

        let records = self.load_records()?;
        let mut inner = self.lock_inner();
        inner.records = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        inner.status = StoreStatus::Open;
        append_runtime_log(&format!(
            "tab storage opened: {} ({} tabs)",
            self.path.display(),
            inner.records.len()
        ));
        Ok(())
    }

    async fn close(&self) -> Result<(), String> {
        let records = {
            let mut inner = self.lock_inner();
            let previous = inner.status;
            inner.status = StoreStatus::Closed;
            if previous != StoreStatus::Open {
                // Never opened: nothing loaded, so the file on disk is left alone.
                return Ok(());
            }
            inner.records.values().cloned().collect::<Vec<_>>()
        };
        self.write_records(records)?;
        append_runtime_log(&format!("tab storage closed: {}", self.path.display()));
        Ok(())
    }
}

impl RecordView for TabStore {
    fn subscribe(&self, listener: TabListener) {
        match self.listeners.lock() {
            Ok(mut guard) => guard.push(listener),
            Err(error) => error.into_inner().push(listener),
        }
    }

    fn sorted_view(&self) -> Vec<TabRecord> {
        let records = self.lock_inner().records.values().cloned().collect();
        self.sort_records(records)
    }
}
