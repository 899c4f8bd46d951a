/// Persisted configuration: keys, typed values and the store port
use crate::error::StoreError;
use crate::formats::{FormatDefinition, SAFE_FALLBACK_ID};
use crate::menus::MenuOverride;
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CONTEXT_MENUS_KEY: &str = "contextMenus";
pub const DEFAULT_FORMAT_KEY: &str = "defaultFormat";
pub const SHOW_NOTIFICATION_KEY: &str = "showNotification";
pub const RECENT_FORMATS_KEY: &str = "recentFormats";
pub const COPY_HISTORY_KEY: &str = "copyHistory";

pub const MAX_HISTORY: usize = 20;
pub const MAX_RECENT_FORMATS: usize = 3;

/// Which storage area a key lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageArea {
    /// Synced across the user's browsers
    Sync,
    /// This device only
    Local,
}

impl StorageArea {
    pub fn name(self) -> &'static str {
        match self {
            StorageArea::Sync => "sync",
            StorageArea::Local => "local",
        }
    }

    pub fn from_name(name: &str) -> Option<StorageArea> {
        match name {
            "sync" => Some(StorageArea::Sync),
            "local" => Some(StorageArea::Local),
            _ => None,
        }
    }
}

/// Keyed async storage. Writes replace the whole value.
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    async fn get(&self, area: StorageArea, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, area: StorageArea, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Read and deserialize one key
pub async fn read<S, T>(store: &S, area: StorageArea, key: &str) -> Result<Option<T>, StoreError>
where
    S: SettingsStore,
    T: DeserializeOwned,
{
    match store.get(area, key).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Malformed {
                key: key.to_string(),
                message: e.to_string(),
            }),
    }
}

/// Serialize and write one key
pub async fn write<S, T>(store: &S, area: StorageArea, key: &str, value: &T) -> Result<(), StoreError>
where
    S: SettingsStore,
    T: Serialize,
{
    let value = serde_json::to_value(value).map_err(|e| StoreError::Malformed {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set(area, key, value).await
}

/// Cached preferences read on every trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_show_notification")]
    pub show_notification: bool,
}

fn default_format() -> String {
    SAFE_FALLBACK_ID.to_string()
}

fn default_show_notification() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            default_format: default_format(),
            show_notification: default_show_notification(),
        }
    }
}

impl Preferences {
    /// Load both preferences.
    ///
    /// Only a failing store is an error. A `defaultFormat` of the wrong type
    /// comes back as an empty id, which no format matches, so the caller's
    /// stale-default check replaces and persists it. A malformed
    /// `showNotification` reads as the default.
    pub async fn load<S: SettingsStore>(store: &S) -> Result<Preferences, StoreError> {
        let default_format = match read::<_, Value>(store, StorageArea::Sync, DEFAULT_FORMAT_KEY).await? {
            None => default_format(),
            Some(Value::String(id)) => id,
            Some(other) => {
                warn!("Ignoring malformed {}: {}", DEFAULT_FORMAT_KEY, other);
                String::new()
            }
        };
        let show_notification = match read::<_, Value>(store, StorageArea::Sync, SHOW_NOTIFICATION_KEY).await? {
            None => default_show_notification(),
            Some(Value::Bool(show)) => show,
            Some(other) => {
                warn!("Ignoring malformed {}: {}", SHOW_NOTIFICATION_KEY, other);
                default_show_notification()
            }
        };

        Ok(Preferences {
            default_format,
            show_notification,
        })
    }
}

/// Read the stored menu overlay.
///
/// Entries without a string `id` are skipped and an `active` that is not a
/// boolean is treated as missing. A value that is not a list reads as no
/// overlay at all.
pub async fn load_menu_overlay<S: SettingsStore>(
    store: &S,
) -> Result<Option<Vec<MenuOverride>>, StoreError> {
    let stored: Option<Value> = read(store, StorageArea::Sync, CONTEXT_MENUS_KEY).await?;

    match stored {
        None => Ok(None),
        Some(Value::Array(entries)) => Ok(Some(entries.iter().filter_map(overlay_entry).collect())),
        Some(other) => {
            warn!("Ignoring malformed {}: {}", CONTEXT_MENUS_KEY, other);
            Ok(None)
        }
    }
}

fn overlay_entry(entry: &Value) -> Option<MenuOverride> {
    let id = entry.get("id")?.as_str()?;
    Some(MenuOverride {
        id: id.to_string(),
        active: entry.get("active").and_then(Value::as_bool),
    })
}

pub async fn save_menus<S: SettingsStore>(
    store: &S,
    menus: &[FormatDefinition],
) -> Result<(), StoreError> {
    write(store, StorageArea::Sync, CONTEXT_MENUS_KEY, &menus).await
}

pub async fn save_default_format<S: SettingsStore>(store: &S, id: &str) -> Result<(), StoreError> {
    write(store, StorageArea::Sync, DEFAULT_FORMAT_KEY, &id).await
}

pub async fn save_show_notification<S: SettingsStore>(store: &S, show: bool) -> Result<(), StoreError> {
    write(store, StorageArea::Sync, SHOW_NOTIFICATION_KEY, &show).await
}

/// A page that was copied
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    pub timestamp: f64,
}

impl HistoryEntry {
    /// Link text for the history list: the title, or the URL when untitled
    pub fn label(&self) -> &str {
        if self.title.is_empty() { &self.url } else { &self.title }
    }
}

/// Recently copied pages, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CopyHistory {
    pub entries: Vec<HistoryEntry>,
}

impl CopyHistory {
    pub fn add(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_HISTORY);
    }

    /// A corrupted history is dropped rather than blocking new entries
    pub async fn load<S: SettingsStore>(store: &S) -> Result<CopyHistory, StoreError> {
        match read(store, StorageArea::Local, COPY_HISTORY_KEY).await {
            Ok(history) => Ok(history.unwrap_or_default()),
            Err(StoreError::Malformed { key, message }) => {
                warn!("Discarding malformed {}: {}", key, message);
                Ok(CopyHistory::default())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn save<S: SettingsStore>(&self, store: &S) -> Result<(), StoreError> {
        write(store, StorageArea::Local, COPY_HISTORY_KEY, self).await
    }

    /// Load, prepend `entry`, save
    pub async fn record<S: SettingsStore>(store: &S, entry: HistoryEntry) -> Result<(), StoreError> {
        let mut history = CopyHistory::load(store).await?;
        history.add(entry);
        history.save(store).await
    }
}

/// Formats most recently used from the popup, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RecentFormats {
    pub ids: Vec<String>,
}

impl RecentFormats {
    pub fn push(&mut self, id: &str) {
        self.ids.retain(|existing| existing != id);
        self.ids.insert(0, id.to_string());
        self.ids.truncate(MAX_RECENT_FORMATS);
    }

    pub async fn load<S: SettingsStore>(store: &S) -> Result<RecentFormats, StoreError> {
        Ok(read(store, StorageArea::Sync, RECENT_FORMATS_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn save<S: SettingsStore>(&self, store: &S) -> Result<(), StoreError> {
        write(store, StorageArea::Sync, RECENT_FORMATS_KEY, self).await
    }
}
