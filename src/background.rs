/// Background coordinator: menus, preference cache and copy triggers
use crate::error::{InjectionError, StoreError};
use crate::formats::{canonical_formats, FormatDefinition, SAFE_FALLBACK_ID};
use crate::menus::{
    menu_items, reconcile, resolve_default_format, resolve_task, safe_fallback, visible_ids,
    MenuItem,
};
use crate::render::PageMeta;
use crate::storage::{
    load_menu_overlay, save_default_format, save_menus, CopyHistory, HistoryEntry, Preferences,
    SettingsStore, StorageArea, DEFAULT_FORMAT_KEY, SHOW_NOTIFICATION_KEY,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use url::Url;

/// Keyboard command that copies with the default format
pub const COPY_DEFAULT_COMMAND: &str = "copy-default-format";

/// Context-menu API
#[allow(async_fn_in_trait)]
pub trait MenuSurface {
    async fn remove_all(&self) -> Result<(), StoreError>;

    async fn create(&self, item: &MenuItem) -> Result<(), StoreError>;

    async fn set_visible(&self, id: &str, visible: bool) -> Result<(), StoreError>;
}

/// Runs the copy inside a tab
#[allow(async_fn_in_trait)]
pub trait PageInjector {
    /// Resolves to whether any frame put something on the clipboard
    async fn inject_copy(
        &self,
        tab: &TargetPage,
        format_id: &str,
        notify: bool,
    ) -> Result<bool, InjectionError>;
}

/// Everything the coordinator needs from the browser
pub trait BrowserHost: SettingsStore + MenuSurface + PageInjector {
    /// Milliseconds since the epoch
    fn now_ms(&self) -> f64;
}

/// The tab a trigger targets, as reported by the browser
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetPage {
    pub id: i32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl TargetPage {
    pub fn new(id: i32, url: &str, title: &str) -> TargetPage {
        TargetPage {
            id,
            url: Some(url.to_string()),
            title: Some(title.to_string()),
        }
    }
}

const RESTRICTED_SCHEMES: [&str; 8] = [
    "chrome",
    "chrome-extension",
    "chrome-search",
    "edge",
    "about",
    "devtools",
    "view-source",
    "moz-extension",
];

/// Pages the browser never lets an extension script
pub fn is_restricted_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    if RESTRICTED_SCHEMES.contains(&parsed.scheme()) {
        return true;
    }

    match parsed.host_str() {
        Some("chromewebstore.google.com") | Some("addons.mozilla.org") => true,
        Some("chrome.google.com") => parsed.path().starts_with("/webstore"),
        Some("microsoftedge.microsoft.com") => parsed.path().starts_with("/addons"),
        _ => false,
    }
}

/// Where a copy request came from
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    MenuClick(String),
    ActionClick,
    Command(String),
}

/// Extension lifetime state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Loading,
    Ready,
    Reconciling,
}

/// In-process copy of the preferences the trigger path reads.
///
/// Every update swaps the whole snapshot; readers keep the one they took.
#[derive(Debug, Default)]
pub struct PreferenceCache {
    current: RefCell<Rc<Preferences>>,
}

impl PreferenceCache {
    pub fn snapshot(&self) -> Rc<Preferences> {
        self.current.borrow().clone()
    }

    pub fn replace(&self, prefs: Preferences) {
        *self.current.borrow_mut() = Rc::new(prefs);
    }

    /// Apply a storage change notification, keeping untouched fields.
    ///
    /// A removed key falls back to its default.
    pub fn apply_changes(&self, changes: &HashMap<String, StorageChange>) -> bool {
        let mut next = (*self.snapshot()).clone();
        let defaults = Preferences::default();
        let mut changed = false;

        if let Some(change) = changes.get(DEFAULT_FORMAT_KEY) {
            match &change.new_value {
                Some(Value::String(id)) => {
                    info!("Default format updated in cache: {}", id);
                    next.default_format = id.clone();
                    changed = true;
                }
                None => {
                    info!("Default format removed, cache reverts to {}", defaults.default_format);
                    next.default_format = defaults.default_format;
                    changed = true;
                }
                Some(other) => warn!("Ignoring malformed {} change: {}", DEFAULT_FORMAT_KEY, other),
            }
        }
        if let Some(change) = changes.get(SHOW_NOTIFICATION_KEY) {
            match &change.new_value {
                Some(Value::Bool(show)) => {
                    info!("Notification preference updated in cache: {}", show);
                    next.show_notification = *show;
                    changed = true;
                }
                None => {
                    info!("Notification preference removed, cache reverts to {}", defaults.show_notification);
                    next.show_notification = defaults.show_notification;
                    changed = true;
                }
                Some(other) => warn!("Ignoring malformed {} change: {}", SHOW_NOTIFICATION_KEY, other),
            }
        }

        if changed {
            self.replace(next);
        }
        changed
    }
}

/// One entry of a storage `onChanged` notification
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    #[serde(default)]
    pub old_value: Option<Value>,
    #[serde(default)]
    pub new_value: Option<Value>,
}

/// Message sent by the options page after it saved menu preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: bool,
}

/// Reply to a [`RefreshRequest`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshResponse {
    pub result: String,
}

impl RefreshResponse {
    pub const FINISHED: &'static str = "finished";
    pub const IGNORED: &'static str = "refreshMenus did nothing";

    fn finished() -> RefreshResponse {
        RefreshResponse {
            result: Self::FINISHED.to_string(),
        }
    }

    fn ignored() -> RefreshResponse {
        RefreshResponse {
            result: Self::IGNORED.to_string(),
        }
    }

    pub fn was_refreshed(&self) -> bool {
        self.result == Self::FINISHED
    }
}

/// Run the copy for `format_id` in `tab` and record it in the history.
///
/// `format_id` is validated against `canonical` first. Restricted pages are
/// refused without attempting injection. Returns the id actually used, or
/// [`InjectionError::NotCopied`] when the script ran but every clipboard
/// path failed; only real copies reach the history.
pub async fn copy_to_page<H: BrowserHost>(
    host: &H,
    canonical: &[FormatDefinition],
    format_id: &str,
    tab: &TargetPage,
    notify: bool,
) -> Result<String, InjectionError> {
    let fallback = safe_fallback(canonical).unwrap_or(SAFE_FALLBACK_ID);
    let task = resolve_task(format_id, canonical, fallback);

    if let Some(url) = tab.url.as_deref().filter(|url| is_restricted_url(url)) {
        error!("Cannot copy from restricted page: {}", url);
        return Err(InjectionError::RestrictedPage(url.to_string()));
    }

    let copied = match host.inject_copy(tab, &task, notify).await {
        Ok(copied) => copied,
        Err(e) => {
            match &e {
                InjectionError::RestrictedPage(url) => {
                    error!("Cannot copy from restricted page: {}", url)
                }
                InjectionError::Script(message) => error!(
                    "An unexpected error occurred during script execution on tab {}: {}",
                    tab.id, message
                ),
                InjectionError::NotCopied(_) => error!("{}", e),
            }
            return Err(e);
        }
    };

    if !copied {
        warn!("Copy in tab {} did not reach the clipboard", tab.id);
        return Err(InjectionError::NotCopied(tab.id));
    }

    record_history(host, tab).await;
    Ok(task)
}

async fn record_history<H: BrowserHost>(host: &H, tab: &TargetPage) {
    let Some(url) = tab.url.as_deref() else {
        return;
    };
    let page = PageMeta::new(tab.title.as_deref().unwrap_or_default(), url);
    if page.url.is_empty() {
        return;
    }

    let entry = HistoryEntry {
        url: page.url,
        title: page.title,
        timestamp: host.now_ms(),
    };
    if let Err(e) = CopyHistory::record(host, entry).await {
        warn!("Failed to record copy history: {}", e);
    }
}

/// Owns the canonical list, the preference cache and the lifecycle state
pub struct Background<H> {
    host: H,
    canonical: Vec<FormatDefinition>,
    cache: PreferenceCache,
    state: Cell<Lifecycle>,
}

impl<H: BrowserHost> Background<H> {
    pub fn new(host: H) -> Background<H> {
        Background::with_canonical(host, canonical_formats())
    }

    pub fn with_canonical(host: H, canonical: Vec<FormatDefinition>) -> Background<H> {
        Background {
            host,
            canonical,
            cache: PreferenceCache::default(),
            state: Cell::new(Lifecycle::Uninitialized),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn canonical(&self) -> &[FormatDefinition] {
        &self.canonical
    }

    pub fn state(&self) -> Lifecycle {
        self.state.get()
    }

    pub fn preferences(&self) -> Rc<Preferences> {
        self.cache.snapshot()
    }

    /// Install / update: reconcile and persist menus, rebuild the context
    /// menu, then fill the cache.
    ///
    /// Every store read happens before any menu item is created, so a store
    /// failure leaves no half-built menu behind.
    pub async fn initialize(&self) -> Result<Vec<FormatDefinition>, StoreError> {
        self.state.set(Lifecycle::Loading);
        match self.try_initialize().await {
            Ok(menus) => {
                self.state.set(Lifecycle::Ready);
                Ok(menus)
            }
            Err(e) => {
                self.state.set(Lifecycle::Uninitialized);
                Err(e)
            }
        }
    }

    async fn try_initialize(&self) -> Result<Vec<FormatDefinition>, StoreError> {
        let overlay = load_menu_overlay(&self.host).await?;
        let prefs = self.load_preferences().await?;

        let menus = reconcile(&self.canonical, overlay.as_deref());
        save_menus(&self.host, &menus).await?;

        self.host.remove_all().await?;
        for item in menu_items(&menus) {
            self.host.create(&item).await?;
        }

        self.cache.replace(prefs);
        Ok(menus)
    }

    /// Browser startup: the context menu survives restarts, only the cache
    /// needs filling.
    pub async fn load_cache(&self) -> Result<(), StoreError> {
        self.state.set(Lifecycle::Loading);
        match self.load_preferences().await {
            Ok(prefs) => {
                info!(
                    "Preferences loaded into cache: default format {}, notifications {}",
                    prefs.default_format, prefs.show_notification
                );
                self.cache.replace(prefs);
                self.state.set(Lifecycle::Ready);
                Ok(())
            }
            Err(e) => {
                error!("Error loading cache settings: {}", e);
                self.state.set(Lifecycle::Uninitialized);
                Err(e)
            }
        }
    }

    /// Read preferences and persist a corrected default format if the stored
    /// one no longer exists.
    async fn load_preferences(&self) -> Result<Preferences, StoreError> {
        let mut prefs = Preferences::load(&self.host).await?;

        if let Some((id, corrected)) = resolve_default_format(&prefs.default_format, &self.canonical)
        {
            if corrected {
                save_default_format(&self.host, &id).await?;
            }
            prefs.default_format = id;
        }
        Ok(prefs)
    }

    /// Handle a message from the options page
    pub async fn refresh(&self, request: &RefreshRequest) -> Result<RefreshResponse, StoreError> {
        if !request.refresh {
            return Ok(RefreshResponse::ignored());
        }

        let previous = self.state.replace(Lifecycle::Reconciling);
        let result = self.reconcile_menus().await;
        self.state.set(if result.is_ok() { Lifecycle::Ready } else { previous });
        result.map(|_| RefreshResponse::finished())
    }

    async fn reconcile_menus(&self) -> Result<Vec<FormatDefinition>, StoreError> {
        let overlay = load_menu_overlay(&self.host).await?;
        if overlay.is_none() {
            warn!("No stored menus, falling back to default menus");
        }

        let menus = reconcile(&self.canonical, overlay.as_deref());
        save_menus(&self.host, &menus).await?;

        for def in &menus {
            self.host.set_visible(&def.id, def.active).await?;
        }
        info!("Context menu refreshed, visible: {:?}", visible_ids(&menus));
        Ok(menus)
    }

    /// Storage `onChanged`: only the sync area carries preferences
    pub fn on_storage_changed(&self, changes: &HashMap<String, StorageChange>, area: StorageArea) {
        if area == StorageArea::Sync {
            self.cache.apply_changes(changes);
        }
    }

    /// The format a trigger asks for, before validation
    pub fn requested_format(&self, trigger: &Trigger) -> String {
        match trigger {
            Trigger::MenuClick(id) => id.clone(),
            Trigger::Command(name) if name != COPY_DEFAULT_COMMAND => name.clone(),
            Trigger::ActionClick | Trigger::Command(_) => self.preferences().default_format.clone(),
        }
    }

    /// Copy for a trigger.
    ///
    /// A worker restarted without a lifecycle event still has an empty
    /// cache, so it is filled from storage first.
    pub async fn handle_trigger(
        &self,
        trigger: &Trigger,
        tab: &TargetPage,
    ) -> Result<String, InjectionError> {
        if self.state() == Lifecycle::Uninitialized && self.load_cache().await.is_err() {
            warn!("Using default preferences for this copy");
        }

        let format_id = self.requested_format(trigger);
        let notify = self.preferences().show_notification;
        copy_to_page(&self.host, &self.canonical, &format_id, tab, notify).await
    }
}
