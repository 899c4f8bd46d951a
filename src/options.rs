/// Options page: menu toggles, default format, notifications and history
use crate::error::StoreError;
use crate::formats::{FormatDefinition, SAFE_FALLBACK_ID};
use crate::menus::{reconcile, resolve_default_format, resolve_task, safe_fallback};
use crate::storage::{
    load_menu_overlay, save_default_format, save_menus, save_show_notification, CopyHistory,
    Preferences, SettingsStore,
};
use log::{info, warn};
use serde::Serialize;

/// The menu list the options page shows: stored toggles over the canonical list
pub async fn current_menus<S: SettingsStore>(
    store: &S,
    canonical: &[FormatDefinition],
) -> Result<Vec<FormatDefinition>, StoreError> {
    let overlay = load_menu_overlay(store).await?;
    Ok(reconcile(canonical, overlay.as_deref()))
}

/// Stored preferences with the default format checked against `canonical`
pub async fn current_preferences<S: SettingsStore>(
    store: &S,
    canonical: &[FormatDefinition],
) -> Result<Preferences, StoreError> {
    let mut prefs = Preferences::load(store).await?;
    if let Some((id, _)) = resolve_default_format(&prefs.default_format, canonical) {
        prefs.default_format = id;
    }
    Ok(prefs)
}

/// Toggle one context-menu entry and persist the full reconciled list.
///
/// Unknown ids leave every entry as it was. The caller asks the service
/// worker to refresh afterwards.
pub async fn set_menu_active<S: SettingsStore>(
    store: &S,
    canonical: &[FormatDefinition],
    id: &str,
    active: bool,
) -> Result<Vec<FormatDefinition>, StoreError> {
    let mut menus = current_menus(store, canonical).await?;

    match menus.iter_mut().find(|def| def.id == id) {
        Some(def) => def.active = active,
        None => warn!("Cannot toggle unknown menu {}", id),
    }

    save_menus(store, &menus).await?;
    Ok(menus)
}

/// Persist the icon-click format. Unknown ids store the safe fallback.
pub async fn set_default_format<S: SettingsStore>(
    store: &S,
    canonical: &[FormatDefinition],
    id: &str,
) -> Result<String, StoreError> {
    let fallback = safe_fallback(canonical).unwrap_or(SAFE_FALLBACK_ID);
    let id = resolve_task(id, canonical, fallback);
    save_default_format(store, &id).await?;
    info!("Default format set to {}", id);
    Ok(id)
}

pub async fn set_show_notification<S: SettingsStore>(store: &S, show: bool) -> Result<(), StoreError> {
    save_show_notification(store, show).await
}

/// One row of the history list
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryLink {
    pub url: String,
    pub label: String,
    pub timestamp: f64,
}

/// Copy history, newest first, ready for display
pub async fn history_links<S: SettingsStore>(store: &S) -> Result<Vec<HistoryLink>, StoreError> {
    let history = CopyHistory::load(store).await?;
    Ok(history
        .entries
        .iter()
        .map(|entry| HistoryLink {
            url: entry.url.clone(),
            label: entry.label().to_string(),
            timestamp: entry.timestamp,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::{Background, RefreshRequest};
    use crate::formats::canonical_formats;
    use crate::storage::{
        HistoryEntry, StorageArea, CONTEXT_MENUS_KEY, DEFAULT_FORMAT_KEY, SHOW_NOTIFICATION_KEY,
    };
    use crate::testing::{FakeHost, MemoryStore};
    use futures::executor::block_on;
    use serde_json::json;

    fn stored_menus(store: &MemoryStore) -> Vec<FormatDefinition> {
        serde_json::from_value(store.value(StorageArea::Sync, CONTEXT_MENUS_KEY).unwrap()).unwrap()
    }

    #[test]
    fn test_set_menu_active_persists_complete_list() {
        let store = MemoryStore::new().with(
            StorageArea::Sync,
            CONTEXT_MENUS_KEY,
            json!([{"id": "copyTitle", "active": true}, {"id": "gone", "active": true}]),
        );
        let canonical = canonical_formats();

        let menus = block_on(set_menu_active(&store, &canonical, "copyUrl", true)).unwrap();

        let stored = stored_menus(&store);
        assert_eq!(stored, menus);
        assert_eq!(stored.len(), canonical.len());
        assert!(stored.iter().find(|m| m.id == "copyUrl").unwrap().active);
        assert!(stored.iter().find(|m| m.id == "copyTitle").unwrap().active);
        assert!(!stored.iter().any(|m| m.id == "gone"));
    }

    #[test]
    fn test_set_menu_active_unknown_id_changes_nothing() {
        let store = MemoryStore::new();
        let canonical = canonical_formats();

        let menus = block_on(set_menu_active(&store, &canonical, "copyBogus", true)).unwrap();

        assert_eq!(menus, canonical);
        assert_eq!(stored_menus(&store), canonical);
    }

    #[test]
    fn test_toggle_then_refresh_updates_visibility() {
        let background = Background::new(FakeHost::new());
        block_on(background.initialize()).unwrap();

        block_on(set_menu_active(background.host(), background.canonical(), "copyRichLink", false)).unwrap();
        let response = block_on(background.refresh(&RefreshRequest { refresh: true })).unwrap();

        assert!(response.was_refreshed());
        let visibility = background.host().visibility.borrow();
        assert_eq!(visibility[0], ("copyRichLink".to_string(), false));
    }

    #[test]
    fn test_set_default_format_validates_id() {
        let store = MemoryStore::new();
        let canonical = canonical_formats();

        assert_eq!(
            block_on(set_default_format(&store, &canonical, "copyUrlAsHtml")).unwrap(),
            "copyUrlAsHtml"
        );
        assert_eq!(
            store.value(StorageArea::Sync, DEFAULT_FORMAT_KEY),
            Some(json!("copyUrlAsHtml"))
        );

        assert_eq!(
            block_on(set_default_format(&store, &canonical, "copyBogus")).unwrap(),
            "copyRichLink"
        );
        assert_eq!(
            store.value(StorageArea::Sync, DEFAULT_FORMAT_KEY),
            Some(json!("copyRichLink"))
        );
    }

    #[test]
    fn test_set_show_notification() {
        let store = MemoryStore::new();

        block_on(set_show_notification(&store, false)).unwrap();

        assert_eq!(store.value(StorageArea::Sync, SHOW_NOTIFICATION_KEY), Some(json!(false)));
        let prefs = block_on(current_preferences(&store, &canonical_formats())).unwrap();
        assert!(!prefs.show_notification);
    }

    #[test]
    fn test_current_preferences_hides_stale_default_without_writing() {
        let store = MemoryStore::new().with(StorageArea::Sync, DEFAULT_FORMAT_KEY, json!("copyGone"));

        let prefs = block_on(current_preferences(&store, &canonical_formats())).unwrap();

        assert_eq!(prefs.default_format, "copyRichLink");
        assert_eq!(store.value(StorageArea::Sync, DEFAULT_FORMAT_KEY), Some(json!("copyGone")));
    }

    #[test]
    fn test_history_links_read_back_recorded_copies() {
        let store = MemoryStore::new();
        for (url, title, timestamp) in [("https://a.example/", "A", 1.0), ("https://b.example/", "", 2.0)] {
            let entry = HistoryEntry {
                url: url.to_string(),
                title: title.to_string(),
                timestamp,
            };
            block_on(CopyHistory::record(&store, entry)).unwrap();
        }

        let links = block_on(history_links(&store)).unwrap();

        assert_eq!(
            links,
            vec![
                HistoryLink {
                    url: "https://b.example/".to_string(),
                    label: "https://b.example/".to_string(),
                    timestamp: 2.0
                },
                HistoryLink {
                    url: "https://a.example/".to_string(),
                    label: "A".to_string(),
                    timestamp: 1.0
                },
            ]
        );
    }

    #[test]
    fn test_history_links_empty_store() {
        assert!(block_on(history_links(&MemoryStore::new())).unwrap().is_empty());
    }
}
