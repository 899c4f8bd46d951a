/// Context-menu reconciliation: merge the stored overlay into the canonical list
use crate::formats::{FormatDefinition, SAFE_FALLBACK_ID};
use log::warn;
use serde::{Deserialize, Serialize};

/// A stored per-format override.
///
/// Older installs persisted full menu objects, so any extra fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuOverride {
    pub id: String,
    #[serde(default)]
    pub active: Option<bool>,
}

impl MenuOverride {
    pub fn new(id: &str, active: bool) -> MenuOverride {
        MenuOverride {
            id: id.to_string(),
            active: Some(active),
        }
    }
}

/// Merge the stored overlay into the canonical list.
///
/// The result always carries exactly the canonical ids in canonical order.
/// Unknown overlay ids are dropped and entries without an `active` flag keep
/// the canonical value. When an id repeats, the last entry with a flag wins.
pub fn reconcile(
    canonical: &[FormatDefinition],
    stored: Option<&[MenuOverride]>,
) -> Vec<FormatDefinition> {
    let overlay = stored.unwrap_or_default();

    canonical
        .iter()
        .map(|def| {
            let active = overlay
                .iter()
                .rev()
                .filter(|o| o.id == def.id)
                .find_map(|o| o.active)
                .unwrap_or(def.active);

            FormatDefinition {
                active,
                ..def.clone()
            }
        })
        .collect()
}

/// Return `candidate` if it names a canonical format, `fallback` otherwise
pub fn resolve_task(candidate: &str, canonical: &[FormatDefinition], fallback: &str) -> String {
    if contains_id(canonical, candidate) {
        candidate.to_string()
    } else {
        warn!(
            "Requested format {} unknown, falling back to {}",
            candidate, fallback
        );
        fallback.to_string()
    }
}

/// The fallback used when a stored default is stale.
///
/// `copyRichLink` while it exists, otherwise the first canonical entry.
pub fn safe_fallback(canonical: &[FormatDefinition]) -> Option<&str> {
    if contains_id(canonical, SAFE_FALLBACK_ID) {
        Some(SAFE_FALLBACK_ID)
    } else {
        canonical.first().map(|def| def.id.as_str())
    }
}

/// Validate a stored default-format id.
///
/// Returns the id to use and whether it differs from what was stored, in
/// which case the caller persists the correction.
pub fn resolve_default_format(
    stored: &str,
    canonical: &[FormatDefinition],
) -> Option<(String, bool)> {
    if contains_id(canonical, stored) {
        return Some((stored.to_string(), false));
    }

    let fallback = safe_fallback(canonical)?;
    warn!(
        "Default format {} is not available, switching to {}",
        stored, fallback
    );
    Some((fallback.to_string(), true))
}

/// One context-menu item to create
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    pub visible: bool,
}

/// Menu items for a reconciled list, in list order
pub fn menu_items(menus: &[FormatDefinition]) -> Vec<MenuItem> {
    menus
        .iter()
        .map(|def| MenuItem {
            id: def.id.clone(),
            title: def.title.clone(),
            visible: def.active,
        })
        .collect()
}

/// Ids of the entries that should currently show in the context menu
pub fn visible_ids(menus: &[FormatDefinition]) -> Vec<&str> {
    menus
        .iter()
        .filter(|def| def.active)
        .map(|def| def.id.as_str())
        .collect()
}

fn contains_id(canonical: &[FormatDefinition], id: &str) -> bool {
    canonical.iter().any(|def| def.id == id)
}
