/// Copy Link - browser extension that copies the page URL and title
/// Built with Rust + WASM

mod background;
mod chrome;
mod clipboard;
mod error;
mod formats;
mod menus;
mod options;
mod page;
mod popup;
mod render;
mod sanitize;
mod storage;
#[cfg(test)]
mod testing;

pub use background::{Background, Lifecycle, RefreshRequest, RefreshResponse, TargetPage, Trigger};
pub use clipboard::{ClipboardTarget, FeedbackSink, Indicator, WriteOutcome};
pub use error::{ClipboardError, InjectionError, StoreError};
pub use formats::{canonical_formats, Format, FormatDefinition};
pub use menus::{reconcile, resolve_task, MenuOverride};
pub use page::{CopyInterceptor, DomClipboard};
pub use render::{ClipboardPayload, PageMeta};

use background::StorageChange;
use chrome::ChromeHost;
use std::collections::HashMap;
use std::rc::Rc;
use storage::{RecentFormats, StorageArea};
use wasm_bindgen::prelude::*;

thread_local! {
    static BACKGROUND: Rc<Background<ChromeHost>> = Rc::new(Background::new(ChromeHost));
}

fn background() -> Rc<Background<ChromeHost>> {
    BACKGROUND.with(Rc::clone)
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_tab(tab: JsValue) -> Result<TargetPage, JsValue> {
    serde_wasm_bindgen::from_value(tab).map_err(|e| to_js_error(format!("Failed to parse tab: {}", e)))
}

// Set up panic hook and logging for every context the module is loaded in
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    wasm_logger::init(wasm_logger::Config::new(level));
}

// Service worker entry points

/// `runtime.onInstalled`: reconcile menus and fill the cache.
/// Store failures reject so a broken install is visible.
#[wasm_bindgen]
pub async fn on_installed() -> Result<(), JsValue> {
    background().initialize().await.map(|_| ()).map_err(to_js_error)
}

/// `runtime.onStartup`
#[wasm_bindgen]
pub async fn on_startup() -> Result<(), JsValue> {
    background().load_cache().await.map_err(to_js_error)
}

/// `runtime.onMessage` from the options page; resolves to `{result}`
#[wasm_bindgen]
pub async fn on_message(message: JsValue) -> Result<JsValue, JsValue> {
    let request: RefreshRequest = serde_wasm_bindgen::from_value(message).unwrap_or_default();
    let response = background().refresh(&request).await.map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&response).map_err(to_js_error)
}

/// `storage.onChanged`
#[wasm_bindgen]
pub fn on_storage_changed(changes: JsValue, area: String) -> Result<(), JsValue> {
    let Some(area) = StorageArea::from_name(&area) else {
        return Ok(());
    };
    let changes: HashMap<String, StorageChange> =
        serde_wasm_bindgen::from_value(changes).map_err(to_js_error)?;
    background().on_storage_changed(&changes, area);
    Ok(())
}

async fn trigger(trigger: Trigger, tab: JsValue) -> Result<(), JsValue> {
    let tab = parse_tab(tab)?;
    // Injection failures are logged by the coordinator and never retried
    let _ = background().handle_trigger(&trigger, &tab).await;
    Ok(())
}

/// `contextMenus.onClicked`
#[wasm_bindgen]
pub async fn on_menu_clicked(menu_item_id: String, tab: JsValue) -> Result<(), JsValue> {
    trigger(Trigger::MenuClick(menu_item_id), tab).await
}

/// `action.onClicked`
#[wasm_bindgen]
pub async fn on_action_clicked(tab: JsValue) -> Result<(), JsValue> {
    trigger(Trigger::ActionClick, tab).await
}

/// `commands.onCommand`
#[wasm_bindgen]
pub async fn on_command(command: String, tab: JsValue) -> Result<(), JsValue> {
    trigger(Trigger::Command(command), tab).await
}

// Page context entry point

/// Runs inside the target tab; resolves to whether the copy succeeded
#[wasm_bindgen]
pub async fn copy_in_page(format_id: String, notify: bool) -> Result<bool, JsValue> {
    page::copy_current_page(&format_id, notify).await
}

// Popup entry points

/// Copy from a popup button. Rejects with a message when the page is
/// restricted or the script could not run.
#[wasm_bindgen]
pub async fn popup_copy(format_id: String, tab: JsValue) -> Result<String, JsValue> {
    let tab = parse_tab(tab)?;
    popup::copy_from_popup(&ChromeHost, &canonical_formats(), &format_id, &tab)
        .await
        .map_err(to_js_error)
}

#[wasm_bindgen]
pub fn popup_preview(format_id: String, title: String, url: String) -> String {
    popup::preview_for_id(&format_id, &title, &url)
}

/// Canonical formats, for rendering the popup's button list
#[wasm_bindgen]
pub fn popup_formats() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&canonical_formats()).map_err(to_js_error)
}

/// Recently used formats that still exist, newest first
#[wasm_bindgen]
pub async fn popup_recent_formats() -> Result<JsValue, JsValue> {
    let recent = RecentFormats::load(&ChromeHost).await.map_err(to_js_error)?;
    let canonical = canonical_formats();
    let defs = popup::recent_definitions(&recent, &canonical);
    serde_wasm_bindgen::to_value(&defs).map_err(to_js_error)
}

// Options page entry points

/// Reconciled menu list for the toggles
#[wasm_bindgen]
pub async fn options_menus() -> Result<JsValue, JsValue> {
    let menus = options::current_menus(&ChromeHost, &canonical_formats())
        .await
        .map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&menus).map_err(to_js_error)
}

/// `{defaultFormat, showNotification}`
#[wasm_bindgen]
pub async fn options_preferences() -> Result<JsValue, JsValue> {
    let prefs = options::current_preferences(&ChromeHost, &canonical_formats())
        .await
        .map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&prefs).map_err(to_js_error)
}

/// Persist one toggle, then have the service worker refresh the menu.
/// Resolves to the worker's `{result}` reply.
#[wasm_bindgen]
pub async fn options_set_menu_active(id: String, active: bool) -> Result<JsValue, JsValue> {
    options::set_menu_active(&ChromeHost, &canonical_formats(), &id, active)
        .await
        .map_err(to_js_error)?;
    let response = chrome::request_refresh().await?;
    serde_wasm_bindgen::to_value(&response).map_err(to_js_error)
}

/// Resolves to the id actually stored
#[wasm_bindgen]
pub async fn options_set_default_format(format_id: String) -> Result<String, JsValue> {
    options::set_default_format(&ChromeHost, &canonical_formats(), &format_id)
        .await
        .map_err(to_js_error)
}

#[wasm_bindgen]
pub async fn options_set_show_notification(show: bool) -> Result<(), JsValue> {
    options::set_show_notification(&ChromeHost, show)
        .await
        .map_err(to_js_error)
}

/// Copy history as `[{url, label, timestamp}]`, newest first
#[wasm_bindgen]
pub async fn options_history() -> Result<JsValue, JsValue> {
    let links = options::history_links(&ChromeHost).await.map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&links).map_err(to_js_error)
}
