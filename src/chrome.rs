/// Browser host backed by the chrome.* extension APIs
use crate::background::{BrowserHost, MenuSurface, PageInjector, RefreshRequest, RefreshResponse, TargetPage};
use crate::error::{InjectionError, StoreError};
use crate::menus::MenuItem;
use crate::page::js_message;
use crate::storage::{SettingsStore, StorageArea};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/js/background.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn storageGet(area: &str, key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageSet(area: &str, key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeAllMenus() -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn createMenu(id: &str, title: &str, visible: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn updateMenu(id: &str, visible: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn injectCopy(tab_id: i32, format_id: &str, notify: bool) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendMessage(message: JsValue) -> Result<JsValue, JsValue>;
}

/// The real browser
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeHost;

impl SettingsStore for ChromeHost {
    async fn get(&self, area: StorageArea, key: &str) -> Result<Option<Value>, StoreError> {
        let value_js = storageGet(area.name(), key)
            .await
            .map_err(|e| StoreError::Get {
                key: key.to_string(),
                message: js_message(&e),
            })?;

        if value_js.is_null() || value_js.is_undefined() {
            return Ok(None);
        }

        serde_wasm_bindgen::from_value(value_js)
            .map(Some)
            .map_err(|e| StoreError::Malformed {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    async fn set(&self, area: StorageArea, key: &str, value: Value) -> Result<(), StoreError> {
        let value_js = value
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| StoreError::Malformed {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        storageSet(area.name(), key, value_js)
            .await
            .map_err(|e| StoreError::Set {
                key: key.to_string(),
                message: js_message(&e),
            })
    }
}

fn menu_error(e: JsValue) -> StoreError {
    StoreError::Menu(js_message(&e))
}

impl MenuSurface for ChromeHost {
    async fn remove_all(&self) -> Result<(), StoreError> {
        removeAllMenus().await.map_err(menu_error)
    }

    async fn create(&self, item: &MenuItem) -> Result<(), StoreError> {
        createMenu(&item.id, &item.title, item.visible)
            .await
            .map_err(menu_error)
    }

    async fn set_visible(&self, id: &str, visible: bool) -> Result<(), StoreError> {
        updateMenu(id, visible).await.map_err(menu_error)
    }
}

impl PageInjector for ChromeHost {
    async fn inject_copy(
        &self,
        tab: &TargetPage,
        format_id: &str,
        notify: bool,
    ) -> Result<bool, InjectionError> {
        injectCopy(tab.id, format_id, notify)
            .await
            .map(|copied| copied.as_bool().unwrap_or(false))
            .map_err(|e| InjectionError::classify(&js_message(&e), tab.url.as_deref()))
    }
}

impl BrowserHost for ChromeHost {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

/// Ask the service worker to re-apply the stored menus
pub async fn request_refresh() -> Result<RefreshResponse, JsValue> {
    let message = serde_wasm_bindgen::to_value(&RefreshRequest { refresh: true })
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let reply = sendMessage(message).await?;
    serde_wasm_bindgen::from_value(reply).map_err(|e| JsValue::from_str(&e.to_string()))
}
