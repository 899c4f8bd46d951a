/// In-memory hosts for unit tests
use crate::background::{BrowserHost, MenuSurface, PageInjector, TargetPage};
use crate::error::{InjectionError, StoreError};
use crate::menus::MenuItem;
use crate::storage::{SettingsStore, StorageArea};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<(StorageArea, String), Value>>,
    pub fail_reads: Cell<bool>,
    pub fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn with(self, area: StorageArea, key: &str, value: Value) -> MemoryStore {
        self.put(area, key, value);
        self
    }

    pub fn put(&self, area: StorageArea, key: &str, value: Value) {
        self.values.borrow_mut().insert((area, key.to_string()), value);
    }

    pub fn value(&self, area: StorageArea, key: &str) -> Option<Value> {
        self.values.borrow().get(&(area, key.to_string())).cloned()
    }
}

impl SettingsStore for MemoryStore {
    async fn get(&self, area: StorageArea, key: &str) -> Result<Option<Value>, StoreError> {
        if self.fail_reads.get() {
            return Err(StoreError::Get {
                key: key.to_string(),
                message: "storage unavailable".to_string(),
            });
        }
        Ok(self.value(area, key))
    }

    async fn set(&self, area: StorageArea, key: &str, value: Value) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Set {
                key: key.to_string(),
                message: "quota exceeded".to_string(),
            });
        }
        self.put(area, key, value);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Injection {
    pub tab_id: i32,
    pub format_id: String,
    pub notify: bool,
}

/// Records every browser call it receives
#[derive(Default)]
pub struct FakeHost {
    pub store: MemoryStore,
    pub created: RefCell<Vec<MenuItem>>,
    pub removed_all: Cell<usize>,
    pub visibility: RefCell<Vec<(String, bool)>>,
    pub injections: RefCell<Vec<Injection>>,
    pub inject_error: RefCell<Option<InjectionError>>,
    /// Script runs but the page reports nothing copied
    pub page_fails: Cell<bool>,
}

impl FakeHost {
    pub const NOW: f64 = 1_700_000_000_000.0;

    pub fn new() -> FakeHost {
        FakeHost::default()
    }
}

impl SettingsStore for FakeHost {
    async fn get(&self, area: StorageArea, key: &str) -> Result<Option<Value>, StoreError> {
        self.store.get(area, key).await
    }

    async fn set(&self, area: StorageArea, key: &str, value: Value) -> Result<(), StoreError> {
        self.store.set(area, key, value).await
    }
}

impl MenuSurface for FakeHost {
    async fn remove_all(&self) -> Result<(), StoreError> {
        self.removed_all.set(self.removed_all.get() + 1);
        self.created.borrow_mut().clear();
        Ok(())
    }

    async fn create(&self, item: &MenuItem) -> Result<(), StoreError> {
        self.created.borrow_mut().push(item.clone());
        Ok(())
    }

    async fn set_visible(&self, id: &str, visible: bool) -> Result<(), StoreError> {
        self.visibility.borrow_mut().push((id.to_string(), visible));
        Ok(())
    }
}

impl PageInjector for FakeHost {
    async fn inject_copy(
        &self,
        tab: &TargetPage,
        format_id: &str,
        notify: bool,
    ) -> Result<bool, InjectionError> {
        if let Some(e) = self.inject_error.borrow().clone() {
            return Err(e);
        }
        self.injections.borrow_mut().push(Injection {
            tab_id: tab.id,
            format_id: format_id.to_string(),
            notify,
        });
        Ok(!self.page_fails.get())
    }
}

impl BrowserHost for FakeHost {
    fn now_ms(&self) -> f64 {
        Self::NOW
    }
}
