//! Browser LocalStorage backend

use web_sys::Storage;

use super::{Store, StoreError};

pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    /// Open the window's LocalStorage
    pub fn open() -> Result<Self, StoreError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StoreError::Unavailable("LocalStorage not available".to_string()))?;
        Ok(Self { storage })
    }
}

fn js_error(key: &str, err: wasm_bindgen::JsValue) -> StoreError {
    StoreError::Unavailable(format!("LocalStorage '{}': {:?}", key, err))
}

impl Store for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(|e| js_error(key, e))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(|e| js_error(key, e))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage.remove_item(key).map_err(|e| js_error(key, e))
    }

    /// Restores earlier values if a later write fails (quota exceeded)
    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let mut previous = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let before = self.get(key)?;
            if let Err(e) = self.set(key, value) {
                for (key, before) in previous.into_iter().rev() {
                    let _ = match before {
                        Some(v) => self.set(key, &v),
                        None => self.remove(key),
                    };
                }
                return Err(e);
            }
            previous.push((*key, before));
        }
        Ok(())
    }
}
