//! Browser local storage backend (WASM only).

use super::storage::{KeyValueStore, StorageError};

/// `KeyValueStore` backed by `window.localStorage`.
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// Open the window's local storage, if the browser exposes one.
    pub fn open() -> Option<Self> {
        let window = web_sys::window()?;
        match window.local_storage() {
            Ok(Some(storage)) => Some(Self { storage }),
            Ok(None) => None,
            Err(err) => {
                log::warn!("Local storage unavailable: {:?}", err);
                None
            }
        }
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.storage
            .set_item(key, &value)
            .map_err(|err| StorageError::WriteFailed {
                key: key.to_string(),
                reason: format!("{:?}", err),
            })
    }
}
