use std::cell::RefCell;
use std::collections::HashMap;

use web_sys::{Storage, Window};

use crate::error::PageError;

pub const TOKEN_STORAGE_KEY: &'static str = "token";
pub const USERNAME_STORAGE_KEY: &'static str = "username";
pub const ROLE_STORAGE_KEY: &'static str = "role";

pub const ADMIN_ROLE: &'static str = "admin";

/// String key/value storage that outlives the page, e.g. `localStorage`.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn clear(&self, key: &str);
}

/// The logged-in user as recorded by the login page.
///
/// Read once per page load and passed to whatever needs it; changes made by
/// another tab only show up after a reload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub username: Option<String>,
    pub role: Option<String>,
}

impl Session {
    pub fn load(store: &dyn SessionStore) -> Self {
        Session {
            token: store.get(TOKEN_STORAGE_KEY).filter(|token| !token.is_empty()),
            username: store.get(USERNAME_STORAGE_KEY),
            role: store.get(ROLE_STORAGE_KEY),
        }
    }

    pub fn persist(&self, store: &dyn SessionStore) {
        let fields = [
            (TOKEN_STORAGE_KEY, &self.token),
            (USERNAME_STORAGE_KEY, &self.username),
            (ROLE_STORAGE_KEY, &self.role),
        ];
        for (key, value) in fields {
            match value {
                Some(value) => store.set(key, value),
                None => store.clear(key),
            }
        }
    }

    /// Logout: the three keys always go together.
    pub fn clear(store: &dyn SessionStore) {
        store.clear(TOKEN_STORAGE_KEY);
        store.clear(USERNAME_STORAGE_KEY);
        store.clear(ROLE_STORAGE_KEY);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    pub fn from_window(window: &Window) -> Result<Self, PageError> {
        let storage = window
            .local_storage()
            .map_err(PageError::js)?
            .ok_or(PageError::MissingElement("window.localStorage"))?;

        Ok(LocalStorageStore { storage })
    }
}

impl SessionStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(err) = self.storage.set_item(key, value) {
            log::warn!("could not store {}: {:?}", key, err);
        }
    }

    fn clear(&self, key: &str) {
        if let Err(err) = self.storage.remove_item(key) {
            log::warn!("could not remove {}: {:?}", key, err);
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.items.borrow_mut().insert(key.to_owned(), value.to_owned());
    }

    fn clear(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}
