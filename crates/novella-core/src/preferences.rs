//! Small UI preference persistence.
//!
//! Peers of the core persist a handful of UI preferences as
//! JSON-serialized primitives under fixed string keys: library view
//! mode, filter-panel open state, recent search terms, and the
//! notification unread counter. The backing store is a collaborator
//! trait (browser local storage in the real host); [`MemoryStore`]
//! ships for tests and native hosts.
//!
//! Malformed stored values fall back to defaults — a corrupt preference
//! must never break the UI.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Fixed storage keys.
pub const VIEW_MODE_KEY: &str = "novella.view_mode";
pub const FILTER_PANEL_KEY: &str = "novella.filter_panel_open";
pub const RECENT_SEARCHES_KEY: &str = "novella.recent_searches";
pub const NOTIFICATION_UNREAD_KEY: &str = "novella.notification_unread";

/// String key-value storage collaborator.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store for tests and native hosts.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.map.lock() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.map.lock() {
            map.remove(key);
        }
    }
}

/// Library listing layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    List,
    Grid,
}

/// Typed access to the UI preferences.
pub struct UiPreferences<S: KeyValueStore> {
    store: S,
    recent_cap: usize,
}

impl<S: KeyValueStore> UiPreferences<S> {
    /// Wrap a store; recent searches are capped at `recent_cap`.
    #[must_use]
    pub fn new(store: S, recent_cap: usize) -> Self {
        Self {
            store,
            recent_cap: recent_cap.max(1),
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        self.read_or_default(VIEW_MODE_KEY)
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.write(VIEW_MODE_KEY, &mode);
    }

    pub fn filter_panel_open(&self) -> bool {
        self.read_or_default(FILTER_PANEL_KEY)
    }

    pub fn set_filter_panel_open(&self, open: bool) {
        self.write(FILTER_PANEL_KEY, &open);
    }

    /// Recent search terms, most recent first.
    pub fn recent_searches(&self) -> Vec<String> {
        self.read_or_default(RECENT_SEARCHES_KEY)
    }

    /// Record a search term: deduplicated, moved to the front, capped.
    pub fn push_recent_search(&self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            return;
        }
        let mut searches = self.recent_searches();
        searches.retain(|s| s != term);
        searches.insert(0, term.to_string());
        searches.truncate(self.recent_cap);
        self.write(RECENT_SEARCHES_KEY, &searches);
    }

    pub fn notification_unread(&self) -> u32 {
        self.read_or_default(NOTIFICATION_UNREAD_KEY)
    }

    pub fn set_notification_unread(&self, count: u32) {
        self.write(NOTIFICATION_UNREAD_KEY, &count);
    }

    pub fn clear_notification_unread(&self) {
        self.store.remove(NOTIFICATION_UNREAD_KEY);
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(raw) = self.store.get(key) else {
            return T::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            debug!(key, error = %e, "malformed stored preference, using default");
            T::default()
        })
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.store.set(key, &raw),
            Err(e) => debug!(key, error = %e, "failed to serialize preference"),
        }
    }
}
