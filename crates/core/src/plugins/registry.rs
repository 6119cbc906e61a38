//! Plugin registry
//!
//! Maps plugin ids to plugin instances. Built once at startup, then shared
//! read-only behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::adapter::Plugin;

/// Id to plugin lookup table.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under its own id.
    ///
    /// A plugin already registered under that id is replaced and returned.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Option<Arc<dyn Plugin>> {
        let id = plugin.id().to_string();
        let previous = self.plugins.insert(id.clone(), plugin);
        if previous.is_some() {
            warn!(plugin_id = %id, "Plugin re-registered; previous instance replaced");
        } else {
            debug!(plugin_id = %id, "Plugin registered");
        }
        previous
    }

    pub fn unregister(&mut self, id: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(id).cloned()
    }

    /// Every registered plugin, sorted by id.
    pub fn get_all(&self) -> Vec<Arc<dyn Plugin>> {
        let mut plugins: Vec<_> = self.plugins.values().cloned().collect();
        plugins.sort_by(|a, b| a.id().cmp(b.id()));
        plugins
    }

    pub fn has(&self, id: &str) -> bool {
        self.plugins.contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.plugins.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry").field("plugins", &self.ids()).finish()
    }
}
