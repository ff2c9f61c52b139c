// Preloaded content module
// The immutable route-name -> page-body mapping built once at startup

mod loader;

pub use loader::{load_content, LoadError};

use hyper::body::Bytes;
use std::collections::HashMap;

/// Route name reserved for the `/` endpoint; never served as `/index`.
pub const INDEX_ROUTE: &str = "index";

/// Immutable mapping from route name to preloaded page body.
///
/// Keys derive from filenames minus the `.html` extension. Entries are never
/// added, removed, or changed after startup; there is no hot reload.
#[derive(Debug, Default)]
pub struct ContentTable {
    entries: HashMap<String, Bytes>,
}

impl ContentTable {
    pub fn get(&self, name: &str) -> Option<&Bytes> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Route names in sorted order, for the root listing and startup summary
    pub fn route_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[cfg(test)]
    pub fn from_entries<I: IntoIterator<Item = (String, Bytes)>>(entries: I) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}
