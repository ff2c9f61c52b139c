// Application state module
// Immutable bundle handed to every request handler

use std::time::Instant;

use super::types::Config;
use crate::content::ContentTable;

/// Application state
///
/// Built once in `main` and shared by `Arc`. Nothing in it is mutated after
/// startup, so concurrent request handlers never contend.
pub struct AppState {
    pub config: Config,
    pub content: ContentTable,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, content: ContentTable) -> Self {
        Self {
            config,
            content,
            started_at: Instant::now(),
        }
    }

    /// Whole seconds since startup finished
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
