//! Centralized configuration for livelist.
//!
//! Constants for fetch requests, execution contexts and the SQLite store.

use std::time::Duration;

/// Fetch request defaults.
pub struct FetchConfig;

impl FetchConfig {
    /// A fetch limit of zero means "no limit".
    pub const UNBOUNDED_FETCH_LIMIT: usize = 0;
    pub const DEFAULT_FETCH_OFFSET: usize = 0;
    /// Separates the controller type tag from the unique token in cache names.
    pub const CACHE_NAME_SEPARATOR: &'static str = ".";
    pub const FETCH_FAILED_MESSAGE: &'static str = "Failed to perform fetch on FetchedResults";
}

/// Execution context settings.
pub struct ContextConfig;

impl ContextConfig {
    pub const MAIN_CONTEXT_LABEL: &'static str = "main";
}

/// SQLite store settings.
pub struct StoreConfig;

impl StoreConfig {
    pub const BUSY_TIMEOUT: Duration = Duration::from_secs(30);
    pub const FILE_PRAGMAS: &'static str = "
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;
        PRAGMA temp_store=MEMORY;
    ";
}
