//! Constants used throughout the application
//!
//! This module centralizes magic strings and other constant values
//! to improve maintainability and consistency.

/// Name assigned to a restored list whose remote document lacks one
pub const DEFAULT_LIST_NAME: &str = "Unnamed List";

/// Quiet period applied before a search query fires
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Document id of the connectivity probe written before every backup/restore
pub const CONNECTIVITY_DOC_ID: &str = "connectivity";

/// Job key for the periodic auto-backup
pub const AUTO_BACKUP_JOB_KEY: &str = "auto-backup";

/// Maximum allowed auto-backup interval in hours (one week)
pub const MAX_AUTO_BACKUP_INTERVAL_HOURS: u64 = 168;

/// Suffix appended to the name of a duplicated list
pub const DUPLICATE_NAME_SUFFIX: &str = " copy";
