//! Daylist - a personal task manager with cloud backup
//!
//! This library implements the core of a task-management application: lists
//! of tasks with sub-steps and attachments in a local SQLite database, an
//! optional remote mirror in a cloud document store, reminder scheduling,
//! and CSV/JSON export.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`config`] - Application configuration management
//! * [`storage`] - Local database and data persistence
//! * [`repositories`] - Repository layer for database operations
//! * [`remote`] - Remote document-store clients and authentication
//! * [`sync`] - Backup/restore orchestration against the remote store
//! * [`jobs`] - Keyed one-shot and periodic job scheduling
//! * [`reminders`] - Reminder notification scheduling
//! * [`export`] - CSV/JSON export of all tasks
//! * [`settings`] - User-facing settings with reactive streams

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// SeaORM entity models for database tables
pub mod entities;

/// CSV and JSON export of tasks
pub mod export;

/// Keyed job scheduling over tokio tasks
pub mod jobs;

/// Logging setup and the in-memory log buffer
pub mod logger;

/// Reminder notification scheduling
pub mod reminders;

/// Remote document-store abstraction and implementations
pub mod remote;

/// Repository layer for database operations
pub mod repositories;

/// Debounced task search
pub mod search;

/// User-facing settings persisted as key-value preferences
pub mod settings;

/// Local storage layer
pub mod storage;

/// Backup/restore orchestration
pub mod sync;

/// Utility functions for date/time handling and other helpers
pub mod utils;

// Re-export entity models for convenient access
pub use entities::{attachment, list, step, task};
