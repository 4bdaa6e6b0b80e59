//! Utility functions for date/time handling and other helpers.

pub mod datetime;
