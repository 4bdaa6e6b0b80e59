//! Logging setup.
//!
//! Installs a fern dispatch writing to stdout, an in-memory ring buffer (for
//! the status surface), and optionally a file under the platform data
//! directory.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use log::LevelFilter;
use once_cell::sync::Lazy;

const RECENT_CAPACITY: usize = 200;

static RECENT: Lazy<Mutex<VecDeque<String>>> =
    Lazy::new(|| Mutex::new(VecDeque::with_capacity(RECENT_CAPACITY)));

/// Install the global logger. Safe to call more than once; only the first
/// call takes effect.
pub fn try_init(file_logging: bool) -> Result<()> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Info)
        .chain(std::io::stdout())
        .chain(fern::Output::call(|record| {
            let mut recent = RECENT.lock().unwrap();
            if recent.len() == RECENT_CAPACITY {
                recent.pop_front();
            }
            recent.push_back(record.args().to_string());
        }));

    if file_logging {
        if let Some(path) = log_file_path() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            dispatch = dispatch.chain(fern::log_file(path)?);
        }
    }

    // A second apply means a logger is already installed; keep it
    let _ = dispatch.apply();
    Ok(())
}

/// Recent log lines, newest first.
pub fn recent_logs() -> Vec<String> {
    let recent = RECENT.lock().unwrap();
    recent.iter().rev().cloned().collect()
}

/// Log file location under the platform data directory.
pub fn log_file_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("daylist").join("daylist.log"))
}
