//! Session log for MosaicFE.
//!
//! One file per session in the platform data directory, truncated on every
//! launch:
//!
//!   Windows:  `%APPDATA%\MosaicFE\mosaicfe.log`
//!   Linux:    `$XDG_DATA_HOME/MosaicFE/mosaicfe.log` (or `~/.local/share/...`)
//!   macOS:    `~/Library/Application Support/MosaicFE/mosaicfe.log`
//!
//! Use the `log_info!` / `log_warn!` / `log_err!` macros. Until [`init`] has
//! run they do nothing, which keeps the engine silent inside unit tests and
//! the headless CLI.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

static SESSION_LOG: OnceLock<Mutex<File>> = OnceLock::new();
static SESSION_LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Path of the active session log, if one was opened.
pub fn log_path() -> Option<&'static PathBuf> {
    SESSION_LOG_PATH.get()
}

/// Append a raw line. I/O errors are swallowed.
pub fn write_line(line: &str) {
    if let Some(mutex) = SESSION_LOG.get()
        && let Ok(mut file) = mutex.lock()
    {
        let _ = writeln!(file, "{}", line);
    }
}

/// Append a `[HH:MM:SS] [LEVEL] message` line.
pub fn write(level: &str, msg: &str) {
    write_line(&format!("[{}] [{}] {}", clock_time(), level, msg));
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::write("INFO", &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::write("WARN", &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::write("ERROR", &format!($($arg)*));
    };
}

/// Open (truncating) the session log and hook panics into it.
/// Calling it twice keeps the first file.
pub fn init() {
    if SESSION_LOG.get().is_some() {
        return;
    }
    let path = data_dir().join("MosaicFE").join("mosaicfe.log");
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let file = match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("[logger] cannot open {}: {}", path.display(), e);
            return;
        }
    };
    let _ = SESSION_LOG_PATH.set(path.clone());
    let _ = SESSION_LOG.set(Mutex::new(file));

    write_line(&format!(
        "=== MosaicFE {} session started (unix {}) ===",
        env!("CARGO_PKG_VERSION"),
        unix_seconds()
    ));
    write_line(&format!("Log file: {}", path.display()));

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write("PANIC", &info.to_string());
        previous(info);
    }));
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library").join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Time of day (UTC) for log lines.
fn clock_time() -> String {
    let secs = unix_seconds();
    format!(
        "{:02}:{:02}:{:02}",
        (secs % 86_400) / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}
