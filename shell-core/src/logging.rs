use std::{
    env, fs,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use chrono::{DateTime, Local, SecondsFormat};

use crate::{runtime_paths, DESKTOP_LOG_FILE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopLogCategory {
    Startup,
    Runtime,
    Protocol,
    Menu,
    Node,
    Shutdown,
}

impl DesktopLogCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Runtime => "runtime",
            Self::Protocol => "protocol",
            Self::Menu => "menu",
            Self::Node => "node",
            Self::Shutdown => "shutdown",
        }
    }
}

pub fn resolve_desktop_log_path(root_dir: Option<PathBuf>, log_file_name: &str) -> PathBuf {
    match root_dir {
        Some(root) => runtime_paths::log_file_path(&root, log_file_name),
        None => env::temp_dir().join("mist").join(log_file_name),
    }
}

pub fn format_log_line(
    category: DesktopLogCategory,
    message: &str,
    timestamp: DateTime<Local>,
) -> String {
    format!(
        "[{}] [{}] {}\n",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, false),
        category.as_str(),
        message
    )
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(format!(".{index}"));
    PathBuf::from(raw)
}

/// Shifts `desktop.log` into `desktop.log.1`, `.1` into `.2` and so on once
/// the live file has grown past `max_bytes`. The oldest backup is dropped.
pub fn rotate_log_if_needed(
    path: &Path,
    max_bytes: u64,
    backup_count: usize,
) -> std::io::Result<bool> {
    let size = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(error) => return Err(error),
    };
    if size < max_bytes {
        return Ok(false);
    }

    if backup_count == 0 {
        fs::remove_file(path)?;
        return Ok(true);
    }

    let oldest = backup_path(path, backup_count);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for index in (1..backup_count).rev() {
        let from = backup_path(path, index);
        if from.exists() {
            fs::rename(&from, backup_path(path, index + 1))?;
        }
    }
    fs::rename(path, backup_path(path, 1))?;
    Ok(true)
}

pub fn append_desktop_log(
    category: DesktopLogCategory,
    message: &str,
    root_dir: Option<PathBuf>,
    log_file_name: &str,
    max_bytes: u64,
    backup_count: usize,
    write_lock: &OnceLock<Mutex<()>>,
) {
    let line = format_log_line(category, message, Local::now());
    if cfg!(debug_assertions) {
        eprint!("{line}");
    }

    let lock = write_lock.get_or_init(|| Mutex::new(()));
    let _guard = match lock.lock() {
        Ok(guard) => guard,
        Err(error) => error.into_inner(),
    };

    let path = resolve_desktop_log_path(root_dir, log_file_name);
    if let Err(error) = write_log_line(&path, &line, max_bytes, backup_count) {
        eprintln!("failed to write desktop log {}: {}", path.display(), error);
    }
}

fn write_log_line(
    path: &Path,
    line: &str,
    max_bytes: u64,
    backup_count: usize,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    rotate_log_if_needed(path, max_bytes, backup_count)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}

pub fn node_log_path(root_dir: Option<&Path>, node_name: &str) -> Option<PathBuf> {
    root_dir.map(|root| runtime_paths::log_file_path(root, &format!("{node_name}.log")))
}

pub fn default_desktop_log_path() -> PathBuf {
    resolve_desktop_log_path(runtime_paths::default_root_dir(), DESKTOP_LOG_FILE)
}
