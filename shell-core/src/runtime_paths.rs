use std::{
    env,
    path::{Path, PathBuf},
};

use crate::{DATA_DIR_NAME, DEFAULT_ROOT_DIR_NAME, LOGS_DIR_NAME, ROOT_ENV};

pub fn default_root_dir() -> Option<PathBuf> {
    if let Ok(root) = env::var(ROOT_ENV) {
        let path = PathBuf::from(root.trim());
        if !path.as_os_str().is_empty() {
            return Some(path);
        }
    }

    home::home_dir().map(|home| home.join(DEFAULT_ROOT_DIR_NAME))
}

pub fn data_file_path(root_dir: &Path, file_name: &str) -> PathBuf {
    root_dir.join(DATA_DIR_NAME).join(file_name)
}

pub fn log_file_path(root_dir: &Path, file_name: &str) -> PathBuf {
    root_dir.join(LOGS_DIR_NAME).join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_and_log_paths_live_under_separate_directories() {
        let root = Path::new("/tmp/mist-root");
        assert_eq!(
            data_file_path(root, "tabs.json"),
            PathBuf::from("/tmp/mist-root/data/tabs.json")
        );
        assert_eq!(
            log_file_path(root, "geth.log"),
            PathBuf::from("/tmp/mist-root/logs/geth.log")
        );
    }
}
