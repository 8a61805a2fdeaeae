//! Where the coach keeps its files, resolved with the `dirs` crate.
//!
//! `settings.toml` lives in the platform config dir (`~/.config/runaway-coach/`
//! on Linux) and the feeling journal in the local data dir
//! (`~/.local/share/runaway-coach/` on Linux).

use std::path::{Path, PathBuf};

const APP_NAME: &str = "runaway-coach";
const SETTINGS_FILE: &str = "settings.toml";
const JOURNAL_FILE: &str = "feelings.jsonl";

/// The two files the coach reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub settings_file: PathBuf,
    /// JSON-lines feeling journal.
    pub journal_file: PathBuf,
}

impl AppPaths {
    /// Platform locations. A platform without a standard directory falls
    /// back to the current directory.
    pub fn new() -> Self {
        Self {
            settings_file: app_dir(dirs::config_dir()).join(SETTINGS_FILE),
            journal_file: app_dir(dirs::data_local_dir()).join(JOURNAL_FILE),
        }
    }

    /// Both files directly under `root`, for hosts that keep everything in
    /// one sandbox directory.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            settings_file: root.join(SETTINGS_FILE),
            journal_file: root.join(JOURNAL_FILE),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_files_sit_in_the_app_dir() {
        let paths = AppPaths::new();
        let files = [(&paths.settings_file, SETTINGS_FILE), (&paths.journal_file, JOURNAL_FILE)];
        for (file, name) in files {
            assert!(file.file_name().is_some_and(|n| n == name));
            assert!(file.parent().is_some_and(|dir| dir.ends_with(APP_NAME)));
        }
    }

    #[test]
    fn missing_platform_dir_falls_back_to_cwd() {
        assert_eq!(app_dir(None), Path::new(".").join(APP_NAME));
    }

    #[test]
    fn under_puts_both_files_in_root() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::under(dir.path());
        assert_eq!(paths.settings_file, dir.path().join("settings.toml"));
        assert_eq!(paths.journal_file, dir.path().join("feelings.jsonl"));
    }
}
