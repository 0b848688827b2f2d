//! User preferences for waymark.
//!
//! Preferences are the small, user-mutated settings (theme, nickname,
//! avatar) that live outside the journal store. They persist as a JSON file
//! and are observable through a `watch` channel so the aggregator picks up
//! changes without polling.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// The theme the presentation layer should render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    /// Follow the system setting.
    #[default]
    System,
    /// Always light.
    Light,
    /// Always dark.
    Dark,
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme mode: {other}")),
        }
    }
}

/// The user-facing preference set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Theme mode.
    pub theme: ThemeMode,
    /// Display nickname.
    pub nickname: String,
    /// Avatar reference.
    pub avatar: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: ThemeMode::System,
            nickname: "traveler".to_string(),
            avatar: "avatar-01".to_string(),
        }
    }
}

/// Observable, file-backed preference store.
///
/// Every setter persists before publishing, so observers only ever see
/// states that made it to disk.
#[derive(Debug)]
pub struct PreferenceStore {
    /// Backing file; `None` for in-memory stores used in tests.
    path: Option<PathBuf>,
    /// Serializes persist-then-publish sequences across tasks.
    write_lock: Mutex<()>,
    tx: watch::Sender<Preferences>,
}

impl PreferenceStore {
    /// Open a preference store backed by the given file.
    ///
    /// A missing file yields defaults; an unreadable or corrupt file is
    /// logged and replaced with defaults on the next write rather than
    /// failing startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let prefs = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(prefs) => prefs,
                Err(e) => {
                    warn!("preferences file is corrupt ({e}); using defaults");
                    Preferences::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no preferences file at {}; using defaults", path.display());
                Preferences::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path),
            write_lock: Mutex::new(()),
            tx: watch::Sender::new(prefs),
        })
    }

    /// Create an in-memory preference store for testing.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            write_lock: Mutex::new(()),
            tx: watch::Sender::new(Preferences::default()),
        }
    }

    /// The current preference snapshot.
    #[must_use]
    pub fn current(&self) -> Preferences {
        self.tx.borrow().clone()
    }

    /// Subscribe to preference changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Preferences> {
        self.tx.subscribe()
    }

    /// Set the theme mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences cannot be persisted.
    pub fn set_theme(&self, theme: ThemeMode) -> Result<()> {
        let mut prefs = self.current();
        prefs.theme = theme;
        self.apply(prefs)
    }

    /// Set nickname and avatar together.
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences cannot be persisted.
    pub fn set_profile(&self, nickname: impl Into<String>, avatar: impl Into<String>) -> Result<()> {
        let mut prefs = self.current();
        prefs.nickname = nickname.into();
        prefs.avatar = avatar.into();
        self.apply(prefs)
    }

    /// Persist and publish a full preference set.
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences cannot be persisted; nothing is
    /// published in that case.
    pub fn apply(&self, prefs: Preferences) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::internal("preference write lock poisoned"))?;
        self.persist(&prefs)?;
        self.tx.send_replace(prefs);
        Ok(())
    }

    fn persist(&self, prefs: &Preferences) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let json = serde_json::to_string_pretty(prefs)?;
        std::fs::write(path, json)?;
        debug!("preferences persisted to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_mode_roundtrip() {
        for theme in [ThemeMode::System, ThemeMode::Light, ThemeMode::Dark] {
            let parsed: ThemeMode = theme.to_string().parse().unwrap();
            assert_eq!(parsed, theme);
        }
        assert!("sepia".parse::<ThemeMode>().is_err());
    }

    #[test]
    fn test_defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.theme, ThemeMode::System);
        assert_eq!(prefs.nickname, "traveler");
        assert_eq!(prefs.avatar, "avatar-01");
    }

    #[test]
    fn test_in_memory_set_theme() {
        let store = PreferenceStore::in_memory();
        store.set_theme(ThemeMode::Dark).unwrap();
        assert_eq!(store.current().theme, ThemeMode::Dark);
    }

    #[test]
    fn test_set_profile() {
        let store = PreferenceStore::in_memory();
        store.set_profile("Ada", "avatar-07").unwrap();
        let prefs = store.current();
        assert_eq!(prefs.nickname, "Ada");
        assert_eq!(prefs.avatar, "avatar-07");
        // Theme untouched
        assert_eq!(prefs.theme, ThemeMode::System);
    }

    #[tokio::test]
    async fn test_watch_sees_changes() {
        let store = PreferenceStore::in_memory();
        let mut rx = store.watch();

        store.set_theme(ThemeMode::Light).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().theme, ThemeMode::Light);
    }

    #[test]
    fn test_open_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::open(dir.path().join("prefs.json")).unwrap();
        assert_eq!(store.current(), Preferences::default());
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let store = PreferenceStore::open(&path).unwrap();
        store.set_profile("Marco", "avatar-03").unwrap();
        store.set_theme(ThemeMode::Dark).unwrap();
        drop(store);

        let reloaded = PreferenceStore::open(&path).unwrap();
        let prefs = reloaded.current();
        assert_eq!(prefs.nickname, "Marco");
        assert_eq!(prefs.avatar, "avatar-03");
        assert_eq!(prefs.theme, ThemeMode::Dark);
    }

    #[test]
    fn test_open_corrupt_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{ nonsense").unwrap();

        let store = PreferenceStore::open(&path).unwrap();
        assert_eq!(store.current(), Preferences::default());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(
            &path,
            r#"{"theme": "dark", "nickname": "Ada", "avatar": "a", "legacy_flag": true}"#,
        )
        .unwrap();

        let store = PreferenceStore::open(&path).unwrap();
        assert_eq!(store.current().theme, ThemeMode::Dark);
    }
}
