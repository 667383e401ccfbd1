use crate::lock::DEFAULT_LOCK_TIMEOUT;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Resolved runtime configuration for one invocation.
///
/// Nothing here is held across calls; every operation re-resolves paths from
/// this value, loads, acts, and persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base directory owned by questlog; ledgers live under `quests/`.
    pub data_dir: PathBuf,
    /// Root of the host runtime's session-metadata tree
    /// (`<session_root>/<project>/<session-id>.json`). Read-only.
    pub session_root: PathBuf,
    /// Bounded wait for the per-ledger mutation lock.
    pub lock_timeout: Duration,
}

/// On-disk user config, all fields optional (`<config_dir>/questlog/config.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    session_root: Option<PathBuf>,
    lock_timeout_ms: Option<u64>,
}

impl Config {
    /// Resolve configuration from environment, user config file, and
    /// platform defaults (highest wins). Never fails: unreadable or
    /// malformed config degrades to defaults with a warning.
    #[must_use]
    pub fn resolve() -> Self {
        let file = user_config_path().map(|p| load_config_file(&p)).unwrap_or_default();
        resolve_inner(
            env::var_os("QUESTLOG_DATA_DIR").map(PathBuf::from),
            env::var_os("QUESTLOG_SESSION_ROOT").map(PathBuf::from),
            env::var("QUESTLOG_LOCK_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
            &file,
            default_base_dir(),
        )
    }

    /// Explicit construction for tests and embedders.
    #[must_use]
    pub fn with_dirs(data_dir: impl Into<PathBuf>, session_root: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            session_root: session_root.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Directory holding one ledger file per root session.
    #[must_use]
    pub fn quests_dir(&self) -> PathBuf {
        self.data_dir.join("quests")
    }

    /// Ledger file for a root session id.
    #[must_use]
    pub fn ledger_path(&self, root_id: &str) -> PathBuf {
        self.quests_dir().join(format!("{root_id}.json"))
    }

    /// Lock file guarding mutations of a root session's ledger.
    #[must_use]
    pub fn lock_path(&self, root_id: &str) -> PathBuf {
        self.quests_dir().join(format!("{root_id}.lock"))
    }
}

fn resolve_inner(
    env_data: Option<PathBuf>,
    env_session: Option<PathBuf>,
    env_timeout_ms: Option<u64>,
    file: &ConfigFile,
    default_base: PathBuf,
) -> Config {
    let data_dir = env_data
        .or_else(|| file.data_dir.clone())
        .unwrap_or_else(|| default_base.clone());
    let session_root = env_session
        .or_else(|| file.session_root.clone())
        .unwrap_or_else(|| default_base.join("sessions"));
    let lock_timeout = env_timeout_ms
        .or(file.lock_timeout_ms)
        .map_or(DEFAULT_LOCK_TIMEOUT, Duration::from_millis);

    Config {
        data_dir,
        session_root,
        lock_timeout,
    }
}

fn default_base_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from("."), |d| d.join("questlog"))
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("questlog/config.toml"))
}

fn load_config_file(path: &Path) -> ConfigFile {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return ConfigFile::default();
    };
    match toml::from_str(&raw) {
        Ok(file) => file,
        Err(err) => {
            warn!(path = %path.display(), %err, "ignoring malformed config file");
            ConfigFile::default()
        }
    }
}
