//! Data location configuration
//!
//! The session log directory and the cron jobs file are external inputs.
//! Explicit paths win; otherwise both are derived from the agent runtime's
//! state directory, taken from `OPENCLAW_HOME` or `~/.openclaw`.

use crate::error::{ClawstatError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding the runtime state directory
pub const OPENCLAW_HOME_ENV: &str = "OPENCLAW_HOME";

/// Default lifetime of cached aggregate and job-list results
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Where the inputs live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// Directory holding one `*.jsonl` log per session
    pub sessions_dir: PathBuf,
    /// Cron jobs configuration file
    pub cron_file: PathBuf,
}

impl DataPaths {
    /// Derive both locations from a runtime state directory
    pub fn from_base(base: &Path) -> Self {
        Self {
            sessions_dir: base.join("agents").join("main").join("sessions"),
            cron_file: base.join("cron").join("jobs.json"),
        }
    }

    /// Resolve locations, letting explicit paths override the derived defaults
    pub fn resolve(sessions_dir: Option<PathBuf>, cron_file: Option<PathBuf>) -> Result<Self> {
        let defaults = match (&sessions_dir, &cron_file) {
            (Some(_), Some(_)) => None,
            _ => Some(Self::from_base(&state_dir()?)),
        };

        let paths = match defaults {
            Some(defaults) => Self {
                sessions_dir: sessions_dir.unwrap_or(defaults.sessions_dir),
                cron_file: cron_file.unwrap_or(defaults.cron_file),
            },
            None => Self {
                sessions_dir: sessions_dir.unwrap_or_default(),
                cron_file: cron_file.unwrap_or_default(),
            },
        };

        debug!(
            "Sessions dir: {}, cron file: {}",
            paths.sessions_dir.display(),
            paths.cron_file.display()
        );
        Ok(paths)
    }
}

/// Locate the runtime state directory
fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(OPENCLAW_HOME_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    dirs::home_dir()
        .map(|home| home.join(".openclaw"))
        .ok_or_else(|| ClawstatError::Config("Cannot determine home directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ENV_MUTEX, EnvVarGuard};

    #[test]
    fn test_from_base_layout() {
        let paths = DataPaths::from_base(Path::new("/srv/claw"));
        assert_eq!(
            paths.sessions_dir,
            PathBuf::from("/srv/claw/agents/main/sessions")
        );
        assert_eq!(paths.cron_file, PathBuf::from("/srv/claw/cron/jobs.json"));
    }

    #[test]
    fn test_resolve_uses_env_base() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut guard = EnvVarGuard::new();
        guard.set(OPENCLAW_HOME_ENV, "/opt/openclaw");

        let paths = DataPaths::resolve(None, None).unwrap();
        assert_eq!(
            paths.sessions_dir,
            PathBuf::from("/opt/openclaw/agents/main/sessions")
        );
        assert_eq!(paths.cron_file, PathBuf::from("/opt/openclaw/cron/jobs.json"));
    }

    #[test]
    fn test_resolve_explicit_paths_win() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut guard = EnvVarGuard::new();
        guard.set(OPENCLAW_HOME_ENV, "/opt/openclaw");

        let paths = DataPaths::resolve(Some(PathBuf::from("/logs")), None).unwrap();
        assert_eq!(paths.sessions_dir, PathBuf::from("/logs"));
        assert_eq!(paths.cron_file, PathBuf::from("/opt/openclaw/cron/jobs.json"));

        let paths = DataPaths::resolve(
            Some(PathBuf::from("/logs")),
            Some(PathBuf::from("/etc/jobs.json")),
        )
        .unwrap();
        assert_eq!(paths.cron_file, PathBuf::from("/etc/jobs.json"));
    }
}
