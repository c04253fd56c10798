use std::path::{Path, PathBuf};

/// Environment variable consulted for the user-home target.
pub const HOME_ENV: &str = "HOME";

/// Directory used in place of the home directory when `HOME` is unknown,
/// and as the generic world-writable location.
pub const TEMP_DIR: &str = "/tmp";

/// Snapshot of the environment a write probe needs, taken once at entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteProbeConfig {
    home_hint: Option<PathBuf>,
}

impl WriteProbeConfig {
    pub fn from_env() -> Self {
        let home = std::env::var(HOME_ENV).ok();
        Self::with_home(home.as_deref())
    }

    /// Build a config from an explicit home hint. An empty value counts as unset.
    pub fn with_home(home: Option<&str>) -> Self {
        let home_hint = home.filter(|h| !h.is_empty()).map(PathBuf::from);
        Self { home_hint }
    }

    /// The home directory to target, falling back to [`TEMP_DIR`].
    pub fn home_dir(&self) -> &Path {
        self.home_hint
            .as_deref()
            .unwrap_or_else(|| Path::new(TEMP_DIR))
    }

    pub fn temp_dir(&self) -> &Path {
        Path::new(TEMP_DIR)
    }
}
