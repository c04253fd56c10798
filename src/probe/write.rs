use std::fmt;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use super::{OutcomeStatus, ProbeError, ProbeOutcome, Reporter};
use crate::config::WriteProbeConfig;
use crate::report;

/// Literal line appended to every target.
pub const MARKER: &str = "untrusted write attempt\n";

pub const SYSTEM_TARGET: &str = "/etc/node-safe-run-owned.txt";
pub const HOME_TARGET_FILE: &str = "node-safe-run-home.txt";
pub const TEMP_TARGET_FILE: &str = "node-safe-run-outside.txt";

/// Where a target sits relative to the project being protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCategory {
    SystemOwned,
    UserHome,
    GenericTemp,
}

impl TargetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetCategory::SystemOwned => "system-owned",
            TargetCategory::UserHome => "user-home",
            TargetCategory::GenericTemp => "generic-temp",
        }
    }
}

impl fmt::Display for TargetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path outside the project that the probe will try to append to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub path: PathBuf,
    pub category: TargetCategory,
}

impl ProbeTarget {
    pub fn new(path: impl Into<PathBuf>, category: TargetCategory) -> Self {
        Self {
            path: make_absolute(path.into()),
            category,
        }
    }
}

/// Resolve the fixed target list: system path, home path, temp path.
pub fn resolve_targets(config: &WriteProbeConfig) -> Vec<ProbeTarget> {
    vec![
        ProbeTarget::new(SYSTEM_TARGET, TargetCategory::SystemOwned),
        ProbeTarget::new(
            config.home_dir().join(HOME_TARGET_FILE),
            TargetCategory::UserHome,
        ),
        ProbeTarget::new(
            config.temp_dir().join(TEMP_TARGET_FILE),
            TargetCategory::GenericTemp,
        ),
    ]
}

/// Resolve relative paths against the current directory. If the current
/// directory is unavailable the path is kept as given.
fn make_absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::path::absolute(&path).unwrap_or(path)
}

/// Open `path` for append (creating it) and write `contents`.
pub fn append(path: &Path, contents: &str) -> Result<(), ProbeError> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| ProbeError::write_denied(path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| ProbeError::write_denied(path, e))
}

/// Attempt the marker write against one target.
pub fn attempt(target: &ProbeTarget) -> ProbeOutcome {
    let display = target.path.display().to_string();
    match append(&target.path, MARKER) {
        Ok(()) => ProbeOutcome::new(display, OutcomeStatus::Succeeded, "written"),
        Err(e) => ProbeOutcome::new(display, OutcomeStatus::Blocked, e.to_string()),
    }
}

/// Attempt every target once, in order, reporting each before moving on.
pub fn run(targets: &[ProbeTarget], reporter: &mut dyn Reporter) -> Vec<ProbeOutcome> {
    let mut outcomes = Vec::with_capacity(targets.len());
    for target in targets {
        tracing::debug!(path = %target.path.display(), category = %target.category, "attempting write");

        let outcome = attempt(target);
        if outcome.is_blocked() {
            tracing::info!(path = %outcome.target, detail = %outcome.detail, "write blocked");
        } else {
            tracing::warn!(
                path = %outcome.target,
                category = %target.category,
                "write outside the project succeeded"
            );
        }

        let (stream, text) = report::write_outcome_line(&outcome);
        reporter.line(stream, &text);
        outcomes.push(outcome);
    }
    outcomes
}
