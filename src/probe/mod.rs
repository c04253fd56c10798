mod error;
pub mod spawn;
pub mod write;

pub use error::*;

/// How a single forbidden attempt resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// The environment refused the action before it completed.
    Blocked,
    /// The action completed. For a probe this means the sandbox has a gap.
    Succeeded,
    /// A child process was created but was killed by a signal.
    AbnormalExit,
}

/// The result of one attempted action, consumed only for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Command line or file path that was attempted.
    pub target: String,
    pub status: OutcomeStatus,
    /// Error message, exit code, or terminating signal.
    pub detail: String,
}

impl ProbeOutcome {
    pub fn new(target: impl Into<String>, status: OutcomeStatus, detail: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            status,
            detail: detail.into(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.status == OutcomeStatus::Blocked
    }
}

/// Which standard stream a report line belongs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Destination for human-readable report lines.
///
/// The binaries print straight to the process streams; tests record lines.
pub trait Reporter {
    fn line(&mut self, stream: Stream, text: &str);
}

/// Writes report lines to the process's own stdout/stderr.
pub struct StdReporter;

impl Reporter for StdReporter {
    fn line(&mut self, stream: Stream, text: &str) {
        match stream {
            Stream::Stdout => println!("{text}"),
            Stream::Stderr => eprintln!("{text}"),
        }
    }
}

/// Reporter that keeps every line in order, for tests and embedding.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub lines: Vec<(Stream, String)>,
}

impl RecordingReporter {
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|(_, text)| text.as_str()).collect()
    }
}

impl Reporter for RecordingReporter {
    fn line(&mut self, stream: Stream, text: &str) {
        self.lines.push((stream, text.to_string()));
    }
}
