//! Line-oriented report format shared by both probes.
//!
//! The probes print these lines; an external harness reads them back with
//! the `parse_*` functions and folds them into a [`Verdict`].

use crate::probe::spawn::SpawnRequest;
use crate::probe::{OutcomeStatus, ProbeOutcome, Stream};

const ATTEMPT_PREFIX: &str = "Attempting to spawn: ";
const SPAWN_BLOCKED_PREFIX: &str = "Spawn blocked or failed: ";
const SIGNAL_PREFIX: &str = "Child terminated by signal ";
const EXIT_PREFIX: &str = "Child exited with code ";
const WROTE_PREFIX: &str = "WROTE: ";
const BLOCKED_PREFIX: &str = "BLOCKED: ";
const BLOCKED_SEPARATOR: &str = " -> ";

pub fn spawn_attempt_line(request: &SpawnRequest) -> (Stream, String) {
    (
        Stream::Stdout,
        format!("{ATTEMPT_PREFIX}{}", request.requested_line()),
    )
}

pub fn spawn_outcome_line(outcome: &ProbeOutcome) -> (Stream, String) {
    match outcome.status {
        OutcomeStatus::Blocked => (
            Stream::Stderr,
            format!("{SPAWN_BLOCKED_PREFIX}{}", outcome.detail),
        ),
        OutcomeStatus::AbnormalExit => (
            Stream::Stderr,
            format!("{SIGNAL_PREFIX}{}", outcome.detail),
        ),
        OutcomeStatus::Succeeded => (Stream::Stdout, format!("{EXIT_PREFIX}{}", outcome.detail)),
    }
}

pub fn write_outcome_line(outcome: &ProbeOutcome) -> (Stream, String) {
    match outcome.status {
        OutcomeStatus::Succeeded => (Stream::Stdout, format!("{WROTE_PREFIX}{}", outcome.target)),
        OutcomeStatus::Blocked | OutcomeStatus::AbnormalExit => (
            Stream::Stderr,
            format!(
                "{BLOCKED_PREFIX}{}{BLOCKED_SEPARATOR}{}",
                outcome.target, outcome.detail
            ),
        ),
    }
}

/// A write-probe line read back from output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedWrite {
    Wrote { path: String },
    Blocked { path: String, message: String },
}

pub fn parse_write_line(line: &str) -> Option<ReportedWrite> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(path) = line.strip_prefix(WROTE_PREFIX) {
        return Some(ReportedWrite::Wrote {
            path: path.to_string(),
        });
    }
    let rest = line.strip_prefix(BLOCKED_PREFIX)?;
    let (path, message) = rest.split_once(BLOCKED_SEPARATOR)?;
    Some(ReportedWrite::Blocked {
        path: path.to_string(),
        message: message.to_string(),
    })
}

/// A spawn-probe line read back from output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedSpawn {
    Attempt { command_line: String },
    Blocked { message: String },
    Signaled { signal: String },
    Exited { code: i32 },
}

pub fn parse_spawn_line(line: &str) -> Option<ReportedSpawn> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(command_line) = line.strip_prefix(ATTEMPT_PREFIX) {
        return Some(ReportedSpawn::Attempt {
            command_line: command_line.to_string(),
        });
    }
    if let Some(message) = line.strip_prefix(SPAWN_BLOCKED_PREFIX) {
        return Some(ReportedSpawn::Blocked {
            message: message.to_string(),
        });
    }
    if let Some(signal) = line.strip_prefix(SIGNAL_PREFIX) {
        return Some(ReportedSpawn::Signaled {
            signal: signal.to_string(),
        });
    }
    let code = line.strip_prefix(EXIT_PREFIX)?.trim().parse().ok()?;
    Some(ReportedSpawn::Exited { code })
}

/// Overall judgement of a sandbox from probe results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every attempted action was refused.
    Passed,
    /// At least one forbidden action went through; lists what got through.
    Failed { breaches: Vec<String> },
    /// No probe result was found.
    Inconclusive,
}

impl Verdict {
    pub fn from_outcomes(outcomes: &[ProbeOutcome]) -> Self {
        if outcomes.is_empty() {
            return Verdict::Inconclusive;
        }
        let breaches: Vec<String> = outcomes
            .iter()
            .filter(|o| !o.is_blocked())
            .map(|o| o.target.clone())
            .collect();
        if breaches.is_empty() {
            Verdict::Passed
        } else {
            Verdict::Failed { breaches }
        }
    }

    /// Judge from raw output lines of either probe (stdout and stderr
    /// interleaved in any order). Unrecognised lines, such as the spawned
    /// child's own output, are skipped.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut seen = 0usize;
        let mut breaches = Vec::new();
        let mut last_attempt: Option<String> = None;

        for line in lines {
            if let Some(write) = parse_write_line(line) {
                seen += 1;
                if let ReportedWrite::Wrote { path } = write {
                    breaches.push(path);
                }
                continue;
            }
            match parse_spawn_line(line) {
                Some(ReportedSpawn::Attempt { command_line }) => last_attempt = Some(command_line),
                Some(ReportedSpawn::Blocked { .. }) => seen += 1,
                Some(ReportedSpawn::Signaled { .. } | ReportedSpawn::Exited { .. }) => {
                    seen += 1;
                    breaches.push(
                        last_attempt
                            .take()
                            .unwrap_or_else(|| "child process".to_string()),
                    );
                }
                None => {}
            }
        }

        match (seen, breaches.is_empty()) {
            (0, _) => Verdict::Inconclusive,
            (_, true) => Verdict::Passed,
            (_, false) => Verdict::Failed { breaches },
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    // === formatting ===

    #[rstest]
    #[case::blocked(
        OutcomeStatus::Blocked,
        "No such file or directory (os error 2)",
        Stream::Stderr,
        "Spawn blocked or failed: No such file or directory (os error 2)"
    )]
    #[case::signal(
        OutcomeStatus::AbnormalExit,
        "SIGKILL",
        Stream::Stderr,
        "Child terminated by signal SIGKILL"
    )]
    #[case::exited(OutcomeStatus::Succeeded, "0", Stream::Stdout, "Child exited with code 0")]
    fn spawn_outcome_lines(
        #[case] status: OutcomeStatus,
        #[case] detail: &str,
        #[case] expected_stream: Stream,
        #[case] expected_text: &str,
    ) {
        let outcome = ProbeOutcome::new("whoami -a", status, detail);
        assert_eq!(
            spawn_outcome_line(&outcome),
            (expected_stream, expected_text.to_string())
        );
    }

    #[rstest]
    #[case::defaulted(&[], "Attempting to spawn: whoami")]
    #[case::command_only(&["nonexistent-binary-xyz"], "Attempting to spawn: nonexistent-binary-xyz")]
    #[case::caller_args(&["whoami", "-a"], "Attempting to spawn: whoami -a")]
    #[case::separator(&["--", "ls"], "Attempting to spawn: -- ls")]
    fn spawn_attempt_line_shows_caller_tokens(#[case] args: &[&str], #[case] expected: &str) {
        let request = SpawnRequest::from_args(args.iter().copied());
        assert_eq!(
            spawn_attempt_line(&request),
            (Stream::Stdout, expected.to_string())
        );
    }

    #[rstest]
    #[case::wrote(
        OutcomeStatus::Succeeded,
        Stream::Stdout,
        "WROTE: /tmp/node-safe-run-outside.txt"
    )]
    #[case::blocked(
        OutcomeStatus::Blocked,
        Stream::Stderr,
        "BLOCKED: /tmp/node-safe-run-outside.txt -> Permission denied (os error 13)"
    )]
    fn write_outcome_lines(
        #[case] status: OutcomeStatus,
        #[case] expected_stream: Stream,
        #[case] expected_text: &str,
    ) {
        let detail = match status {
            OutcomeStatus::Succeeded => "written",
            _ => "Permission denied (os error 13)",
        };
        let outcome = ProbeOutcome::new("/tmp/node-safe-run-outside.txt", status, detail);
        assert_eq!(
            write_outcome_line(&outcome),
            (expected_stream, expected_text.to_string())
        );
    }

    // === parsing ===

    #[rstest]
    #[case::wrote(
        "WROTE: /tmp/node-safe-run-outside.txt",
        Some(ReportedWrite::Wrote { path: "/tmp/node-safe-run-outside.txt".into() })
    )]
    #[case::blocked(
        "BLOCKED: /etc/node-safe-run-owned.txt -> Permission denied (os error 13)",
        Some(ReportedWrite::Blocked {
            path: "/etc/node-safe-run-owned.txt".into(),
            message: "Permission denied (os error 13)".into(),
        })
    )]
    #[case::trailing_newline(
        "WROTE: /tmp/x\n",
        Some(ReportedWrite::Wrote { path: "/tmp/x".into() })
    )]
    #[case::blocked_without_separator("BLOCKED: /etc/x", None)]
    #[case::unrelated("hello world", None)]
    fn parse_write_lines(#[case] line: &str, #[case] expected: Option<ReportedWrite>) {
        assert_eq!(parse_write_line(line), expected);
    }

    #[rstest]
    #[case::attempt(
        "Attempting to spawn: whoami -a",
        Some(ReportedSpawn::Attempt { command_line: "whoami -a".into() })
    )]
    #[case::blocked(
        "Spawn blocked or failed: No such file or directory (os error 2)",
        Some(ReportedSpawn::Blocked { message: "No such file or directory (os error 2)".into() })
    )]
    #[case::signaled(
        "Child terminated by signal SIGTERM",
        Some(ReportedSpawn::Signaled { signal: "SIGTERM".into() })
    )]
    #[case::exited("Child exited with code 3", Some(ReportedSpawn::Exited { code: 3 }))]
    #[case::exited_garbage("Child exited with code null", None)]
    #[case::unrelated("uid=0(root) gid=0(root)", None)]
    fn parse_spawn_lines(#[case] line: &str, #[case] expected: Option<ReportedSpawn>) {
        assert_eq!(parse_spawn_line(line), expected);
    }

    // === verdict ===

    #[test]
    fn verdict_passes_when_every_write_blocked() {
        let output = indoc! {"
            BLOCKED: /etc/node-safe-run-owned.txt -> Permission denied (os error 13)
            BLOCKED: /home/alice/node-safe-run-home.txt -> Operation not permitted (os error 1)
            BLOCKED: /tmp/node-safe-run-outside.txt -> Operation not permitted (os error 1)
        "};
        let verdict = Verdict::from_lines(output.lines());
        assert_eq!(verdict, Verdict::Passed);
        assert!(verdict.passed());
    }

    #[test]
    fn verdict_fails_listing_written_paths() {
        let output = indoc! {"
            BLOCKED: /etc/node-safe-run-owned.txt -> Permission denied (os error 13)
            WROTE: /home/alice/node-safe-run-home.txt
            WROTE: /tmp/node-safe-run-outside.txt
        "};
        assert_eq!(
            Verdict::from_lines(output.lines()),
            Verdict::Failed {
                breaches: vec![
                    "/home/alice/node-safe-run-home.txt".to_string(),
                    "/tmp/node-safe-run-outside.txt".to_string(),
                ]
            }
        );
    }

    #[rstest]
    #[case::blocked(
        indoc! {"
            Attempting to spawn: whoami
            Spawn blocked or failed: Operation not permitted (os error 1)
        "},
        Verdict::Passed
    )]
    #[case::exited_with_child_output(
        indoc! {"
            Attempting to spawn: whoami
            alice
            Child exited with code 0
        "},
        Verdict::Failed { breaches: vec!["whoami".to_string()] }
    )]
    #[case::signaled(
        indoc! {"
            Attempting to spawn: sleep 100
            Child terminated by signal SIGKILL
        "},
        Verdict::Failed { breaches: vec!["sleep 100".to_string()] }
    )]
    #[case::attempt_only("Attempting to spawn: whoami -a\n", Verdict::Inconclusive)]
    #[case::empty("", Verdict::Inconclusive)]
    fn verdict_from_spawn_output(#[case] output: &str, #[case] expected: Verdict) {
        assert_eq!(Verdict::from_lines(output.lines()), expected);
    }

    #[rstest]
    #[case::none(vec![], Verdict::Inconclusive)]
    #[case::all_blocked(
        vec![ProbeOutcome::new("/etc/x", OutcomeStatus::Blocked, "denied")],
        Verdict::Passed
    )]
    #[case::abnormal_counts_as_breach(
        vec![
            ProbeOutcome::new("/etc/x", OutcomeStatus::Blocked, "denied"),
            ProbeOutcome::new("sleep 1", OutcomeStatus::AbnormalExit, "SIGTERM"),
        ],
        Verdict::Failed { breaches: vec!["sleep 1".to_string()] }
    )]
    fn verdict_from_outcomes(#[case] outcomes: Vec<ProbeOutcome>, #[case] expected: Verdict) {
        assert_eq!(Verdict::from_outcomes(&outcomes), expected);
    }
}
