use std::ffi::{OsStr, OsString};
use std::process::{Command, ExitStatus, Stdio};

use super::{OutcomeStatus, ProbeError, ProbeOutcome, Reporter};
use crate::report;

/// Command used when the caller supplies nothing.
pub const DEFAULT_COMMAND: &str = "whoami";
/// Arguments used whenever the caller supplies no arguments of their own.
pub const DEFAULT_ARGUMENTS: &[&str] = &["-a"];

/// The command a spawn probe will try to start.
///
/// Built once from the invocation arguments; never validated, since the
/// point of the probe is to see whether untrusted input reaches process
/// creation. Tokens stay `OsString` so non-UTF-8 input is forwarded intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub command: OsString,
    pub arguments: Vec<OsString>,
    /// True when `arguments` came from [`DEFAULT_ARGUMENTS`] rather than the caller.
    pub default_arguments: bool,
}

impl SpawnRequest {
    /// Resolve a request from free-form invocation arguments.
    ///
    /// The first element is the command and the remainder its arguments.
    /// Caller-supplied arguments replace the defaults entirely; the default
    /// argument list only applies when the caller gave none.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into);
        let command = args.next().unwrap_or_else(|| OsString::from(DEFAULT_COMMAND));
        let mut arguments: Vec<OsString> = args.collect();
        let default_arguments = arguments.is_empty();
        if default_arguments {
            arguments = DEFAULT_ARGUMENTS.iter().map(OsString::from).collect();
        }
        Self {
            command,
            arguments,
            default_arguments,
        }
    }

    /// Space-joined command line that is actually spawned, used as the
    /// outcome target. Non-UTF-8 bytes are rendered lossily.
    pub fn command_line(&self) -> String {
        join_lossy(&self.command, &self.arguments)
    }

    /// What the caller asked for: the command plus only caller-supplied
    /// arguments, trimmed. Defaulted arguments are not shown.
    pub fn requested_line(&self) -> String {
        let arguments: &[OsString] = if self.default_arguments {
            &[]
        } else {
            &self.arguments
        };
        join_lossy(&self.command, arguments).trim().to_string()
    }
}

fn join_lossy(command: &OsStr, arguments: &[OsString]) -> String {
    let mut line = command.to_string_lossy().into_owned();
    for arg in arguments {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

/// Starts a process for a `SpawnRequest` and waits for it to terminate.
///
/// `Ok` carries the child's numeric exit code. A creation failure is
/// `ProbeError::CreationDenied`; a child killed by a signal is
/// `ProbeError::AbnormalTermination`.
pub trait ProcessLauncher {
    fn launch(&self, request: &SpawnRequest) -> Result<i32, ProbeError>;
}

/// Launches the child with stdin, stdout and stderr inherited from the probe.
pub struct InheritedStdioLauncher;

impl ProcessLauncher for InheritedStdioLauncher {
    fn launch(&self, request: &SpawnRequest) -> Result<i32, ProbeError> {
        let status = Command::new(&request.command)
            .args(&request.arguments)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| ProbeError::creation_denied(request.command.to_string_lossy(), e))?;

        exit_code_from_status(status)
    }
}

/// Split a finished child's status into a numeric code or a terminating signal.
fn exit_code_from_status(status: ExitStatus) -> Result<i32, ProbeError> {
    if let Some(code) = status.code() {
        return Ok(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Err(ProbeError::AbnormalTermination {
                signal: signal_name(signal),
            });
        }
    }

    Err(ProbeError::AbnormalTermination {
        signal: "unknown".to_string(),
    })
}

/// Symbolic name for a signal number (`SIGKILL`), or the number itself when
/// the platform does not know it.
#[cfg(unix)]
pub fn signal_name(signal: i32) -> String {
    nix::sys::signal::Signal::try_from(signal)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|_| signal.to_string())
}

/// Fold a launch result into a reportable outcome.
pub fn classify(request: &SpawnRequest, result: Result<i32, ProbeError>) -> ProbeOutcome {
    let target = request.command_line();
    match result {
        Ok(code) => ProbeOutcome::new(target, OutcomeStatus::Succeeded, code.to_string()),
        Err(ProbeError::AbnormalTermination { signal }) => {
            ProbeOutcome::new(target, OutcomeStatus::AbnormalExit, signal)
        }
        Err(e) => ProbeOutcome::new(target, OutcomeStatus::Blocked, e.to_string()),
    }
}

/// Run one spawn attempt: announce it, launch, classify and report.
pub fn run(
    request: &SpawnRequest,
    launcher: &dyn ProcessLauncher,
    reporter: &mut dyn Reporter,
) -> ProbeOutcome {
    tracing::debug!(
        command = ?request.command,
        arguments = ?request.arguments,
        "resolved spawn request"
    );

    let (stream, text) = report::spawn_attempt_line(request);
    reporter.line(stream, &text);

    let outcome = classify(request, launcher.launch(request));

    match outcome.status {
        OutcomeStatus::Blocked => {
            tracing::info!(target_cmd = %outcome.target, detail = %outcome.detail, "spawn blocked");
        }
        OutcomeStatus::Succeeded | OutcomeStatus::AbnormalExit => {
            tracing::warn!(
                target_cmd = %outcome.target,
                detail = %outcome.detail,
                "child process was created despite the sandbox"
            );
        }
    }

    let (stream, text) = report::spawn_outcome_line(&outcome);
    reporter.line(stream, &text);
    outcome
}

/// Probe exit status: `1` when process creation failed, `0` otherwise.
///
/// The child's own code or signal is never propagated.
pub fn exit_code(outcome: &ProbeOutcome) -> u8 {
    if outcome.is_blocked() { 1 } else { 0 }
}
