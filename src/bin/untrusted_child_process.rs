use std::ffi::OsString;
use std::process::ExitCode;

use safe_run_probes::logging;
use safe_run_probes::probe::StdReporter;
use safe_run_probes::probe::spawn::{self, InheritedStdioLauncher, SpawnRequest};

// Try to spawn a child process so the surrounding sandbox can prove it refuses.
//
// The first token is the command and the rest are its arguments; with no
// tokens it runs `whoami -a`. Tokens are read straight from `args_os`: no
// flag or `--` handling and no UTF-8 requirement, so every token reaches
// process creation verbatim.
//
// Exits 1 when the process could not be created, 0 otherwise.
fn main() -> ExitCode {
    logging::init();

    let request = request_from_invocation(std::env::args_os());
    let outcome = spawn::run(&request, &InheritedStdioLauncher, &mut StdReporter);

    ExitCode::from(spawn::exit_code(&outcome))
}

/// Drop the program name and resolve the rest into a request.
fn request_from_invocation(argv: impl IntoIterator<Item = OsString>) -> SpawnRequest {
    SpawnRequest::from_args(argv.into_iter().skip(1))
}
