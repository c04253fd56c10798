use std::process::ExitCode;

use clap::Parser;

use safe_run_probes::config::WriteProbeConfig;
use safe_run_probes::logging;
use safe_run_probes::probe::StdReporter;
use safe_run_probes::probe::write;

/// Try to append a marker line to files outside the project directory.
///
/// Targets, in order: `/etc/node-safe-run-owned.txt`,
/// `$HOME/node-safe-run-home.txt` (or `/tmp` when `HOME` is unset) and
/// `/tmp/node-safe-run-outside.txt`. Prints one `WROTE:` or `BLOCKED:` line
/// per target and always exits 0.
#[derive(Parser, Debug)]
#[command(
    name = "untrusted-write-outside",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Args {
    /// Ignored.
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    _ignored: Vec<String>,
}

fn main() -> ExitCode {
    logging::init();
    let _ = Args::parse();

    let config = WriteProbeConfig::from_env();
    let targets = write::resolve_targets(&config);
    write::run(&targets, &mut StdReporter);

    ExitCode::SUCCESS
}
