//! Pactum command-line driver.
//!
//! Provides the `pactum` binary, which runs the built-in contract scenarios
//! under a chosen failure mode. `RUST_LOG` controls diagnostics; log-mode
//! violations are reported on the `pactum::violation` target and check
//! traces on `pactum::trace`.

mod scenarios;

use std::process;

use clap::{Parser, Subcommand};

use pactum_check::TraceSetting;
use pactum_core::{set_failure_mode, FailureMode};

/// Design-by-contract scenario runner.
#[derive(Parser)]
#[command(name = "pactum", about = "Design-by-contract scenario runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List the built-in scenarios.
    List,

    /// Run one scenario.
    Run {
        /// Scenario name, as printed by `list`.
        scenario: String,

        /// Failure mode: log or throw (default: PACTUM_FAILURE_MODE, else log).
        #[arg(short, long)]
        failure_mode: Option<FailureMode>,

        /// Print every check as a JSON line.
        #[arg(long)]
        trace: bool,
    },
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            for scenario in scenarios::SCENARIOS {
                println!("{:<12}{}", scenario.name, scenario.about);
            }
        }
        Commands::Run {
            scenario,
            failure_mode,
            trace,
        } => process::exit(run_scenario(&scenario, failure_mode, trace)),
    }
}

/// Execute the run subcommand.
///
/// Returns exit code: 0 = the scenario finished, 1 = it surfaced an error
/// or does not exist.
fn run_scenario(name: &str, failure_mode: Option<FailureMode>, trace: bool) -> i32 {
    let Some(scenario) = scenarios::find(name) else {
        eprintln!("Error: unknown scenario '{name}' (see `pactum list`)");
        return 1;
    };

    let previous = failure_mode.map(set_failure_mode);
    let trace = if trace {
        scenarios::json_lines()
    } else {
        TraceSetting::Default
    };
    tracing::debug!(scenario = name, mode = %pactum_core::failure_mode(), "running scenario");
    let outcome = scenario.run(&trace);
    if let Some(previous) = previous {
        set_failure_mode(previous);
    }

    match outcome {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("Error: {err}");
            1
        }
    }
}
