//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{activity, check, machine, operator, report, status, tooling};

/// Factory floor machine activity tracker.
///
/// Records machine starts and stops as a ledger of intervals, keeps machine
/// and operator status current, and compiles shift reports.
#[derive(Debug, Parser)]
#[command(name = "mt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Register, list or remove machines.
    #[command(subcommand)]
    Machine(machine::MachineAction),

    /// Register, list or remove toolings.
    #[command(subcommand)]
    Tooling(tooling::ToolingAction),

    /// Register, list or remove operators.
    #[command(subcommand)]
    Operator(operator::OperatorAction),

    /// Record a start or stop.
    #[command(subcommand)]
    Activity(activity::ActivityAction),

    /// Check whether a machine and operator may start work, without recording.
    Check(check::CheckArgs),

    /// Show the machine status board.
    Status(status::StatusArgs),

    /// Show the raw status of one machine.
    MachineStatus(status::MachineStatusArgs),

    /// Show whether an operator is running, and where.
    OperatorStatus(status::OperatorStatusArgs),

    /// Compile a shift report.
    Report(report::ReportArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_activity_first_stop() {
        let cli = Cli::try_parse_from([
            "mt",
            "activity",
            "first-stop",
            "--tooling",
            "TL-T100",
            "--machine",
            "MC-Press-1",
            "--operator",
            "OP-Budi",
            "--category",
            "NP : No Plan",
            "--output",
            "10",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Activity(activity::ActivityAction::FirstStop(_)))
        ));
    }

    #[test]
    fn test_rejects_misprefixed_ids() {
        let result = Cli::try_parse_from([
            "mt",
            "check",
            "--tooling",
            "MC-1",
            "--machine",
            "MC-1",
            "--operator",
            "OP-1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_report_accepts_negative_shift() {
        let cli = Cli::try_parse_from(["mt", "report", "--shift-from", "-5"]).unwrap();
        let Some(Commands::Report(args)) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(args.shift_from, Some(-5));
    }
}
