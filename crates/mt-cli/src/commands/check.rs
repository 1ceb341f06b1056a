//! Admission pre-check: can this operator start work on this machine?

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use mt_core::{Admission, MachineId, OperatorId, ToolingId};
use serde::Serialize;

use super::open_database;
use crate::Config;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Tooling ID (e.g., TL-T100).
    #[arg(long)]
    pub tooling: ToolingId,
    /// Machine ID (e.g., MC-Press-1).
    #[arg(long)]
    pub machine: MachineId,
    /// Operator ID (e.g., OP-Budi).
    #[arg(long)]
    pub operator: OperatorId,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// JSON shape of a check result.
#[derive(Debug, Serialize)]
struct CheckOutput {
    status: bool,
    message: String,
}

pub fn run<W: Write>(writer: &mut W, args: &CheckArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let admission = db
        .check_admission(&args.tooling, &args.machine, &args.operator)
        .context("failed to read machine and operator status")?;

    if args.json {
        let output = CheckOutput {
            status: admission.is_admitted(),
            message: admission.message(),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
        return Ok(());
    }

    match admission {
        Admission::Admitted => writeln!(writer, "OK")?,
        Admission::Denied(conflict) => writeln!(writer, "{conflict}")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use insta::assert_snapshot;
    use mt_core::{Activity, ActivityKind, ActivityRequest, Binding};
    use mt_db::Database;

    use crate::commands::test_support::{config_in, seed};

    fn args(operator: &str, json: bool) -> CheckArgs {
        CheckArgs {
            tooling: ToolingId::new("TL-T100").unwrap(),
            machine: MachineId::new("MC-Press-1").unwrap(),
            operator: OperatorId::new(operator).unwrap(),
            json,
        }
    }

    fn start_budi(config: &Config) {
        let mut db = Database::open(&config.database_path).unwrap();
        let request = ActivityRequest::new(
            ActivityKind::Start,
            Binding {
                tooling_id: ToolingId::new("TL-T100").unwrap(),
                machine_id: MachineId::new("MC-Press-1").unwrap(),
                operator_id: OperatorId::new("OP-Budi").unwrap(),
            },
        );
        let activity = Activity::try_from(request).unwrap();
        db.submit_activity_at(&activity, Utc::now()).unwrap();
    }

    #[test]
    fn idle_machine_is_ok() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        seed(&config);

        let mut output = Vec::new();
        run(&mut output, &args("OP-Budi", false), &config).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @"OK");
    }

    #[test]
    fn running_machine_reports_its_operator() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        seed(&config);
        start_budi(&config);

        let mut output = Vec::new();
        run(&mut output, &args("OP-Sari", false), &config).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        ERROR
        Machine MC-Press-1 is running with
        Operator:	OP-Budi
        Tooling:	TL-T100

        Stop the machine first.
        ");
    }

    #[test]
    fn json_output_for_own_machine() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        seed(&config);
        start_budi(&config);

        let mut output = Vec::new();
        run(&mut output, &args("OP-Budi", true), &config).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed["status"], true);
        assert_eq!(parsed["message"], "");
    }
}
