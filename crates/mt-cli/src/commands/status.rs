//! Status queries: the machine board, one machine, one operator.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use mt_core::{DisplayedStatus, MachineId, OperatorId};
use serde::Serialize;

use super::open_database;
use crate::Config;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct MachineStatusArgs {
    /// Machine ID (e.g., MC-Press-1).
    pub machine_id: MachineId,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct OperatorStatusArgs {
    /// Operator ID (e.g., OP-Budi).
    pub operator_id: OperatorId,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Prints every machine that has been observed, IDLE machines last.
pub fn run<W: Write>(writer: &mut W, args: &StatusArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let statuses = db.list_machine_statuses()?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&statuses)?)?;
        return Ok(());
    }
    if statuses.is_empty() {
        writeln!(writer, "No machine activity recorded.")?;
        return Ok(());
    }

    let width = statuses
        .iter()
        .map(|s| s.machine_id.as_str().len())
        .max()
        .unwrap_or(0);
    for status in &statuses {
        let operator = match &status.last_operator_id {
            Some(operator_id) if status.displayed_status != DisplayedStatus::Idle => {
                operator_id.as_str()
            }
            _ => "-",
        };
        writeln!(
            writer,
            "{:<width$}  {:<8}  {:<7}  {}  {}  {}",
            status.machine_id.as_str(),
            status.displayed_status.as_str(),
            status.raw_status.as_str(),
            status.last_tooling_id,
            operator,
            status.category_downtime,
        )?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct MachineStatusOutput<'a> {
    machine_id: &'a MachineId,
    status: &'static str,
}

/// Prints the raw status of one machine; a machine never observed is idle.
pub fn run_machine<W: Write>(
    writer: &mut W,
    args: &MachineStatusArgs,
    config: &Config,
) -> Result<()> {
    let db = open_database(config)?;
    let raw = db
        .machine_raw_status(&args.machine_id)
        .with_context(|| format!("failed to read status of {}", args.machine_id))?;

    if args.json {
        let output = MachineStatusOutput {
            machine_id: &args.machine_id,
            status: raw.as_str(),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        writeln!(writer, "{}  {raw}", args.machine_id)?;
    }
    Ok(())
}

/// Prints whether an operator is busy, and on which machine and tooling.
pub fn run_operator<W: Write>(
    writer: &mut W,
    args: &OperatorStatusArgs,
    config: &Config,
) -> Result<()> {
    let db = open_database(config)?;
    let state = db
        .operator_running_state(&args.operator_id)
        .with_context(|| format!("failed to read status of {}", args.operator_id))?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&state)?)?;
        return Ok(());
    }
    match (&state.machine_id, &state.tooling_id) {
        (Some(machine_id), Some(tooling_id)) if state.status == DisplayedStatus::Running => {
            writeln!(
                writer,
                "{} is running on {machine_id} with {tooling_id}",
                args.operator_id
            )?;
        }
        (Some(machine_id), Some(tooling_id)) => writeln!(
            writer,
            "{} is in {} on {machine_id} with {tooling_id}",
            args.operator_id, state.status
        )?,
        _ => writeln!(writer, "{} is {}", args.operator_id, state.status)?,
    }
    Ok(())
}
