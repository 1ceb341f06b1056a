//! Activity submission: `mt activity start|first-stop|continue-stop`.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use clap::{Args, Subcommand};
use mt_core::{
    ActivityKind, ActivityOutcome, ActivityRequest, Binding, LogEvent, MachineId, OperatorId,
    ToolingId,
};

use super::open_database;
use crate::Config;

#[derive(Debug, Subcommand)]
pub enum ActivityAction {
    /// Start production; closes the running downtime.
    Start(StartArgs),
    /// Stop production; closes the utility interval.
    FirstStop(FirstStopArgs),
    /// Change the downtime category of a stopped machine.
    ContinueStop(ContinueStopArgs),
}

/// The tooling, machine and operator an activity is recorded against.
#[derive(Debug, Args)]
pub struct BindingArgs {
    /// Tooling ID (e.g., TL-T100).
    #[arg(long)]
    pub tooling: ToolingId,
    /// Machine ID (e.g., MC-Press-1).
    #[arg(long)]
    pub machine: MachineId,
    /// Operator ID (e.g., OP-Budi).
    #[arg(long)]
    pub operator: OperatorId,
}

impl BindingArgs {
    fn binding(&self) -> Binding {
        Binding {
            tooling_id: self.tooling.clone(),
            machine_id: self.machine.clone(),
            operator_id: self.operator.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct QualityArgs {
    /// Rejected parts.
    #[arg(long)]
    pub reject: Option<i64>,
    /// Reworked parts.
    #[arg(long)]
    pub rework: Option<i64>,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct StartArgs {
    #[command(flatten)]
    pub binding: BindingArgs,
    #[command(flatten)]
    pub quality: QualityArgs,
}

#[derive(Debug, Args)]
pub struct FirstStopArgs {
    #[command(flatten)]
    pub binding: BindingArgs,
    /// Downtime category, e.g. "NP : No Plan".
    #[arg(long)]
    pub category: String,
    /// Parts produced since the start.
    #[arg(long)]
    pub output: Option<i64>,
    #[arg(long)]
    pub coil_no: Option<String>,
    #[arg(long)]
    pub lot_no: Option<String>,
    #[arg(long)]
    pub pack_no: Option<String>,
    #[command(flatten)]
    pub quality: QualityArgs,
}

#[derive(Debug, Args)]
pub struct ContinueStopArgs {
    #[command(flatten)]
    pub binding: BindingArgs,
    /// The new downtime category.
    #[arg(long)]
    pub category: String,
    #[command(flatten)]
    pub quality: QualityArgs,
}

impl ActivityAction {
    fn request(&self) -> ActivityRequest {
        match self {
            Self::Start(args) => {
                let mut request = ActivityRequest::new(ActivityKind::Start, args.binding.binding());
                request.reject = args.quality.reject;
                request.rework = args.quality.rework;
                request
            }
            Self::FirstStop(args) => {
                let mut request =
                    ActivityRequest::new(ActivityKind::FirstStop, args.binding.binding());
                request.category_downtime = Some(args.category.clone());
                request.output = args.output;
                request.reject = args.quality.reject;
                request.rework = args.quality.rework;
                request.coil_no.clone_from(&args.coil_no);
                request.lot_no.clone_from(&args.lot_no);
                request.pack_no.clone_from(&args.pack_no);
                request
            }
            Self::ContinueStop(args) => {
                let mut request =
                    ActivityRequest::new(ActivityKind::ContinueStop, args.binding.binding());
                request.category_downtime = Some(args.category.clone());
                request.reject = args.quality.reject;
                request.rework = args.quality.rework;
                request
            }
        }
    }

    const fn json(&self) -> bool {
        match self {
            Self::Start(args) => args.quality.json,
            Self::FirstStop(args) => args.quality.json,
            Self::ContinueStop(args) => args.quality.json,
        }
    }
}

pub fn run<W: Write>(writer: &mut W, action: &ActivityAction, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let request = action.request();
    let kind = request.kind;
    let machine_id = request.machine_id.clone();

    let outcome = db
        .submit_activity(request)
        .with_context(|| format!("{kind} on {machine_id} was not recorded"))?;

    if action.json() {
        writeln!(writer, "{}", serde_json::to_string_pretty(&outcome)?)?;
    } else {
        write_outcome(writer, &outcome)?;
    }
    Ok(())
}

fn write_outcome<W: Write>(writer: &mut W, outcome: &ActivityOutcome) -> Result<()> {
    if let Some(event) = &outcome.bootstrap_event {
        writeln!(
            writer,
            "First activity on {}: opened with {} event {} at {}",
            event.machine_id,
            event.kind,
            event.id,
            timestamp(event)
        )?;
    }
    let event = &outcome.event;
    writeln!(
        writer,
        "Recorded {} event {} on {} at {}",
        event.kind,
        event.id,
        event.machine_id,
        timestamp(event)
    )?;
    let interval = &outcome.interval;
    writeln!(
        writer,
        "Closed {} interval {} ({}), output {}, reject {}, rework {}",
        interval.kind.as_str(),
        interval.id,
        interval.downtime_category,
        interval.counters.output,
        interval.counters.reject,
        interval.counters.rework
    )?;
    let status = &outcome.machine_status;
    writeln!(
        writer,
        "Machine {} is now {} ({})",
        status.machine_id, status.displayed_status, status.category_downtime
    )?;
    Ok(())
}

fn timestamp(event: &LogEvent) -> String {
    event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
