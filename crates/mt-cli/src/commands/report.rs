//! Shift report command.
//!
//! This module implements `mt report`: it resolves a shift range to a UTC
//! window, scans the intervals opened inside it, and prints the compiled
//! lines as `;`-separated rows or JSON.

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Args;
use mt_core::{ReportKind, ReportLine, ReportRange, compile_report, report_file_stem};
use serde::Serialize;

use super::open_database;
use crate::Config;

const HEADER: &str = "Date;Shift;Machine;Tooling;Tooling Name;Part No;Operator;Employee No;\
                      Start;Stop;Duration;Code;Category;Output;Reject;Rework;Remarks";

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Report point of view: machine or operator.
    #[arg(long, default_value = "machine")]
    pub kind: ReportKind,

    /// First date (YYYY-MM-DD). Defaults to --date-to, or today.
    #[arg(long)]
    pub date_from: Option<NaiveDate>,

    /// First shift; clamped to 1..=3. Defaults to 1.
    #[arg(long, allow_negative_numbers = true)]
    pub shift_from: Option<i64>,

    /// Last date (YYYY-MM-DD). Defaults to --date-from, or today.
    #[arg(long)]
    pub date_to: Option<NaiveDate>,

    /// Last shift; clamped to 1..=3. Defaults to 3.
    #[arg(long, allow_negative_numbers = true)]
    pub shift_to: Option<i64>,

    /// Also write the rows to `<DIR>/<report name>.csv`.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// JSON shape of a compiled report.
#[derive(Debug, Serialize)]
struct ReportOutput<'a> {
    name: String,
    kind: ReportKind,
    range: ReportRange,
    lines: &'a [ReportLine],
}

pub fn run<W: Write>(writer: &mut W, args: &ReportArgs, config: &Config) -> Result<()> {
    let offset = config.utc_offset().with_context(|| {
        format!("utc_offset_hours out of range: {}", config.utc_offset_hours)
    })?;
    let today = Utc::now().with_timezone(&offset).date_naive();
    let range = ReportRange::normalize(
        args.date_from,
        args.shift_from,
        args.date_to,
        args.shift_to,
        today,
    );
    let window = range.window(&config.shifts, offset);
    tracing::debug!(?range, from = %window.from, to = %window.to, "compiling report");

    let db = open_database(config)?;
    let rows = db
        .scan_intervals(window.from, window.to)
        .context("failed to scan intervals")?;
    let lines = compile_report(rows, args.kind, &config.shifts, offset);
    let name = report_file_stem(args.kind, &range);

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(format!("{name}.csv"));
        std::fs::write(&path, render_rows(&lines))
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), lines = lines.len(), "report written");
    }

    if args.json {
        let output = ReportOutput {
            name,
            kind: args.kind,
            range,
            lines: &lines,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        writeln!(writer, "# {name}")?;
        write!(writer, "{}", render_rows(&lines))?;
    }
    Ok(())
}

/// Header plus one `;`-separated row per line.
fn render_rows(lines: &[ReportLine]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    for line in lines {
        let shift = line.shift.map_or(0, u8::from);
        let _ = writeln!(
            out,
            "{};{shift};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{}",
            line.date,
            line.machine_name,
            line.tooling_code,
            line.tooling_name,
            line.part_no,
            line.operator_name,
            line.employee_number,
            line.start.format("%H:%M:%S"),
            line.stop.format("%H:%M:%S"),
            line.duration,
            line.short_code,
            line.downtime_category,
            line.output,
            line.reject,
            line.rework,
            line.remarks,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, TimeZone};
    use insta::assert_snapshot;
    use mt_core::{Activity, ActivityKind, ActivityRequest, Binding};
    use mt_db::Database;

    use crate::commands::test_support::{config_in, seed};

    fn binding() -> Binding {
        Binding {
            tooling_id: "TL-T100".parse().unwrap(),
            machine_id: "MC-Press-1".parse().unwrap(),
            operator_id: "OP-Budi".parse().unwrap(),
        }
    }

    /// UTC time on 2023-03-15 (a Wednesday); 01:00Z is 08:00 in the plant.
    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 3, 15, h, m, 0).unwrap()
    }

    fn submit(db: &mut Database, request: ActivityRequest, now: DateTime<Utc>) {
        let activity = Activity::try_from(request).unwrap();
        db.submit_activity_at(&activity, now).unwrap();
    }

    /// Budi starts at 08:00, stops for no plan at 08:30 and restarts at 09:00.
    fn record_morning(config: &Config) {
        let mut db = Database::open(&config.database_path).unwrap();
        submit(&mut db, ActivityRequest::new(ActivityKind::Start, binding()), at(1, 0));
        let mut stop = ActivityRequest::new(ActivityKind::FirstStop, binding());
        stop.category_downtime = Some("NP : No Plan".to_string());
        stop.output = Some(120);
        stop.coil_no = Some("C-7".to_string());
        submit(&mut db, stop, at(1, 30));
        submit(&mut db, ActivityRequest::new(ActivityKind::Start, binding()), at(2, 0));
    }

    fn args(kind: ReportKind) -> ReportArgs {
        ReportArgs {
            kind,
            date_from: NaiveDate::from_ymd_opt(2023, 3, 15),
            shift_from: Some(1),
            date_to: None,
            shift_to: Some(1),
            out_dir: None,
            json: false,
        }
    }

    fn run_to_string(args: &ReportArgs, config: &Config) -> String {
        let mut output = Vec::new();
        run(&mut output, args, config).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn machine_report_lists_every_interval() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        seed(&config);
        record_morning(&config);

        let output = run_to_string(&args(ReportKind::Machine), &config);
        assert_snapshot!(output, @r"
        # result_machine_2023-03-15_shift_1
        Date;Shift;Machine;Tooling;Tooling Name;Part No;Operator;Employee No;Start;Stop;Duration;Code;Category;Output;Reject;Rework;Remarks
        2023-03-15;1;Press 1;T100;Bracket Die;P-100;Budi;1001;07:59:55;08:00:00;5sec;OB;Object Creation;0;0;0;
        2023-03-15;1;Press 1;T100;Bracket Die;P-100;Budi;1001;08:00:00;08:30:00;30min 0sec;U;U : Utility;120;0;0;Coil No: C-7
        2023-03-15;1;Press 1;T100;Bracket Die;P-100;Budi;1001;08:30:00;09:00:00;30min 0sec;NP;NP : No Plan;0;0;0;
        ");
    }

    #[test]
    fn operator_report_leaves_out_no_plan_time() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        seed(&config);
        record_morning(&config);

        let output = run_to_string(&args(ReportKind::Operator), &config);
        let rows: Vec<&str> = output.lines().skip(2).collect();
        assert_eq!(rows.len(), 2);
        assert!(output.starts_with("# result_operator_2023-03-15_shift_1\n"));
        assert!(rows.iter().all(|row| !row.contains("NP : No Plan")));
    }

    #[test]
    fn later_shift_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        seed(&config);
        record_morning(&config);

        let mut later = args(ReportKind::Machine);
        later.shift_from = Some(2);
        later.shift_to = Some(7);
        let output = run_to_string(&later, &config);
        assert_snapshot!(output, @r"
        # result_machine_2023-03-15_shift_2_to_shift_3
        Date;Shift;Machine;Tooling;Tooling Name;Part No;Operator;Employee No;Start;Stop;Duration;Code;Category;Output;Reject;Rework;Remarks
        ");
    }

    #[test]
    fn json_report_and_csv_file() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        seed(&config);
        record_morning(&config);

        let out_dir = temp.path().join("reports");
        let mut json = args(ReportKind::Machine);
        json.json = true;
        json.out_dir = Some(out_dir.clone());
        let output = run_to_string(&json, &config);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["name"], "result_machine_2023-03-15_shift_1");
        assert_eq!(parsed["range"]["shift_to"], 1);
        assert_eq!(parsed["lines"].as_array().unwrap().len(), 3);
        assert_eq!(parsed["lines"][1]["duration"], "30min 0sec");

        let csv = std::fs::read_to_string(out_dir.join("result_machine_2023-03-15_shift_1.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.starts_with("Date;Shift;"));
    }
}
