//! Shift reports compiled from ledger intervals.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::classifier;
use crate::ledger::IntervalRow;
use crate::shift::{ReportRange, Shift, ShiftTable};
use crate::types::ValidationError;

/// Category of the gap rows inserted between an operator's intervals.
pub const NOT_KNOWN_CATEGORY: &str = "NK : Not Known";

/// Operator reports leave out time nobody was planned for.
const NO_PLAN_CATEGORY: &str = "NP : No Plan";

/// Gaps before these short codes are expected and stay unreported.
const EXPLAINED_GAP_CODES: [&str; 2] = ["NP", "BT"];

/// Whose point of view a report takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Machine,
    Operator,
}

impl ReportKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Machine => "machine",
            Self::Operator => "operator",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "machine" => Ok(Self::Machine),
            "operator" => Ok(Self::Operator),
            _ => Err(ValidationError::InvalidStatus {
                field: "report kind",
                value: s.to_string(),
            }),
        }
    }
}

/// One line of a compiled report, in plant-local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub machine_name: String,
    pub operator_name: String,
    pub employee_number: String,
    pub tooling_code: String,
    pub tooling_name: String,
    pub part_no: String,
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    pub shift: Option<Shift>,
    pub duration: String,
    pub downtime_category: String,
    pub short_code: String,
    pub output: i64,
    pub reject: i64,
    pub rework: i64,
    pub remarks: String,
}

impl ReportLine {
    fn from_row(row: IntervalRow, table: &ShiftTable, offset: FixedOffset) -> Self {
        let start = row.start.with_timezone(&offset).naive_local();
        let stop = row.stop.with_timezone(&offset).naive_local();
        let remarks = [
            ("Coil No", &row.traceability.coil_no),
            ("Lot No", &row.traceability.lot_no),
            ("Pack No", &row.traceability.pack_no),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("{label}: {v}")))
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            short_code: short_code(&row.downtime_category),
            machine_name: row.machine_name,
            operator_name: row.operator_name,
            employee_number: row.employee_number,
            tooling_code: row.tooling_code,
            tooling_name: row.tooling_name,
            part_no: row.part_no,
            date: start.date(),
            start,
            stop,
            shift: table.shift_of(start),
            duration: format_duration(stop - start),
            downtime_category: row.downtime_category,
            output: row.counters.output,
            reject: row.counters.reject,
            rework: row.counters.rework,
            remarks,
        }
    }

    /// An unexplained gap in an operator's day.
    fn gap(operator: &Self, start: NaiveDateTime, stop: NaiveDateTime, table: &ShiftTable) -> Self {
        Self {
            machine_name: String::new(),
            operator_name: operator.operator_name.clone(),
            employee_number: operator.employee_number.clone(),
            tooling_code: String::new(),
            tooling_name: String::new(),
            part_no: String::new(),
            date: start.date(),
            start,
            stop,
            shift: table.shift_of(start),
            duration: format_duration(stop - start),
            downtime_category: NOT_KNOWN_CATEGORY.to_string(),
            short_code: short_code(NOT_KNOWN_CATEGORY),
            output: 0,
            reject: 0,
            rework: 0,
            remarks: String::new(),
        }
    }
}

/// Turns scanned intervals into report lines.
///
/// Machine reports list every interval by machine. Operator reports fill
/// unexplained gaps between an operator's consecutive intervals with
/// [`NOT_KNOWN_CATEGORY`] lines and leave out no-plan time.
pub fn compile_report(
    rows: Vec<IntervalRow>,
    kind: ReportKind,
    table: &ShiftTable,
    offset: FixedOffset,
) -> Vec<ReportLine> {
    let mut lines: Vec<ReportLine> = rows
        .into_iter()
        .map(|row| ReportLine::from_row(row, table, offset))
        .collect();

    match kind {
        ReportKind::Machine => {
            lines.sort_by(|a, b| (&a.machine_name, a.start).cmp(&(&b.machine_name, b.start)));
            lines
        }
        ReportKind::Operator => {
            lines.sort_by(|a, b| (&a.operator_name, a.start).cmp(&(&b.operator_name, b.start)));
            let mut out = Vec::with_capacity(lines.len());
            for line in lines {
                let explained = EXPLAINED_GAP_CODES.contains(&line.short_code.as_str());
                let gap = out
                    .last()
                    .filter(|previous: &&ReportLine| previous.operator_name == line.operator_name)
                    .filter(|previous| line.start > previous.stop && !explained)
                    .map(|previous| ReportLine::gap(&line, previous.stop, line.start, table));
                out.extend(gap);
                out.push(line);
            }
            out.retain(|line| line.downtime_category != NO_PLAN_CATEGORY);
            out
        }
    }
}

/// Formats a duration as `"30sec"`, `"1min 30sec"` or `"2h 1min 30sec"`.
///
/// Units below the largest non-zero one are always shown. Negative durations
/// format as zero.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let (h, m, s) = (total / 3600, total % 3600 / 60, total % 60);
    if h > 0 {
        format!("{h}h {m}min {s}sec")
    } else if m > 0 {
        format!("{m}min {s}sec")
    } else {
        format!("{s}sec")
    }
}

/// Upper-cased short code of a category, trimmed, as shown in report code
/// columns. A category too short to carry a code is shown whole.
fn short_code(category: &str) -> String {
    classifier::short_code(category).map_or_else(
        |_| category.trim().to_uppercase(),
        |code| code.trim().to_string(),
    )
}

/// File name, without extension, for a report over `range`.
pub fn report_file_stem(kind: ReportKind, range: &ReportRange) -> String {
    let ReportRange {
        date_from,
        shift_from,
        date_to,
        shift_to,
    } = range;
    if date_from != date_to {
        format!("result_{kind}_{date_from}_shift_{shift_from}_to_{date_to}_shift_{shift_to}")
    } else if shift_from != shift_to {
        format!("result_{kind}_{date_from}_shift_{shift_from}_to_shift_{shift_to}")
    } else {
        format!("result_{kind}_{date_from}_shift_{shift_from}")
    }
}
