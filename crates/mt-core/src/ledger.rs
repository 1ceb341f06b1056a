//! Machine log events and the intervals derived from them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LogEventId, MachineId, OperatorId, ToolingId, ValidationError};

/// Whether a log event started or stopped the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogKind {
    Start,
    Stop,
}

impl LogKind {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Stop => "STOP",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "START" => Ok(Self::Start),
            "STOP" => Ok(Self::Stop),
            _ => Err(ValidationError::InvalidStatus {
                field: "log kind",
                value: s.to_string(),
            }),
        }
    }
}

/// A log event before storage assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEvent {
    pub tooling_id: ToolingId,
    pub machine_id: MachineId,
    pub operator_id: OperatorId,
    pub timestamp: DateTime<Utc>,
    pub output: Option<i64>,
    pub downtime_category: String,
    pub kind: LogKind,
}

/// One physical start or stop action on a machine. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub id: LogEventId,
    pub tooling_id: ToolingId,
    pub machine_id: MachineId,
    pub operator_id: OperatorId,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<i64>,
    pub downtime_category: String,
    pub kind: LogKind,
}

impl NewLogEvent {
    /// Attaches the id assigned by storage.
    pub fn with_id(self, id: LogEventId) -> LogEvent {
        LogEvent {
            id,
            tooling_id: self.tooling_id,
            machine_id: self.machine_id,
            operator_id: self.operator_id,
            timestamp: self.timestamp,
            output: self.output,
            downtime_category: self.downtime_category,
            kind: self.kind,
        }
    }
}

/// Which transition closed an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntervalKind {
    /// Start to stop: the machine was producing.
    Utility,
    /// Stop to start: the downtime that a start ended.
    LastDowntime,
    /// Stop to stop: a downtime replaced by another category.
    ContinuedDowntime,
}

impl IntervalKind {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Utility => "UTILITY",
            Self::LastDowntime => "LAST_DOWNTIME",
            Self::ContinuedDowntime => "CONTINUED_DOWNTIME",
        }
    }
}

impl FromStr for IntervalKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UTILITY" => Ok(Self::Utility),
            "LAST_DOWNTIME" => Ok(Self::LastDowntime),
            "CONTINUED_DOWNTIME" => Ok(Self::ContinuedDowntime),
            _ => Err(ValidationError::InvalidStatus {
                field: "interval kind",
                value: s.to_string(),
            }),
        }
    }
}

/// Production counters attached to a closed interval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub output: i64,
    pub reject: i64,
    pub rework: i64,
}

/// Traceability numbers recorded when production stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traceability {
    pub coil_no: Option<String>,
    pub lot_no: Option<String>,
    pub pack_no: Option<String>,
}

/// An interval before storage assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInterval {
    pub kind: IntervalKind,
    pub machine_id: MachineId,
    pub operator_id: OperatorId,
    pub start_event_id: LogEventId,
    pub stop_event_id: LogEventId,
    pub counters: Counters,
    pub downtime_category: String,
    pub traceability: Traceability,
}

/// A bounded duration of production or downtime between two log events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityInterval {
    pub id: i64,
    pub kind: IntervalKind,
    pub machine_id: MachineId,
    pub operator_id: OperatorId,
    pub start_event_id: LogEventId,
    pub stop_event_id: LogEventId,
    pub counters: Counters,
    pub downtime_category: String,
    pub traceability: Traceability,
}

/// A ledger interval joined with the names a report needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervalRow {
    pub interval_id: i64,
    pub kind: IntervalKind,
    pub machine_name: String,
    pub operator_name: String,
    pub employee_number: String,
    pub tooling_code: String,
    pub tooling_name: String,
    pub part_no: String,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub downtime_category: String,
    pub counters: Counters,
    pub traceability: Traceability,
}

impl IntervalRow {
    pub fn duration(&self) -> Duration {
        self.stop.signed_duration_since(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_kind_parses_storage_strings() {
        assert_eq!("START".parse::<LogKind>().unwrap(), LogKind::Start);
        assert_eq!("STOP".parse::<LogKind>().unwrap(), LogKind::Stop);
        assert!("start".parse::<LogKind>().is_err());
    }

    #[test]
    fn interval_kind_roundtrips() {
        for kind in [
            IntervalKind::Utility,
            IntervalKind::LastDowntime,
            IntervalKind::ContinuedDowntime,
        ] {
            assert_eq!(kind.as_str().parse::<IntervalKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn with_id_keeps_fields() {
        let event = NewLogEvent {
            tooling_id: ToolingId::new("TL-1").unwrap(),
            machine_id: MachineId::new("MC-1").unwrap(),
            operator_id: OperatorId::new("OP-Budi").unwrap(),
            timestamp: Utc::now(),
            output: Some(3),
            downtime_category: "NP : No Plan".to_string(),
            kind: LogKind::Stop,
        };
        let stored = event.clone().with_id(LogEventId(7));
        assert_eq!(stored.id, LogEventId(7));
        assert_eq!(stored.output, Some(3));
        assert_eq!(stored.kind, event.kind);
    }
}
