//! Activity requests, their typed forms and the errors they can produce.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::InvalidCategory;
use crate::guard::Conflict;
use crate::ledger::{ActivityInterval, LogEvent, Traceability};
use crate::status::MachineStatus;
use crate::store::StoreError;
use crate::types::{LogEventId, MachineId, OperatorId, ToolingId, ValidationError};

/// The three transitions an operator can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Start,
    FirstStop,
    ContinueStop,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::FirstStop => "first_stop",
            Self::ContinueStop => "continue_stop",
        };
        write!(f, "{s}")
    }
}

/// Errors raised while admitting or applying an activity.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// The machine or operator is claimed by another activity.
    #[error("{0}")]
    Denied(Conflict),

    #[error("machine {machine_id} is already running")]
    AlreadyRunning { machine_id: MachineId },

    #[error("machine {machine_id} is not running")]
    NotRunning { machine_id: MachineId },

    #[error("machine {machine_id} is running; stop production before changing the downtime")]
    MachineIsRunning { machine_id: MachineId },

    #[error(transparent)]
    InvalidCategory(#[from] InvalidCategory),

    #[error("{field} is required for a {kind} activity")]
    MissingField {
        field: &'static str,
        kind: ActivityKind,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{kind} not found: {id}")]
    UnknownEntity { kind: &'static str, id: String },

    /// The request would close an interval before it was opened.
    #[error("event at {at} precedes the open event {event_id} of machine {machine_id}")]
    OutOfOrder {
        machine_id: MachineId,
        event_id: LogEventId,
        at: chrono::DateTime<chrono::Utc>,
    },

    /// A status row points at a log event that does not exist.
    #[error("log event {event_id} referenced by machine {machine_id} is missing")]
    MissingEvent {
        machine_id: MachineId,
        event_id: LogEventId,
    },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ActivityError {
    /// Whether the request itself was refused, as opposed to a storage failure.
    ///
    /// Rejections should not be retried unchanged; storage failures can be.
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::MissingEvent { .. })
    }
}

/// The (tooling, machine, operator) triple every activity is recorded against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub tooling_id: ToolingId,
    pub machine_id: MachineId,
    pub operator_id: OperatorId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartActivity {
    pub binding: Binding,
    pub reject: i64,
    pub rework: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstStopActivity {
    pub binding: Binding,
    /// Units produced; absent when the client did not report a count.
    pub output: Option<i64>,
    pub downtime_category: String,
    pub reject: i64,
    pub rework: i64,
    pub traceability: Traceability,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinueStopActivity {
    pub binding: Binding,
    pub downtime_category: String,
    pub reject: i64,
    pub rework: i64,
}

/// A validated activity, one variant per transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    Start(StartActivity),
    FirstStop(FirstStopActivity),
    ContinueStop(ContinueStopActivity),
}

impl Activity {
    pub const fn binding(&self) -> &Binding {
        match self {
            Self::Start(a) => &a.binding,
            Self::FirstStop(a) => &a.binding,
            Self::ContinueStop(a) => &a.binding,
        }
    }

    pub const fn kind(&self) -> ActivityKind {
        match self {
            Self::Start(_) => ActivityKind::Start,
            Self::FirstStop(_) => ActivityKind::FirstStop,
            Self::ContinueStop(_) => ActivityKind::ContinueStop,
        }
    }
}

/// Loosely typed submission as it arrives from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRequest {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub tooling_id: ToolingId,
    #[serde(alias = "mesin_id")]
    pub machine_id: MachineId,
    pub operator_id: OperatorId,
    #[serde(default)]
    pub category_downtime: Option<String>,
    #[serde(default)]
    pub output: Option<i64>,
    #[serde(default)]
    pub reject: Option<i64>,
    #[serde(default)]
    pub rework: Option<i64>,
    #[serde(default)]
    pub coil_no: Option<String>,
    #[serde(default)]
    pub lot_no: Option<String>,
    #[serde(default)]
    pub pack_no: Option<String>,
}

impl ActivityRequest {
    /// A request carrying only the kind and the binding.
    pub fn new(kind: ActivityKind, binding: Binding) -> Self {
        Self {
            kind,
            tooling_id: binding.tooling_id,
            machine_id: binding.machine_id,
            operator_id: binding.operator_id,
            category_downtime: None,
            output: None,
            reject: None,
            rework: None,
            coil_no: None,
            lot_no: None,
            pack_no: None,
        }
    }
}

impl TryFrom<ActivityRequest> for Activity {
    type Error = ActivityError;

    fn try_from(request: ActivityRequest) -> Result<Self, Self::Error> {
        let binding = Binding {
            tooling_id: request.tooling_id,
            machine_id: request.machine_id,
            operator_id: request.operator_id,
        };
        let reject = request.reject.unwrap_or(0);
        let rework = request.rework.unwrap_or(0);
        let category = |kind| {
            request
                .category_downtime
                .clone()
                .filter(|c| !c.trim().is_empty())
                .ok_or(ActivityError::MissingField {
                    field: "category_downtime",
                    kind,
                })
        };

        match request.kind {
            ActivityKind::Start => Ok(Self::Start(StartActivity {
                binding,
                reject,
                rework,
            })),
            ActivityKind::FirstStop => Ok(Self::FirstStop(FirstStopActivity {
                downtime_category: category(ActivityKind::FirstStop)?,
                binding,
                output: request.output,
                reject,
                rework,
                traceability: Traceability {
                    coil_no: blank_to_none(request.coil_no),
                    lot_no: blank_to_none(request.lot_no),
                    pack_no: blank_to_none(request.pack_no),
                },
            })),
            ActivityKind::ContinueStop => Ok(Self::ContinueStop(ContinueStopActivity {
                downtime_category: category(ActivityKind::ContinueStop)?,
                binding,
                reject,
                rework,
            })),
        }
    }
}

/// Traceability numbers of `-` or blank mean "not recorded".
fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| {
        let v = v.trim();
        !v.is_empty() && v != "-"
    })
}

/// Everything one successful transition wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityOutcome {
    /// Counterpart event synthesized on the machine's first observation.
    pub bootstrap_event: Option<LogEvent>,
    pub event: LogEvent,
    pub interval: ActivityInterval,
    pub machine_status: MachineStatus,
}
