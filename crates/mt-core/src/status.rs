//! Current-state projections for machines and operators.
//!
//! A machine carries two views of the same state: the raw status that drives
//! transition legality and the coarser displayed status shown on the floor
//! board. Operators only carry the displayed view.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{LogEventId, MachineId, OperatorId, ToolingId, ValidationError};

/// Raw machine status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RawStatus {
    Running,
    Idle,
    Setup,
}

impl RawStatus {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Idle => "IDLE",
            Self::Setup => "SETUP",
        }
    }
}

impl fmt::Display for RawStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RawStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RUNNING" => Ok(Self::Running),
            "IDLE" => Ok(Self::Idle),
            "SETUP" => Ok(Self::Setup),
            _ => Err(ValidationError::InvalidStatus {
                field: "raw status",
                value: s.to_string(),
            }),
        }
    }
}

/// Status shown to end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisplayedStatus {
    Running,
    Idle,
    Downtime,
}

impl DisplayedStatus {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Idle => "IDLE",
            Self::Downtime => "DOWNTIME",
        }
    }
}

impl fmt::Display for DisplayedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DisplayedStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RUNNING" => Ok(Self::Running),
            "IDLE" => Ok(Self::Idle),
            "DOWNTIME" => Ok(Self::Downtime),
            _ => Err(ValidationError::InvalidStatus {
                field: "displayed status",
                value: s.to_string(),
            }),
        }
    }
}

/// Persisted current state of one machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineStatus {
    pub machine_id: MachineId,
    pub raw_status: RawStatus,
    pub displayed_status: DisplayedStatus,
    pub last_start_event_id: LogEventId,
    pub last_stop_event_id: LogEventId,
    pub last_tooling_id: ToolingId,
    pub last_operator_id: Option<OperatorId>,
    pub category_downtime: String,
}

impl MachineStatus {
    pub fn is_running(&self) -> bool {
        self.raw_status == RawStatus::Running
    }
}

/// Persisted current state of one operator.
///
/// Only [`DisplayedStatus::Running`] binds the operator to
/// `(last_machine_id, last_tooling_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorStatus {
    pub operator_id: OperatorId,
    pub displayed_status: DisplayedStatus,
    pub last_tooling_id: ToolingId,
    pub last_machine_id: MachineId,
}

impl OperatorStatus {
    pub fn is_running(&self) -> bool {
        self.displayed_status == DisplayedStatus::Running
    }

    /// Whether the operator is currently bound to this machine and tooling.
    pub fn is_bound_to(&self, tooling_id: &ToolingId, machine_id: &MachineId) -> bool {
        self.last_tooling_id == *tooling_id && self.last_machine_id == *machine_id
    }
}

/// Answer to "is this operator busy right now?".
///
/// Every status other than IDLE counts as busy and names the operator's
/// machine and tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorRunningState {
    pub is_running: bool,
    pub status: DisplayedStatus,
    pub tooling_id: Option<ToolingId>,
    pub machine_id: Option<MachineId>,
}

impl OperatorRunningState {
    /// Builds the answer from an optional status row.
    pub fn from_status(status: Option<&OperatorStatus>) -> Self {
        match status {
            Some(status) if status.displayed_status != DisplayedStatus::Idle => Self {
                is_running: true,
                status: status.displayed_status,
                tooling_id: Some(status.last_tooling_id.clone()),
                machine_id: Some(status.last_machine_id.clone()),
            },
            Some(status) => Self {
                is_running: false,
                status: status.displayed_status,
                tooling_id: None,
                machine_id: None,
            },
            None => Self {
                is_running: false,
                status: DisplayedStatus::Idle,
                tooling_id: None,
                machine_id: None,
            },
        }
    }
}
