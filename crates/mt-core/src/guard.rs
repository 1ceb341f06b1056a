//! Admission checks run before an activity is recorded.
//!
//! A machine and an operator can each be claimed by one running activity.
//! Both checks only read the status rows; the machine check runs first so
//! a double-booked machine is reported before an operator conflict.

use std::fmt;

use tracing::debug;

use crate::classifier::NO_PLANNING_CATEGORY;
use crate::status::DisplayedStatus;
use crate::store::{ActivityStore, StoreError};
use crate::types::{MachineId, OperatorId, ToolingId};

/// Why an activity cannot be admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// The operator is running on another machine or tooling.
    OperatorBusy {
        operator_id: OperatorId,
        machine_id: MachineId,
        tooling_id: ToolingId,
    },
    /// The machine is running under another operator.
    MachineBusy {
        machine_id: MachineId,
        operator_id: Option<OperatorId>,
        tooling_id: ToolingId,
    },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorBusy {
                operator_id,
                machine_id,
                tooling_id,
            } => write!(
                f,
                "ERROR\nOperator {operator_id} is running on\n\
                 Machine:\t{machine_id}\n\
                 Tooling:\t{tooling_id}\n\n\
                 Stop the activity on machine {machine_id} with tooling {tooling_id} \
                 using category {NO_PLANNING_CATEGORY},\n\
                 or assign another operator to that machine."
            ),
            Self::MachineBusy {
                machine_id,
                operator_id,
                tooling_id,
            } => {
                let operator = operator_id.as_ref().map_or("-", OperatorId::as_str);
                write!(
                    f,
                    "ERROR\nMachine {machine_id} is running with\n\
                     Operator:\t{operator}\n\
                     Tooling:\t{tooling_id}\n\n\
                     Stop the machine first."
                )
            }
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Denied(Conflict),
}

impl Admission {
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }

    /// Message for the caller; empty when admitted.
    pub fn message(&self) -> String {
        match self {
            Self::Admitted => String::new(),
            Self::Denied(conflict) => conflict.to_string(),
        }
    }
}

/// Checks that the operator is free, or already bound to this machine and tooling.
pub fn check_operator<S: ActivityStore + ?Sized>(
    store: &S,
    tooling_id: &ToolingId,
    machine_id: &MachineId,
    operator_id: &OperatorId,
) -> Result<Admission, StoreError> {
    let Some(status) = store.operator_status(operator_id)? else {
        return Ok(Admission::Admitted);
    };
    if !status.is_running() || status.is_bound_to(tooling_id, machine_id) {
        return Ok(Admission::Admitted);
    }
    debug!(%operator_id, busy_on = %status.last_machine_id, "operator admission denied");
    Ok(Admission::Denied(Conflict::OperatorBusy {
        operator_id: operator_id.clone(),
        machine_id: status.last_machine_id,
        tooling_id: status.last_tooling_id,
    }))
}

/// Checks that the machine is not running, or is running under this operator.
pub fn check_machine<S: ActivityStore + ?Sized>(
    store: &S,
    machine_id: &MachineId,
    operator_id: &OperatorId,
) -> Result<Admission, StoreError> {
    let Some(status) = store.machine_status(machine_id)? else {
        return Ok(Admission::Admitted);
    };
    if status.displayed_status != DisplayedStatus::Running
        || status.last_operator_id.as_ref() == Some(operator_id)
    {
        return Ok(Admission::Admitted);
    }
    debug!(%machine_id, %operator_id, "machine admission denied");
    Ok(Admission::Denied(Conflict::MachineBusy {
        machine_id: machine_id.clone(),
        operator_id: status.last_operator_id,
        tooling_id: status.last_tooling_id,
    }))
}

/// Runs the machine check, then the operator check.
pub fn check<S: ActivityStore + ?Sized>(
    store: &S,
    tooling_id: &ToolingId,
    machine_id: &MachineId,
    operator_id: &OperatorId,
) -> Result<Admission, StoreError> {
    let machine = check_machine(store, machine_id, operator_id)?;
    if !machine.is_admitted() {
        return Ok(machine);
    }
    check_operator(store, tooling_id, machine_id, operator_id)
}
