//! The machine activity state machine.
//!
//! Each transition reads the machine's status row, checks that the transition
//! is legal for the raw status, appends one log event and one interval, and
//! rewrites the machine and operator status rows. Callers run each transition
//! inside one storage transaction; the engine validates everything it can
//! before its first write.
//!
//! # Bootstrap
//!
//! A machine without a status row has never been observed. Its first event
//! gets a counterpart event five seconds earlier, recorded with
//! [`OBJECT_CREATION_CATEGORY`], so the first transition closes an ordinary
//! interval like every later one.
//!
//! # Interval categories
//!
//! An interval carries the category of the event that opened it. START events
//! are recorded with [`UTILITY_CATEGORY`], so production intervals are utility
//! intervals, and a downtime interval carries the category of the stop that
//! began it, never the category being submitted.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::activity::{
    Activity, ActivityError, ActivityOutcome, Binding, ContinueStopActivity, FirstStopActivity,
    StartActivity,
};
use crate::classifier::{self, Classification, OBJECT_CREATION_CATEGORY, UTILITY_CATEGORY};
use crate::guard::{self, Admission};
use crate::ledger::{Counters, IntervalKind, LogEvent, LogKind, NewInterval, NewLogEvent, Traceability};
use crate::status::{DisplayedStatus, MachineStatus, OperatorStatus, RawStatus};
use crate::store::ActivityStore;
use crate::types::{LogEventId, MachineId, OperatorId};

/// How far before the first observed event its synthetic counterpart is placed.
pub const BOOTSTRAP_OFFSET: Duration = Duration::seconds(5);

/// Admits and applies an activity: machine check, operator check, transition.
pub fn submit<S: ActivityStore + ?Sized>(
    store: &mut S,
    activity: &Activity,
    now: DateTime<Utc>,
) -> Result<ActivityOutcome, ActivityError> {
    let binding = activity.binding();
    match guard::check(
        store,
        &binding.tooling_id,
        &binding.machine_id,
        &binding.operator_id,
    )? {
        Admission::Admitted => apply(store, activity, now),
        Admission::Denied(conflict) => {
            warn!(kind = %activity.kind(), machine_id = %binding.machine_id, operator_id = %binding.operator_id, "activity denied");
            Err(ActivityError::Denied(conflict))
        }
    }
}

/// Applies an activity without admission checks.
pub fn apply<S: ActivityStore + ?Sized>(
    store: &mut S,
    activity: &Activity,
    now: DateTime<Utc>,
) -> Result<ActivityOutcome, ActivityError> {
    match activity {
        Activity::Start(start_activity) => start(store, start_activity, now),
        Activity::FirstStop(stop) => first_stop(store, stop, now),
        Activity::ContinueStop(stop) => continue_stop(store, stop, now),
    }
}

/// Starts production, closing the downtime that preceded it.
pub fn start<S: ActivityStore + ?Sized>(
    store: &mut S,
    activity: &StartActivity,
    now: DateTime<Utc>,
) -> Result<ActivityOutcome, ActivityError> {
    let binding = &activity.binding;
    let existing = store.machine_status(&binding.machine_id)?;
    if existing.as_ref().is_some_and(MachineStatus::is_running) {
        return Err(ActivityError::AlreadyRunning {
            machine_id: binding.machine_id.clone(),
        });
    }

    let (mut status, bootstrap_event) = load_or_bootstrap(store, existing, binding, LogKind::Stop, now)?;
    let opening = opening_event(store, &status, status.last_stop_event_id, now)?;

    let event = store.append_event(NewLogEvent {
        tooling_id: binding.tooling_id.clone(),
        machine_id: binding.machine_id.clone(),
        operator_id: binding.operator_id.clone(),
        timestamp: now,
        output: None,
        downtime_category: UTILITY_CATEGORY.to_string(),
        kind: LogKind::Start,
    })?;
    let interval = store.append_interval(NewInterval {
        kind: IntervalKind::LastDowntime,
        machine_id: binding.machine_id.clone(),
        operator_id: opening.operator_id.clone(),
        start_event_id: opening.id,
        stop_event_id: event.id,
        counters: Counters {
            output: 0,
            reject: activity.reject,
            rework: activity.rework,
        },
        downtime_category: opening.downtime_category,
        traceability: Traceability::default(),
    })?;

    if let Some(previous) = status
        .last_operator_id
        .as_ref()
        .filter(|previous| **previous != binding.operator_id)
    {
        release_operator(store, previous, &binding.machine_id)?;
    }
    store.upsert_operator_status(&OperatorStatus {
        operator_id: binding.operator_id.clone(),
        displayed_status: DisplayedStatus::Running,
        last_tooling_id: binding.tooling_id.clone(),
        last_machine_id: binding.machine_id.clone(),
    })?;

    status.raw_status = RawStatus::Running;
    status.displayed_status = DisplayedStatus::Running;
    status.category_downtime = UTILITY_CATEGORY.to_string();
    status.last_start_event_id = event.id;
    status.last_tooling_id = binding.tooling_id.clone();
    status.last_operator_id = Some(binding.operator_id.clone());
    store.upsert_machine_status(&status)?;

    debug!(
        machine_id = %binding.machine_id,
        operator_id = %binding.operator_id,
        event_id = %event.id,
        closed = %interval.downtime_category,
        "machine started"
    );
    Ok(ActivityOutcome {
        bootstrap_event,
        event,
        interval,
        machine_status: status,
    })
}

/// Stops production, closing the utility interval and opening a downtime.
pub fn first_stop<S: ActivityStore + ?Sized>(
    store: &mut S,
    activity: &FirstStopActivity,
    now: DateTime<Utc>,
) -> Result<ActivityOutcome, ActivityError> {
    let binding = &activity.binding;
    let classification = classifier::classify(&activity.downtime_category)?;
    let existing = store.machine_status(&binding.machine_id)?;
    if existing.as_ref().is_some_and(|status| !status.is_running()) {
        return Err(ActivityError::NotRunning {
            machine_id: binding.machine_id.clone(),
        });
    }

    let (mut status, bootstrap_event) = load_or_bootstrap(store, existing, binding, LogKind::Start, now)?;
    let opening = opening_event(store, &status, status.last_start_event_id, now)?;

    let event = store.append_event(NewLogEvent {
        tooling_id: binding.tooling_id.clone(),
        machine_id: binding.machine_id.clone(),
        operator_id: binding.operator_id.clone(),
        timestamp: now,
        output: activity.output,
        downtime_category: activity.downtime_category.clone(),
        kind: LogKind::Stop,
    })?;
    let interval = store.append_interval(NewInterval {
        kind: IntervalKind::Utility,
        machine_id: binding.machine_id.clone(),
        operator_id: opening.operator_id.clone(),
        start_event_id: opening.id,
        stop_event_id: event.id,
        counters: Counters {
            output: activity.output.unwrap_or(0),
            reject: activity.reject,
            rework: activity.rework,
        },
        downtime_category: opening.downtime_category,
        traceability: activity.traceability.clone(),
    })?;

    settle_stop(store, &mut status, binding, &event, &activity.downtime_category, &classification)?;

    debug!(
        machine_id = %binding.machine_id,
        operator_id = %binding.operator_id,
        event_id = %event.id,
        output = ?activity.output,
        raw_status = %status.raw_status,
        displayed_status = %status.displayed_status,
        "machine stopped"
    );
    Ok(ActivityOutcome {
        bootstrap_event,
        event,
        interval,
        machine_status: status,
    })
}

/// Replaces the downtime category of a stopped machine.
pub fn continue_stop<S: ActivityStore + ?Sized>(
    store: &mut S,
    activity: &ContinueStopActivity,
    now: DateTime<Utc>,
) -> Result<ActivityOutcome, ActivityError> {
    let binding = &activity.binding;
    let classification = classifier::classify(&activity.downtime_category)?;
    let existing = store.machine_status(&binding.machine_id)?;
    if existing.as_ref().is_some_and(MachineStatus::is_running) {
        return Err(ActivityError::MachineIsRunning {
            machine_id: binding.machine_id.clone(),
        });
    }

    // An unobserved machine is taken to have stopped five seconds ago.
    let (mut status, bootstrap_event) = load_or_bootstrap(store, existing, binding, LogKind::Start, now)?;
    if bootstrap_event.is_some() {
        status.raw_status = RawStatus::Idle;
        status.displayed_status = DisplayedStatus::Idle;
    }
    let opening = opening_event(store, &status, status.last_stop_event_id, now)?;

    let event = store.append_event(NewLogEvent {
        tooling_id: binding.tooling_id.clone(),
        machine_id: binding.machine_id.clone(),
        operator_id: binding.operator_id.clone(),
        timestamp: now,
        output: None,
        downtime_category: activity.downtime_category.clone(),
        kind: LogKind::Stop,
    })?;
    let interval = store.append_interval(NewInterval {
        kind: IntervalKind::ContinuedDowntime,
        machine_id: binding.machine_id.clone(),
        operator_id: opening.operator_id.clone(),
        start_event_id: opening.id,
        stop_event_id: event.id,
        counters: Counters {
            output: 0,
            reject: activity.reject,
            rework: activity.rework,
        },
        downtime_category: opening.downtime_category,
        traceability: Traceability::default(),
    })?;

    settle_stop(store, &mut status, binding, &event, &activity.downtime_category, &classification)?;

    debug!(
        machine_id = %binding.machine_id,
        operator_id = %binding.operator_id,
        event_id = %event.id,
        closed = %interval.downtime_category,
        opened = %activity.downtime_category,
        "downtime continued"
    );
    Ok(ActivityOutcome {
        bootstrap_event,
        event,
        interval,
        machine_status: status,
    })
}

/// Returns the existing status, or synthesizes the first observation of the machine.
///
/// The synthetic event becomes both the last start and the last stop of the
/// new status row; the transition then overwrites the one it moves forward.
fn load_or_bootstrap<S: ActivityStore + ?Sized>(
    store: &mut S,
    existing: Option<MachineStatus>,
    binding: &Binding,
    kind: LogKind,
    now: DateTime<Utc>,
) -> Result<(MachineStatus, Option<LogEvent>), ActivityError> {
    if let Some(status) = existing {
        return Ok((status, None));
    }

    let synthetic = store.append_event(NewLogEvent {
        tooling_id: binding.tooling_id.clone(),
        machine_id: binding.machine_id.clone(),
        operator_id: binding.operator_id.clone(),
        timestamp: now - BOOTSTRAP_OFFSET,
        output: None,
        downtime_category: OBJECT_CREATION_CATEGORY.to_string(),
        kind,
    })?;
    let (raw_status, displayed_status) = match kind {
        LogKind::Start => (RawStatus::Running, DisplayedStatus::Running),
        LogKind::Stop => (RawStatus::Idle, DisplayedStatus::Idle),
    };
    debug!(machine_id = %binding.machine_id, event_id = %synthetic.id, "machine first observed");

    let status = MachineStatus {
        machine_id: binding.machine_id.clone(),
        raw_status,
        displayed_status,
        last_start_event_id: synthetic.id,
        last_stop_event_id: synthetic.id,
        last_tooling_id: binding.tooling_id.clone(),
        last_operator_id: Some(binding.operator_id.clone()),
        category_downtime: OBJECT_CREATION_CATEGORY.to_string(),
    };
    Ok((status, Some(synthetic)))
}

/// Loads the event that opened the interval about to be closed.
fn opening_event<S: ActivityStore + ?Sized>(
    store: &S,
    status: &MachineStatus,
    event_id: LogEventId,
    now: DateTime<Utc>,
) -> Result<LogEvent, ActivityError> {
    let opening = store
        .event(event_id)?
        .ok_or_else(|| ActivityError::MissingEvent {
            machine_id: status.machine_id.clone(),
            event_id,
        })?;
    if opening.timestamp > now {
        return Err(ActivityError::OutOfOrder {
            machine_id: status.machine_id.clone(),
            event_id,
            at: now,
        });
    }
    Ok(opening)
}

/// Operator and machine bookkeeping shared by both stop transitions.
fn settle_stop<S: ActivityStore + ?Sized>(
    store: &mut S,
    status: &mut MachineStatus,
    binding: &Binding,
    event: &LogEvent,
    category: &str,
    classification: &Classification,
) -> Result<(), ActivityError> {
    let displayed = classification.displayed_status;

    if let Some(previous) = status.last_operator_id.clone() {
        if previous != binding.operator_id || displayed == DisplayedStatus::Idle {
            release_operator(store, &previous, &binding.machine_id)?;
        }
    }
    store.upsert_operator_status(&OperatorStatus {
        operator_id: binding.operator_id.clone(),
        displayed_status: displayed,
        last_tooling_id: binding.tooling_id.clone(),
        last_machine_id: binding.machine_id.clone(),
    })?;

    status.raw_status = classification.raw_status;
    status.displayed_status = displayed;
    status.category_downtime = category.to_string();
    status.last_stop_event_id = event.id;
    status.last_tooling_id = binding.tooling_id.clone();
    status.last_operator_id = Some(binding.operator_id.clone());
    store.upsert_machine_status(status)?;
    Ok(())
}

/// Sets an operator to idle if they are still bound to this machine.
///
/// An operator who already moved on to another machine keeps that binding.
fn release_operator<S: ActivityStore + ?Sized>(
    store: &mut S,
    operator_id: &OperatorId,
    machine_id: &MachineId,
) -> Result<(), ActivityError> {
    let Some(mut operator) = store.operator_status(operator_id)? else {
        return Ok(());
    };
    if operator.last_machine_id != *machine_id {
        return Ok(());
    }
    operator.displayed_status = DisplayedStatus::Idle;
    store.upsert_operator_status(&operator)?;
    debug!(%operator_id, %machine_id, "operator released");
    Ok(())
}
