//! Storage seam for the activity engine.
//!
//! The engine and the admission guard only see this trait. The SQLite layer
//! implements it on a transaction so that one submission is one atomic unit;
//! [`MemoryStore`] is a plain in-process implementation.

use std::collections::HashMap;
use std::error::Error as StdError;

use thiserror::Error;

use crate::ledger::{ActivityInterval, LogEvent, NewInterval, NewLogEvent};
use crate::status::{MachineStatus, OperatorStatus};
use crate::types::{LogEventId, MachineId, OperatorId};

/// Failure reported by a storage backend.
///
/// Nothing from the failed transition is persisted, so retrying is safe.
#[derive(Debug, Error)]
#[error("storage error: {source}")]
pub struct StoreError {
    #[source]
    source: Box<dyn StdError + Send + Sync>,
}

impl StoreError {
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Keyed access to status rows plus append-only access to the ledger.
pub trait ActivityStore {
    fn machine_status(&self, machine_id: &MachineId) -> Result<Option<MachineStatus>, StoreError>;

    fn upsert_machine_status(&mut self, status: &MachineStatus) -> Result<(), StoreError>;

    fn operator_status(
        &self,
        operator_id: &OperatorId,
    ) -> Result<Option<OperatorStatus>, StoreError>;

    fn upsert_operator_status(&mut self, status: &OperatorStatus) -> Result<(), StoreError>;

    /// Appends a log event and returns it with its assigned id.
    fn append_event(&mut self, event: NewLogEvent) -> Result<LogEvent, StoreError>;

    fn event(&self, id: LogEventId) -> Result<Option<LogEvent>, StoreError>;

    /// Appends an interval and returns it with its assigned id.
    fn append_interval(&mut self, interval: NewInterval) -> Result<ActivityInterval, StoreError>;
}

/// In-process store backed by maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    machines: HashMap<MachineId, MachineStatus>,
    operators: HashMap<OperatorId, OperatorStatus>,
    events: Vec<LogEvent>,
    intervals: Vec<ActivityInterval>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against this store, restoring the previous contents if it fails.
    pub fn atomically<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let snapshot = self.clone();
        let result = f(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn intervals(&self) -> &[ActivityInterval] {
        &self.intervals
    }
}

impl ActivityStore for MemoryStore {
    fn machine_status(&self, machine_id: &MachineId) -> Result<Option<MachineStatus>, StoreError> {
        Ok(self.machines.get(machine_id).cloned())
    }

    fn upsert_machine_status(&mut self, status: &MachineStatus) -> Result<(), StoreError> {
        self.machines
            .insert(status.machine_id.clone(), status.clone());
        Ok(())
    }

    fn operator_status(
        &self,
        operator_id: &OperatorId,
    ) -> Result<Option<OperatorStatus>, StoreError> {
        Ok(self.operators.get(operator_id).cloned())
    }

    fn upsert_operator_status(&mut self, status: &OperatorStatus) -> Result<(), StoreError> {
        self.operators
            .insert(status.operator_id.clone(), status.clone());
        Ok(())
    }

    fn append_event(&mut self, event: NewLogEvent) -> Result<LogEvent, StoreError> {
        let id = LogEventId(i64::try_from(self.events.len()).map_err(StoreError::new)? + 1);
        let event = event.with_id(id);
        self.events.push(event.clone());
        Ok(event)
    }

    fn event(&self, id: LogEventId) -> Result<Option<LogEvent>, StoreError> {
        Ok(self.events.iter().find(|event| event.id == id).cloned())
    }

    fn append_interval(&mut self, interval: NewInterval) -> Result<ActivityInterval, StoreError> {
        let id = i64::try_from(self.intervals.len()).map_err(StoreError::new)? + 1;
        let interval = ActivityInterval {
            id,
            kind: interval.kind,
            machine_id: interval.machine_id,
            operator_id: interval.operator_id,
            start_event_id: interval.start_event_id,
            stop_event_id: interval.stop_event_id,
            counters: interval.counters,
            downtime_category: interval.downtime_category,
            traceability: interval.traceability,
        };
        self.intervals.push(interval.clone());
        Ok(interval)
    }
}
