//! Core domain logic for the machine activity tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Classification: deriving machine status from downtime categories
//! - Admission: deciding whether a machine and an operator are free
//! - The activity engine: recording starts and stops as log events and intervals
//! - Shift windows and report compilation

pub mod activity;
pub mod classifier;
pub mod engine;
pub mod entity;
pub mod guard;
pub mod ledger;
pub mod report;
pub mod shift;
pub mod status;
pub mod store;
pub mod types;

pub use activity::{
    Activity, ActivityError, ActivityKind, ActivityOutcome, ActivityRequest, Binding,
    ContinueStopActivity, FirstStopActivity, StartActivity,
};
pub use classifier::{Classification, InvalidCategory, classify};
pub use entity::{Machine, NewMachine, NewOperator, NewTooling, Operator, Tooling};
pub use guard::{Admission, Conflict};
pub use ledger::{
    ActivityInterval, Counters, IntervalKind, IntervalRow, LogEvent, LogKind, NewInterval,
    NewLogEvent, Traceability,
};
pub use report::{ReportKind, ReportLine, compile_report, report_file_stem};
pub use shift::{ReportRange, Shift, ShiftTable, ShiftWindow};
pub use status::{DisplayedStatus, MachineStatus, OperatorRunningState, OperatorStatus, RawStatus};
pub use store::{ActivityStore, MemoryStore, StoreError};
pub use types::{LogEventId, MachineId, OperatorId, ToolingId, ValidationError};
