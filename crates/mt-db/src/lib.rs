//! Storage layer for the machine activity tracker.
//!
//! Provides persistence for registered entities, the machine log, activity
//! intervals and status rows using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! This means a `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! Submissions from several processes are serialized by SQLite itself: every
//! activity runs in an `IMMEDIATE` transaction, which takes the write lock
//! before the status rows are read.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond precision
//! (e.g., `2024-01-15T10:30:00.000Z`), so lexicographic ordering matches
//! chronological ordering.
//!
//! ## Ledger
//!
//! `log_events` and `activity_intervals` are append-only. Intervals reference
//! their opening and closing events by id. `machine_status` and
//! `operator_status` hold one row per entity and are rewritten in place.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use mt_core::engine;
use mt_core::guard::{self, Admission};
use mt_core::{
    Activity, ActivityError, ActivityInterval, ActivityOutcome, ActivityRequest, ActivityStore,
    Binding, Counters, IntervalRow, LogEvent, LogEventId, Machine, MachineId, MachineStatus,
    NewInterval, NewLogEvent, NewMachine, NewOperator, NewTooling, Operator, OperatorId,
    OperatorRunningState, OperatorStatus, RawStatus, StoreError, Tooling, ToolingId, Traceability,
    ValidationError,
};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Input rejected before it reached the database.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The entity is referenced by the machine log and cannot be removed.
    #[error("{kind} {id} has recorded activity and cannot be removed")]
    EntityInUse { kind: &'static str, id: String },
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS machines (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                tonnage INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS toolings (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL,
                common_name TEXT NOT NULL DEFAULT '',
                customer TEXT NOT NULL DEFAULT '',
                part_no TEXT NOT NULL DEFAULT '',
                part_name TEXT NOT NULL DEFAULT '',
                child_part_name TEXT NOT NULL DEFAULT '',
                process TEXT NOT NULL DEFAULT '',
                standard_hours INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS operators (
                id TEXT PRIMARY KEY,
                employee_number TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Machine log: one row per physical start or stop
            -- kind: 'START' or 'STOP'
            CREATE TABLE IF NOT EXISTS log_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tooling_id TEXT NOT NULL,
                machine_id TEXT NOT NULL,
                operator_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                output INTEGER,
                downtime_category TEXT NOT NULL,
                kind TEXT NOT NULL,
                FOREIGN KEY (tooling_id) REFERENCES toolings(id),
                FOREIGN KEY (machine_id) REFERENCES machines(id),
                FOREIGN KEY (operator_id) REFERENCES operators(id)
            );

            CREATE INDEX IF NOT EXISTS idx_log_events_machine ON log_events(machine_id);
            CREATE INDEX IF NOT EXISTS idx_log_events_timestamp ON log_events(timestamp);

            -- Closed intervals between two log events
            -- kind: 'UTILITY', 'LAST_DOWNTIME' or 'CONTINUED_DOWNTIME'
            CREATE TABLE IF NOT EXISTS activity_intervals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                machine_id TEXT NOT NULL,
                operator_id TEXT NOT NULL,
                start_event_id INTEGER NOT NULL,
                stop_event_id INTEGER NOT NULL,
                output INTEGER NOT NULL DEFAULT 0,
                reject INTEGER NOT NULL DEFAULT 0,
                rework INTEGER NOT NULL DEFAULT 0,
                downtime_category TEXT NOT NULL,
                coil_no TEXT,
                lot_no TEXT,
                pack_no TEXT,
                FOREIGN KEY (machine_id) REFERENCES machines(id),
                FOREIGN KEY (operator_id) REFERENCES operators(id),
                FOREIGN KEY (start_event_id) REFERENCES log_events(id),
                FOREIGN KEY (stop_event_id) REFERENCES log_events(id)
            );

            CREATE INDEX IF NOT EXISTS idx_intervals_machine ON activity_intervals(machine_id);
            CREATE INDEX IF NOT EXISTS idx_intervals_start ON activity_intervals(start_event_id);

            CREATE TABLE IF NOT EXISTS machine_status (
                machine_id TEXT PRIMARY KEY,
                raw_status TEXT NOT NULL,
                displayed_status TEXT NOT NULL,
                last_start_event_id INTEGER NOT NULL,
                last_stop_event_id INTEGER NOT NULL,
                last_tooling_id TEXT NOT NULL,
                last_operator_id TEXT,
                category_downtime TEXT NOT NULL,
                FOREIGN KEY (machine_id) REFERENCES machines(id),
                FOREIGN KEY (last_start_event_id) REFERENCES log_events(id),
                FOREIGN KEY (last_stop_event_id) REFERENCES log_events(id),
                FOREIGN KEY (last_tooling_id) REFERENCES toolings(id),
                FOREIGN KEY (last_operator_id) REFERENCES operators(id)
            );

            CREATE TABLE IF NOT EXISTS operator_status (
                operator_id TEXT PRIMARY KEY,
                displayed_status TEXT NOT NULL,
                last_tooling_id TEXT NOT NULL,
                last_machine_id TEXT NOT NULL,
                FOREIGN KEY (operator_id) REFERENCES operators(id),
                FOREIGN KEY (last_tooling_id) REFERENCES toolings(id),
                FOREIGN KEY (last_machine_id) REFERENCES machines(id)
            );
            ",
        )?;
        Ok(())
    }

    /// Registers a machine, or updates the one with the same derived id.
    pub fn upsert_machine(&mut self, input: &NewMachine) -> Result<Machine, DbError> {
        self.upsert_machine_at(input, Utc::now())
    }

    fn upsert_machine_at(&mut self, input: &NewMachine, now: DateTime<Utc>) -> Result<Machine, DbError> {
        let id = input.id()?;
        self.conn.execute(
            "
            INSERT INTO machines (id, name, tonnage, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                tonnage = excluded.tonnage,
                updated_at = excluded.updated_at
            ",
            params![id.as_str(), input.name.trim(), input.tonnage, format_timestamp(now)],
        )?;
        info!(machine_id = %id, "machine registered");
        self.get_machine(&id)?.ok_or_else(|| not_found("machine", &id))
    }

    pub fn get_machine(&self, id: &MachineId) -> Result<Option<Machine>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, tonnage, created_at, updated_at FROM machines WHERE id = ?",
                [id.as_str()],
                machine_from_row,
            )
            .optional()?)
    }

    /// Lists registered machines ordered by id.
    pub fn list_machines(&self) -> Result<Vec<Machine>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, tonnage, created_at, updated_at FROM machines ORDER BY id")?;
        let rows = stmt.query_map([], machine_from_row)?;
        let mut machines = Vec::new();
        for row in rows {
            machines.push(row?);
        }
        Ok(machines)
    }

    /// Removes a machine that has no recorded activity.
    pub fn delete_machine(&mut self, id: &MachineId) -> Result<(), DbError> {
        self.delete_entity(EntityTable::MACHINE, id.as_str())
    }

    /// Registers a tooling, or updates the one with the same derived id.
    pub fn upsert_tooling(&mut self, input: &NewTooling) -> Result<Tooling, DbError> {
        self.upsert_tooling_at(input, Utc::now())
    }

    fn upsert_tooling_at(&mut self, input: &NewTooling, now: DateTime<Utc>) -> Result<Tooling, DbError> {
        let id = input.id()?;
        self.conn.execute(
            "
            INSERT INTO toolings (
                id, code, common_name, customer, part_no, part_name,
                child_part_name, process, standard_hours, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            ON CONFLICT(id) DO UPDATE SET
                code = excluded.code,
                common_name = excluded.common_name,
                customer = excluded.customer,
                part_no = excluded.part_no,
                part_name = excluded.part_name,
                child_part_name = excluded.child_part_name,
                process = excluded.process,
                standard_hours = excluded.standard_hours,
                updated_at = excluded.updated_at
            ",
            params![
                id.as_str(),
                input.code.trim(),
                input.common_name,
                input.customer,
                input.part_no,
                input.part_name,
                input.child_part_name,
                input.process,
                input.standard_hours,
                format_timestamp(now),
            ],
        )?;
        info!(tooling_id = %id, "tooling registered");
        self.get_tooling(&id)?.ok_or_else(|| not_found("tooling", &id))
    }

    pub fn get_tooling(&self, id: &ToolingId) -> Result<Option<Tooling>, DbError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {TOOLING_COLUMNS} FROM toolings WHERE id = ?"),
                [id.as_str()],
                tooling_from_row,
            )
            .optional()?)
    }

    /// Lists registered toolings ordered by id.
    pub fn list_toolings(&self) -> Result<Vec<Tooling>, DbError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TOOLING_COLUMNS} FROM toolings ORDER BY id"))?;
        let rows = stmt.query_map([], tooling_from_row)?;
        let mut toolings = Vec::new();
        for row in rows {
            toolings.push(row?);
        }
        Ok(toolings)
    }

    pub fn delete_tooling(&mut self, id: &ToolingId) -> Result<(), DbError> {
        self.delete_entity(EntityTable::TOOLING, id.as_str())
    }

    /// Registers an operator, or updates the one with the same derived id.
    pub fn upsert_operator(&mut self, input: &NewOperator) -> Result<Operator, DbError> {
        self.upsert_operator_at(input, Utc::now())
    }

    fn upsert_operator_at(&mut self, input: &NewOperator, now: DateTime<Utc>) -> Result<Operator, DbError> {
        let id = input.id()?;
        self.conn.execute(
            "
            INSERT INTO operators (id, employee_number, name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(id) DO UPDATE SET
                employee_number = excluded.employee_number,
                name = excluded.name,
                updated_at = excluded.updated_at
            ",
            params![
                id.as_str(),
                input.employee_number.trim(),
                input.display_name(),
                format_timestamp(now),
            ],
        )?;
        info!(operator_id = %id, "operator registered");
        self.get_operator(&id)?.ok_or_else(|| not_found("operator", &id))
    }

    pub fn get_operator(&self, id: &OperatorId) -> Result<Option<Operator>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, employee_number, name, created_at, updated_at FROM operators WHERE id = ?",
                [id.as_str()],
                operator_from_row,
            )
            .optional()?)
    }

    /// Lists registered operators ordered by id.
    pub fn list_operators(&self) -> Result<Vec<Operator>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, employee_number, name, created_at, updated_at FROM operators ORDER BY id",
        )?;
        let rows = stmt.query_map([], operator_from_row)?;
        let mut operators = Vec::new();
        for row in rows {
            operators.push(row?);
        }
        Ok(operators)
    }

    pub fn delete_operator(&mut self, id: &OperatorId) -> Result<(), DbError> {
        self.delete_entity(EntityTable::OPERATOR, id.as_str())
    }

    fn delete_entity(&mut self, table: EntityTable, id: &str) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        let in_use: bool = tx.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM log_events WHERE {} = ?)",
                table.log_column
            ),
            [id],
            |row| row.get(0),
        )?;
        if in_use {
            return Err(DbError::EntityInUse {
                kind: table.kind,
                id: id.to_string(),
            });
        }
        let deleted = tx.execute(&format!("DELETE FROM {} WHERE id = ?", table.name), [id])?;
        if deleted == 0 {
            return Err(DbError::NotFound {
                kind: table.kind,
                id: id.to_string(),
            });
        }
        tx.commit()?;
        info!(kind = table.kind, id, "entity removed");
        Ok(())
    }

    /// Validates, admits and records one activity at the current time.
    pub fn submit_activity(&mut self, request: ActivityRequest) -> Result<ActivityOutcome, ActivityError> {
        let activity = Activity::try_from(request)?;
        self.submit_activity_at(&activity, Utc::now())
    }

    /// Records one activity as happening at `now`.
    ///
    /// The admission checks, the transition and every write share one
    /// transaction; on any error nothing is persisted.
    pub fn submit_activity_at(
        &mut self,
        activity: &Activity,
        now: DateTime<Utc>,
    ) -> Result<ActivityOutcome, ActivityError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage_error)?;
        let outcome = {
            ensure_registered(&tx, activity.binding())?;
            let mut store = SqliteStore { conn: &tx };
            engine::submit(&mut store, activity, now)
        };
        match outcome {
            Ok(outcome) => {
                tx.commit().map_err(storage_error)?;
                Ok(outcome)
            }
            Err(err) => {
                if err.is_rejection() {
                    debug!(kind = %activity.kind(), error = %err, "activity rejected");
                } else {
                    warn!(kind = %activity.kind(), error = %err, "activity failed");
                }
                Err(err)
            }
        }
    }

    /// Runs the admission checks without recording anything.
    pub fn check_admission(
        &self,
        tooling_id: &ToolingId,
        machine_id: &MachineId,
        operator_id: &OperatorId,
    ) -> Result<Admission, StoreError> {
        let store = SqliteStore { conn: &self.conn };
        guard::check(&store, tooling_id, machine_id, operator_id)
    }

    /// Raw status of a machine; a machine never observed is idle.
    pub fn machine_raw_status(&self, machine_id: &MachineId) -> Result<RawStatus, DbError> {
        Ok(read_machine_status(&self.conn, machine_id)?
            .map_or(RawStatus::Idle, |status| status.raw_status))
    }

    pub fn machine_status(&self, machine_id: &MachineId) -> Result<Option<MachineStatus>, DbError> {
        read_machine_status(&self.conn, machine_id)
    }

    pub fn operator_status(&self, operator_id: &OperatorId) -> Result<Option<OperatorStatus>, DbError> {
        read_operator_status(&self.conn, operator_id)
    }

    /// Whether an operator is running, and where.
    pub fn operator_running_state(
        &self,
        operator_id: &OperatorId,
    ) -> Result<OperatorRunningState, DbError> {
        let status = read_operator_status(&self.conn, operator_id)?;
        Ok(OperatorRunningState::from_status(status.as_ref()))
    }

    /// The status board: machines not shown as IDLE first, then by id.
    pub fn list_machine_statuses(&self) -> Result<Vec<MachineStatus>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {MACHINE_STATUS_COLUMNS}
            FROM machine_status
            ORDER BY CASE WHEN displayed_status = 'IDLE' THEN 1 ELSE 0 END, machine_id
            "
        ))?;
        let rows = stmt.query_map([], machine_status_from_row)?;
        let mut statuses = Vec::new();
        for row in rows {
            statuses.push(row?);
        }
        Ok(statuses)
    }

    /// Intervals opened in `[from, to)`, joined with the names a report shows.
    ///
    /// Ordered by machine name, then opening time.
    pub fn scan_intervals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<IntervalRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT ai.id, ai.kind, m.name, o.name, o.employee_number,
                   t.code, t.common_name, t.part_no,
                   opened.timestamp, closed.timestamp, ai.downtime_category,
                   ai.output, ai.reject, ai.rework, ai.coil_no, ai.lot_no, ai.pack_no
            FROM activity_intervals ai
            JOIN machines m ON m.id = ai.machine_id
            JOIN log_events opened ON opened.id = ai.start_event_id
            JOIN log_events closed ON closed.id = ai.stop_event_id
            JOIN operators o ON o.id = opened.operator_id
            JOIN toolings t ON t.id = opened.tooling_id
            WHERE opened.timestamp >= ?1 AND opened.timestamp < ?2
            ORDER BY m.name ASC, opened.timestamp ASC, ai.id ASC
            ",
        )?;
        let rows = stmt.query_map(
            params![format_timestamp(from), format_timestamp(to)],
            |row| {
                Ok(IntervalRow {
                    interval_id: row.get(0)?,
                    kind: column(row, 1)?,
                    machine_name: row.get(2)?,
                    operator_name: row.get(3)?,
                    employee_number: row.get(4)?,
                    tooling_code: row.get(5)?,
                    tooling_name: row.get(6)?,
                    part_no: row.get(7)?,
                    start: column(row, 8)?,
                    stop: column(row, 9)?,
                    downtime_category: row.get(10)?,
                    counters: Counters {
                        output: row.get(11)?,
                        reject: row.get(12)?,
                        rework: row.get(13)?,
                    },
                    traceability: Traceability {
                        coil_no: row.get(14)?,
                        lot_no: row.get(15)?,
                        pack_no: row.get(16)?,
                    },
                })
            },
        )?;
        let mut intervals = Vec::new();
        for row in rows {
            intervals.push(row?);
        }
        Ok(intervals)
    }

    /// Lists the machine log in id order.
    pub fn list_events(&self) -> Result<Vec<LogEvent>, DbError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {LOG_EVENT_COLUMNS} FROM log_events ORDER BY id"))?;
        let rows = stmt.query_map([], log_event_from_row)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Lists every interval in id order.
    pub fn list_intervals(&self) -> Result<Vec<ActivityInterval>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {INTERVAL_COLUMNS} FROM activity_intervals ORDER BY id"
        ))?;
        let rows = stmt.query_map([], interval_from_row)?;
        let mut intervals = Vec::new();
        for row in rows {
            intervals.push(row?);
        }
        Ok(intervals)
    }
}

/// Where an entity kind lives and how the log refers to it.
#[derive(Clone, Copy)]
struct EntityTable {
    kind: &'static str,
    name: &'static str,
    log_column: &'static str,
}

impl EntityTable {
    const MACHINE: Self = Self {
        kind: "machine",
        name: "machines",
        log_column: "machine_id",
    };
    const TOOLING: Self = Self {
        kind: "tooling",
        name: "toolings",
        log_column: "tooling_id",
    };
    const OPERATOR: Self = Self {
        kind: "operator",
        name: "operators",
        log_column: "operator_id",
    };
}

/// [`ActivityStore`] over a connection or an open transaction.
struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl ActivityStore for SqliteStore<'_> {
    fn machine_status(&self, machine_id: &MachineId) -> Result<Option<MachineStatus>, StoreError> {
        read_machine_status(self.conn, machine_id).map_err(StoreError::new)
    }

    fn upsert_machine_status(&mut self, status: &MachineStatus) -> Result<(), StoreError> {
        self.conn
            .execute(
                "
                INSERT INTO machine_status (
                    machine_id, raw_status, displayed_status, last_start_event_id,
                    last_stop_event_id, last_tooling_id, last_operator_id, category_downtime
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(machine_id) DO UPDATE SET
                    raw_status = excluded.raw_status,
                    displayed_status = excluded.displayed_status,
                    last_start_event_id = excluded.last_start_event_id,
                    last_stop_event_id = excluded.last_stop_event_id,
                    last_tooling_id = excluded.last_tooling_id,
                    last_operator_id = excluded.last_operator_id,
                    category_downtime = excluded.category_downtime
                ",
                params![
                    status.machine_id.as_str(),
                    status.raw_status.as_str(),
                    status.displayed_status.as_str(),
                    status.last_start_event_id.0,
                    status.last_stop_event_id.0,
                    status.last_tooling_id.as_str(),
                    status.last_operator_id.as_ref().map(OperatorId::as_str),
                    status.category_downtime,
                ],
            )
            .map_err(storage_error)?;
        Ok(())
    }

    fn operator_status(
        &self,
        operator_id: &OperatorId,
    ) -> Result<Option<OperatorStatus>, StoreError> {
        read_operator_status(self.conn, operator_id).map_err(StoreError::new)
    }

    fn upsert_operator_status(&mut self, status: &OperatorStatus) -> Result<(), StoreError> {
        self.conn
            .execute(
                "
                INSERT INTO operator_status (operator_id, displayed_status, last_tooling_id, last_machine_id)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(operator_id) DO UPDATE SET
                    displayed_status = excluded.displayed_status,
                    last_tooling_id = excluded.last_tooling_id,
                    last_machine_id = excluded.last_machine_id
                ",
                params![
                    status.operator_id.as_str(),
                    status.displayed_status.as_str(),
                    status.last_tooling_id.as_str(),
                    status.last_machine_id.as_str(),
                ],
            )
            .map_err(storage_error)?;
        Ok(())
    }

    fn append_event(&mut self, event: NewLogEvent) -> Result<LogEvent, StoreError> {
        self.conn
            .execute(
                "
                INSERT INTO log_events (
                    tooling_id, machine_id, operator_id, timestamp, output, downtime_category, kind
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
                params![
                    event.tooling_id.as_str(),
                    event.machine_id.as_str(),
                    event.operator_id.as_str(),
                    format_timestamp(event.timestamp),
                    event.output,
                    event.downtime_category,
                    event.kind.as_str(),
                ],
            )
            .map_err(storage_error)?;
        Ok(event.with_id(LogEventId(self.conn.last_insert_rowid())))
    }

    fn event(&self, id: LogEventId) -> Result<Option<LogEvent>, StoreError> {
        self.conn
            .query_row(
                &format!("SELECT {LOG_EVENT_COLUMNS} FROM log_events WHERE id = ?"),
                [id.0],
                log_event_from_row,
            )
            .optional()
            .map_err(storage_error)
    }

    fn append_interval(&mut self, interval: NewInterval) -> Result<ActivityInterval, StoreError> {
        self.conn
            .execute(
                "
                INSERT INTO activity_intervals (
                    kind, machine_id, operator_id, start_event_id, stop_event_id,
                    output, reject, rework, downtime_category, coil_no, lot_no, pack_no
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ",
                params![
                    interval.kind.as_str(),
                    interval.machine_id.as_str(),
                    interval.operator_id.as_str(),
                    interval.start_event_id.0,
                    interval.stop_event_id.0,
                    interval.counters.output,
                    interval.counters.reject,
                    interval.counters.rework,
                    interval.downtime_category,
                    interval.traceability.coil_no,
                    interval.traceability.lot_no,
                    interval.traceability.pack_no,
                ],
            )
            .map_err(storage_error)?;
        Ok(ActivityInterval {
            id: self.conn.last_insert_rowid(),
            kind: interval.kind,
            machine_id: interval.machine_id,
            operator_id: interval.operator_id,
            start_event_id: interval.start_event_id,
            stop_event_id: interval.stop_event_id,
            counters: interval.counters,
            downtime_category: interval.downtime_category,
            traceability: interval.traceability,
        })
    }
}

/// Rejects activities naming entities that were never registered.
fn ensure_registered(conn: &Connection, binding: &Binding) -> Result<(), ActivityError> {
    let checks = [
        ("machine", "machines", binding.machine_id.as_str()),
        ("tooling", "toolings", binding.tooling_id.as_str()),
        ("operator", "operators", binding.operator_id.as_str()),
    ];
    for (kind, table, id) in checks {
        let exists: bool = conn
            .query_row(
                &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)"),
                [id],
                |row| row.get(0),
            )
            .map_err(storage_error)?;
        if !exists {
            return Err(ActivityError::UnknownEntity {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

const TOOLING_COLUMNS: &str = "id, code, common_name, customer, part_no, part_name, \
     child_part_name, process, standard_hours, created_at, updated_at";

const LOG_EVENT_COLUMNS: &str =
    "id, tooling_id, machine_id, operator_id, timestamp, output, downtime_category, kind";

const INTERVAL_COLUMNS: &str = "id, kind, machine_id, operator_id, start_event_id, \
     stop_event_id, output, reject, rework, downtime_category, coil_no, lot_no, pack_no";

const MACHINE_STATUS_COLUMNS: &str = "machine_id, raw_status, displayed_status, \
     last_start_event_id, last_stop_event_id, last_tooling_id, last_operator_id, category_downtime";

fn read_machine_status(
    conn: &Connection,
    machine_id: &MachineId,
) -> Result<Option<MachineStatus>, DbError> {
    Ok(conn
        .query_row(
            &format!("SELECT {MACHINE_STATUS_COLUMNS} FROM machine_status WHERE machine_id = ?"),
            [machine_id.as_str()],
            machine_status_from_row,
        )
        .optional()?)
}

fn read_operator_status(
    conn: &Connection,
    operator_id: &OperatorId,
) -> Result<Option<OperatorStatus>, DbError> {
    Ok(conn
        .query_row(
            "
            SELECT operator_id, displayed_status, last_tooling_id, last_machine_id
            FROM operator_status
            WHERE operator_id = ?
            ",
            [operator_id.as_str()],
            |row| {
                Ok(OperatorStatus {
                    operator_id: column(row, 0)?,
                    displayed_status: column(row, 1)?,
                    last_tooling_id: column(row, 2)?,
                    last_machine_id: column(row, 3)?,
                })
            },
        )
        .optional()?)
}

fn machine_status_from_row(row: &Row<'_>) -> rusqlite::Result<MachineStatus> {
    Ok(MachineStatus {
        machine_id: column(row, 0)?,
        raw_status: column(row, 1)?,
        displayed_status: column(row, 2)?,
        last_start_event_id: LogEventId(row.get(3)?),
        last_stop_event_id: LogEventId(row.get(4)?),
        last_tooling_id: column(row, 5)?,
        last_operator_id: optional_column(row, 6)?,
        category_downtime: row.get(7)?,
    })
}

fn log_event_from_row(row: &Row<'_>) -> rusqlite::Result<LogEvent> {
    Ok(LogEvent {
        id: LogEventId(row.get(0)?),
        tooling_id: column(row, 1)?,
        machine_id: column(row, 2)?,
        operator_id: column(row, 3)?,
        timestamp: column(row, 4)?,
        output: row.get(5)?,
        downtime_category: row.get(6)?,
        kind: column(row, 7)?,
    })
}

fn interval_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityInterval> {
    Ok(ActivityInterval {
        id: row.get(0)?,
        kind: column(row, 1)?,
        machine_id: column(row, 2)?,
        operator_id: column(row, 3)?,
        start_event_id: LogEventId(row.get(4)?),
        stop_event_id: LogEventId(row.get(5)?),
        counters: Counters {
            output: row.get(6)?,
            reject: row.get(7)?,
            rework: row.get(8)?,
        },
        downtime_category: row.get(9)?,
        traceability: Traceability {
            coil_no: row.get(10)?,
            lot_no: row.get(11)?,
            pack_no: row.get(12)?,
        },
    })
}

fn machine_from_row(row: &Row<'_>) -> rusqlite::Result<Machine> {
    Ok(Machine {
        id: column(row, 0)?,
        name: row.get(1)?,
        tonnage: row.get(2)?,
        created_at: column(row, 3)?,
        updated_at: column(row, 4)?,
    })
}

fn tooling_from_row(row: &Row<'_>) -> rusqlite::Result<Tooling> {
    Ok(Tooling {
        id: column(row, 0)?,
        code: row.get(1)?,
        common_name: row.get(2)?,
        customer: row.get(3)?,
        part_no: row.get(4)?,
        part_name: row.get(5)?,
        child_part_name: row.get(6)?,
        process: row.get(7)?,
        standard_hours: row.get(8)?,
        created_at: column(row, 9)?,
        updated_at: column(row, 10)?,
    })
}

fn operator_from_row(row: &Row<'_>) -> rusqlite::Result<Operator> {
    Ok(Operator {
        id: column(row, 0)?,
        employee_number: row.get(1)?,
        name: row.get(2)?,
        created_at: column(row, 3)?,
        updated_at: column(row, 4)?,
    })
}

/// Reads a TEXT column and parses it into a domain type.
fn column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn optional_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: Option<String> = row.get(idx)?;
    text.map(|text| {
        text.parse()
            .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
    })
    .transpose()
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn storage_error(err: rusqlite::Error) -> StoreError {
    StoreError::new(DbError::from(err))
}

fn not_found(kind: &'static str, id: &impl ToString) -> DbError {
    DbError::NotFound {
        kind,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use mt_core::{
        ActivityKind, Conflict, ContinueStopActivity, DisplayedStatus, FirstStopActivity,
        IntervalKind, LogKind, StartActivity,
    };
    use std::collections::HashSet;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 3, 15, 1, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    fn seeded() -> Database {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        for name in ["Press 1", "Press 2"] {
            db.upsert_machine(&NewMachine {
                name: name.to_string(),
                tonnage: Some(200),
            })
            .unwrap();
        }
        for code in ["T100", "T200"] {
            db.upsert_tooling(&NewTooling {
                code: code.to_string(),
                common_name: format!("{code} die"),
                part_no: format!("P-{code}"),
                ..NewTooling::default()
            })
            .unwrap();
        }
        for (number, name) in [("1001", "Budi"), ("1002", "Sari")] {
            db.upsert_operator(&NewOperator {
                employee_number: number.to_string(),
                name: name.to_string(),
            })
            .unwrap();
        }
        db
    }

    fn binding(tooling: &str, machine: &str, operator: &str) -> Binding {
        Binding {
            tooling_id: ToolingId::new(tooling).unwrap(),
            machine_id: MachineId::new(machine).unwrap(),
            operator_id: OperatorId::new(operator).unwrap(),
        }
    }

    fn budi() -> Binding {
        binding("TL-T100", "MC-Press-1", "OP-Budi")
    }

    fn start(b: &Binding) -> Activity {
        Activity::Start(StartActivity {
            binding: b.clone(),
            reject: 0,
            rework: 0,
        })
    }

    fn first_stop(b: &Binding, output: i64, category: &str) -> Activity {
        Activity::FirstStop(FirstStopActivity {
            binding: b.clone(),
            output: Some(output),
            downtime_category: category.to_string(),
            reject: 0,
            rework: 0,
            traceability: Traceability {
                coil_no: Some("C-7".to_string()),
                lot_no: None,
                pack_no: None,
            },
        })
    }

    fn continue_stop(b: &Binding, category: &str) -> Activity {
        Activity::ContinueStop(ContinueStopActivity {
            binding: b.clone(),
            downtime_category: category.to_string(),
            reject: 0,
            rework: 0,
        })
    }

    fn row_count(db: &Database, table: &str) -> i64 {
        db.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        stmt.query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info")
            .map(|row| row.expect("column name"))
            .collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        stmt.query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list")
            .map(|row| row.expect("index name"))
            .collect()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "log_events"),
            vec![
                "id",
                "tooling_id",
                "machine_id",
                "operator_id",
                "timestamp",
                "output",
                "downtime_category",
                "kind",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "machine_status"),
            vec![
                "machine_id",
                "raw_status",
                "displayed_status",
                "last_start_event_id",
                "last_stop_event_id",
                "last_tooling_id",
                "last_operator_id",
                "category_downtime",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "operator_status"),
            vec![
                "operator_id",
                "displayed_status",
                "last_tooling_id",
                "last_machine_id",
            ]
        );
        assert_eq!(table_columns(&db.conn, "activity_intervals").len(), 13);

        let log_indexes = index_names(&db.conn, "log_events");
        assert!(log_indexes.contains("idx_log_events_machine"));
        assert!(log_indexes.contains("idx_log_events_timestamp"));
        let interval_indexes = index_names(&db.conn, "activity_intervals");
        assert!(interval_indexes.contains("idx_intervals_machine"));
        assert!(interval_indexes.contains("idx_intervals_start"));
    }

    #[test]
    fn init_is_idempotent_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mt.db");
        {
            let mut db = Database::open(&path).unwrap();
            db.upsert_machine(&NewMachine {
                name: "Press 1".to_string(),
                tonnage: None,
            })
            .unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_machines().unwrap().len(), 1);
    }

    #[test]
    fn upsert_updates_in_place_and_keeps_created_at() {
        let mut db = Database::open_in_memory().unwrap();
        let input = NewOperator {
            employee_number: "1001".to_string(),
            name: "budi santoso".to_string(),
        };
        let first = db.upsert_operator_at(&input, at(0)).unwrap();
        let renumbered = NewOperator {
            employee_number: "1001-B".to_string(),
            ..input
        };
        let second = db.upsert_operator_at(&renumbered, at(60)).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Budi Santoso");
        assert_eq!(second.employee_number, "1001-B");
        assert_eq!(second.created_at, at(0));
        assert_eq!(second.updated_at, at(60));
        assert_eq!(db.list_operators().unwrap().len(), 1);
    }

    #[test]
    fn upsert_rejects_invalid_input() {
        let mut db = Database::open_in_memory().unwrap();
        let err = db
            .upsert_operator(&NewOperator {
                employee_number: "10 01".to_string(),
                name: "Budi".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert!(db.list_operators().unwrap().is_empty());
    }

    #[test]
    fn tooling_fields_round_trip() {
        let mut db = Database::open_in_memory().unwrap();
        let tooling = db
            .upsert_tooling_at(
                &NewTooling {
                    code: "T 100".to_string(),
                    common_name: "Bracket".to_string(),
                    customer: "ACME".to_string(),
                    part_no: "P-1".to_string(),
                    standard_hours: Some(120),
                    ..NewTooling::default()
                },
                at(0),
            )
            .unwrap();
        assert_eq!(tooling.id.as_str(), "TL-T-100");
        assert_eq!(db.get_tooling(&tooling.id).unwrap(), Some(tooling));
    }

    #[test]
    fn delete_rejects_entities_with_activity() {
        let mut db = seeded();
        db.submit_activity_at(&start(&budi()), at(0)).unwrap();

        let err = db.delete_machine(&budi().machine_id).unwrap_err();
        assert!(matches!(err, DbError::EntityInUse { kind: "machine", .. }));

        db.delete_machine(&MachineId::new("MC-Press-2").unwrap()).unwrap();
        assert_eq!(db.list_machines().unwrap().len(), 1);

        let err = db
            .delete_tooling(&ToolingId::new("TL-missing").unwrap())
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { kind: "tooling", .. }));
    }

    #[test]
    fn unregistered_entities_are_rejected() {
        let mut db = seeded();
        let err = db
            .submit_activity_at(&start(&binding("TL-T100", "MC-Press-9", "OP-Budi")), at(0))
            .unwrap_err();
        assert!(matches!(
            err,
            ActivityError::UnknownEntity { kind: "machine", .. }
        ));
        assert_eq!(row_count(&db, "log_events"), 0);
    }

    #[test]
    fn bootstrap_writes_five_second_interval() {
        let mut db = seeded();
        db.submit_activity_at(&first_stop(&budi(), 3, "MT : Maintenance"), at(0))
            .unwrap();

        let events = db.list_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, LogKind::Start);
        assert_eq!(events[0].downtime_category, "Object Creation");
        assert_eq!(events[1].timestamp - events[0].timestamp, Duration::seconds(5));

        let intervals = db.list_intervals().unwrap();
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].kind, IntervalKind::Utility);
        assert_eq!(intervals[0].traceability.coil_no.as_deref(), Some("C-7"));
    }

    #[test]
    fn start_then_first_stop_round_trip() {
        let mut db = seeded();
        db.submit_activity_at(&start(&budi()), at(0)).unwrap();
        db.submit_activity_at(&first_stop(&budi(), 10, "U : Utility"), at(600))
            .unwrap();

        let status = db.machine_status(&budi().machine_id).unwrap().unwrap();
        assert_eq!(status.raw_status, RawStatus::Idle);
        assert_eq!(status.displayed_status, DisplayedStatus::Downtime);
        assert_eq!(status.category_downtime, "U : Utility");

        let utility: Vec<_> = db
            .list_intervals()
            .unwrap()
            .into_iter()
            .filter(|i| i.kind == IntervalKind::Utility)
            .collect();
        assert_eq!(utility.len(), 1);
        assert_eq!(utility[0].counters.output, 10);
        assert_eq!(db.machine_raw_status(&budi().machine_id).unwrap(), RawStatus::Idle);
    }

    #[test]
    fn double_start_leaves_one_start_event() {
        let mut db = seeded();
        db.submit_activity_at(&start(&budi()), at(0)).unwrap();
        let err = db.submit_activity_at(&start(&budi()), at(5)).unwrap_err();

        assert!(matches!(err, ActivityError::AlreadyRunning { .. }));
        let starts = db
            .list_events()
            .unwrap()
            .iter()
            .filter(|e| e.kind == LogKind::Start)
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn continue_stop_while_running_writes_nothing() {
        let mut db = seeded();
        db.submit_activity_at(&start(&budi()), at(0)).unwrap();
        let events = row_count(&db, "log_events");
        let intervals = row_count(&db, "activity_intervals");

        let err = db
            .submit_activity_at(&continue_stop(&budi(), "NP : No Plan"), at(5))
            .unwrap_err();

        assert!(matches!(err, ActivityError::MachineIsRunning { .. }));
        assert_eq!(row_count(&db, "log_events"), events);
        assert_eq!(row_count(&db, "activity_intervals"), intervals);
    }

    #[test]
    fn second_operator_is_denied_on_running_machine() {
        let mut db = seeded();
        db.submit_activity_at(&start(&budi()), at(0)).unwrap();
        let sari = binding("TL-T200", "MC-Press-1", "OP-Sari");

        let admission = db
            .check_admission(&sari.tooling_id, &sari.machine_id, &sari.operator_id)
            .unwrap();
        assert!(!admission.is_admitted());

        let err = db.submit_activity_at(&start(&sari), at(5)).unwrap_err();
        assert!(matches!(err, ActivityError::Denied(Conflict::MachineBusy { .. })));
    }

    #[test]
    fn failed_write_rolls_back_transition() {
        let mut db = seeded();
        db.submit_activity_at(&start(&budi()), at(0)).unwrap();
        db.conn
            .execute_batch(
                "
                CREATE TRIGGER reject_intervals BEFORE INSERT ON activity_intervals
                BEGIN
                    SELECT RAISE(ABORT, 'disk full');
                END;
                ",
            )
            .unwrap();
        let events = row_count(&db, "log_events");

        let err = db
            .submit_activity_at(&first_stop(&budi(), 4, "NP : No Plan"), at(60))
            .unwrap_err();

        assert!(matches!(err, ActivityError::Storage(_)));
        assert!(!err.is_rejection());
        assert_eq!(row_count(&db, "log_events"), events);
        assert_eq!(db.machine_raw_status(&budi().machine_id).unwrap(), RawStatus::Running);
        assert!(db.operator_running_state(&budi().operator_id).unwrap().is_running);
    }

    #[test]
    fn unknown_entities_have_idle_defaults() {
        let db = seeded();
        assert_eq!(
            db.machine_raw_status(&MachineId::new("MC-Press-2").unwrap())
                .unwrap(),
            RawStatus::Idle
        );
        let state = db
            .operator_running_state(&OperatorId::new("OP-Sari").unwrap())
            .unwrap();
        assert!(!state.is_running);
        assert_eq!(state.status, DisplayedStatus::Idle);
    }

    #[test]
    fn status_board_lists_busy_machines_first() {
        let mut db = seeded();
        db.submit_activity_at(&first_stop(&budi(), 0, "NP : No Plan"), at(0))
            .unwrap();
        db.submit_activity_at(&start(&binding("TL-T200", "MC-Press-2", "OP-Sari")), at(10))
            .unwrap();

        let board: Vec<_> = db
            .list_machine_statuses()
            .unwrap()
            .into_iter()
            .map(|s| (s.machine_id.to_string(), s.raw_status))
            .collect();
        assert_eq!(
            board,
            vec![
                ("MC-Press-2".to_string(), RawStatus::Running),
                ("MC-Press-1".to_string(), RawStatus::Idle),
            ]
        );
    }

    #[test]
    fn status_board_ranks_by_displayed_status() {
        let mut db = seeded();
        db.submit_activity_at(&first_stop(&budi(), 0, "NP : No Plan"), at(0))
            .unwrap();
        let sari = binding("TL-T200", "MC-Press-2", "OP-Sari");
        db.submit_activity_at(&first_stop(&sari, 0, "MT : Maintenance"), at(10))
            .unwrap();

        let board: Vec<_> = db
            .list_machine_statuses()
            .unwrap()
            .into_iter()
            .map(|s| (s.machine_id.to_string(), s.raw_status, s.displayed_status))
            .collect();
        assert_eq!(
            board,
            vec![
                ("MC-Press-2".to_string(), RawStatus::Idle, DisplayedStatus::Downtime),
                ("MC-Press-1".to_string(), RawStatus::Idle, DisplayedStatus::Idle),
            ]
        );
    }

    #[test]
    fn operator_in_downtime_is_reported_busy() {
        let mut db = seeded();
        db.submit_activity_at(&start(&budi()), at(0)).unwrap();
        db.submit_activity_at(&first_stop(&budi(), 10, "MT : Maintenance"), at(60))
            .unwrap();

        let state = db.operator_running_state(&budi().operator_id).unwrap();
        assert!(state.is_running);
        assert_eq!(state.status, DisplayedStatus::Downtime);
        assert_eq!(state.machine_id, Some(budi().machine_id));
        assert_eq!(state.tooling_id, Some(budi().tooling_id));
    }

    #[test]
    fn first_stop_without_output_stores_null() {
        let mut db = seeded();
        let mut request = ActivityRequest::new(ActivityKind::FirstStop, budi());
        request.category_downtime = Some("MT : Maintenance".to_string());
        db.submit_activity_at(&Activity::try_from(request).unwrap(), at(0))
            .unwrap();

        let stored: Option<i64> = db
            .conn
            .query_row(
                "SELECT output FROM log_events WHERE kind = 'STOP'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stored, None);
        let events = db.list_events().unwrap();
        assert!(events.iter().all(|event| event.output.is_none()));
    }

    #[test]
    fn scan_filters_by_opening_time_and_joins_names() {
        let mut db = seeded();
        db.submit_activity_at(&start(&budi()), at(0)).unwrap();
        db.submit_activity_at(&first_stop(&budi(), 10, "MT : Maintenance"), at(600))
            .unwrap();
        db.submit_activity_at(&start(&budi()), at(1200)).unwrap();

        let rows = db.scan_intervals(at(0), at(1200)).unwrap();
        assert_eq!(rows.len(), 2);
        let utility = &rows[0];
        assert_eq!(utility.kind, IntervalKind::Utility);
        assert_eq!(utility.machine_name, "Press 1");
        assert_eq!(utility.operator_name, "Budi");
        assert_eq!(utility.employee_number, "1001");
        assert_eq!(utility.tooling_code, "T100");
        assert_eq!(utility.part_no, "P-T100");
        assert_eq!(utility.duration(), Duration::seconds(600));
        assert_eq!(rows[1].kind, IntervalKind::LastDowntime);
        assert_eq!(rows[1].downtime_category, "MT : Maintenance");

        // The bootstrap interval opened at -5s and falls outside the window.
        assert_eq!(db.scan_intervals(at(-10), at(0)).unwrap().len(), 1);
    }

    #[test]
    fn request_submission_uses_current_time() {
        let mut db = seeded();
        let request = ActivityRequest::new(ActivityKind::Start, budi());
        let outcome = db.submit_activity(request).unwrap();
        assert!(outcome.bootstrap_event.is_some());
        assert!(db.operator_running_state(&budi().operator_id).unwrap().is_running);
    }
}
