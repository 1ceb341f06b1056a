//! CLI subcommand implementations.

use anyhow::{Context, Result};
use mt_db::Database;

use crate::Config;

pub mod activity;
pub mod check;
pub mod machine;
pub mod operator;
pub mod report;
pub mod status;
pub mod tooling;

/// Opens the configured database, creating its directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use mt_core::{NewMachine, NewOperator, NewTooling, ShiftTable};
    use mt_db::Database;

    use crate::Config;

    /// A config pointing at a fresh database in `dir`, with the default plant setup.
    pub fn config_in(dir: &Path) -> Config {
        Config {
            database_path: dir.join("mt.db"),
            utc_offset_hours: 7,
            shifts: ShiftTable::default(),
        }
    }

    /// Registers Press 1, tooling T100 and operators Budi and Sari.
    pub fn seed(config: &Config) {
        let mut db = Database::open(&config.database_path).unwrap();
        db.upsert_machine(&NewMachine {
            name: "Press 1".to_string(),
            tonnage: Some(200),
        })
        .unwrap();
        db.upsert_tooling(&NewTooling {
            code: "T100".to_string(),
            common_name: "Bracket Die".to_string(),
            part_no: "P-100".to_string(),
            ..NewTooling::default()
        })
        .unwrap();
        for (number, name) in [("1001", "Budi"), ("1002", "Sari")] {
            db.upsert_operator(&NewOperator {
                employee_number: number.to_string(),
                name: name.to_string(),
            })
            .unwrap();
        }
    }
}
