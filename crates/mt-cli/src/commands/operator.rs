//! Operator registry commands.

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use mt_core::{NewOperator, OperatorId};

use super::open_database;
use crate::Config;

#[derive(Debug, Subcommand)]
pub enum OperatorAction {
    /// Register an operator, or update the one with the same name.
    Add(AddOperatorArgs),
    /// List registered operators.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Remove an operator that has no recorded activity.
    Remove {
        /// Operator ID (e.g., OP-Budi-Santoso).
        id: OperatorId,
    },
}

#[derive(Debug, Args)]
pub struct AddOperatorArgs {
    /// Employee number (letters, digits and `-`).
    pub employee_number: String,
    /// Full name; stored title-cased.
    pub name: String,
}

pub fn run<W: Write>(writer: &mut W, action: &OperatorAction, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    match action {
        OperatorAction::Add(args) => {
            let operator = db.upsert_operator(&NewOperator {
                employee_number: args.employee_number.clone(),
                name: args.name.clone(),
            })?;
            writeln!(
                writer,
                "Registered operator {} ({}, {})",
                operator.id, operator.name, operator.employee_number
            )?;
        }
        OperatorAction::List { json } => {
            let operators = db.list_operators()?;
            if *json {
                writeln!(writer, "{}", serde_json::to_string_pretty(&operators)?)?;
            } else if operators.is_empty() {
                writeln!(writer, "No operators registered.")?;
            } else {
                for operator in operators {
                    writeln!(
                        writer,
                        "{}  {}  #{}",
                        operator.id, operator.name, operator.employee_number
                    )?;
                }
            }
        }
        OperatorAction::Remove { id } => {
            db.delete_operator(id)?;
            writeln!(writer, "Removed operator {id}")?;
        }
    }
    Ok(())
}
