//! Machine registry commands.

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use mt_core::{MachineId, NewMachine};

use super::open_database;
use crate::Config;

#[derive(Debug, Subcommand)]
pub enum MachineAction {
    /// Register a machine, or update the one with the same name.
    Add(AddMachineArgs),
    /// List registered machines.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Remove a machine that has no recorded activity.
    Remove {
        /// Machine ID (e.g., MC-Press-1).
        id: MachineId,
    },
}

#[derive(Debug, Args)]
pub struct AddMachineArgs {
    /// Machine name as shown on the floor.
    pub name: String,
    /// Press capacity in tons.
    #[arg(long)]
    pub tonnage: Option<i64>,
}

pub fn run<W: Write>(writer: &mut W, action: &MachineAction, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    match action {
        MachineAction::Add(args) => {
            let machine = db.upsert_machine(&NewMachine {
                name: args.name.clone(),
                tonnage: args.tonnage,
            })?;
            writeln!(writer, "Registered machine {} ({})", machine.id, machine.name)?;
        }
        MachineAction::List { json } => {
            let machines = db.list_machines()?;
            if *json {
                writeln!(writer, "{}", serde_json::to_string_pretty(&machines)?)?;
            } else if machines.is_empty() {
                writeln!(writer, "No machines registered.")?;
            } else {
                for machine in machines {
                    match machine.tonnage {
                        Some(tons) => writeln!(writer, "{}  {}  {tons}t", machine.id, machine.name)?,
                        None => writeln!(writer, "{}  {}", machine.id, machine.name)?,
                    }
                }
            }
        }
        MachineAction::Remove { id } => {
            db.delete_machine(id)?;
            writeln!(writer, "Removed machine {id}")?;
        }
    }
    Ok(())
}
