//! Tooling registry commands.

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use mt_core::{NewTooling, Tooling, ToolingId};

use super::open_database;
use crate::Config;

#[derive(Debug, Subcommand)]
pub enum ToolingAction {
    /// Register a tooling, or update the one with the same code.
    Add(AddToolingArgs),
    /// List registered toolings.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Remove a tooling that has no recorded activity.
    Remove {
        /// Tooling ID (e.g., TL-T100).
        id: ToolingId,
    },
}

#[derive(Debug, Args)]
pub struct AddToolingArgs {
    /// Tooling code stamped on the die.
    pub code: String,
    #[arg(long, default_value = "")]
    pub common_name: String,
    #[arg(long, default_value = "")]
    pub customer: String,
    #[arg(long, default_value = "")]
    pub part_no: String,
    #[arg(long, default_value = "")]
    pub part_name: String,
    #[arg(long, default_value = "")]
    pub child_part_name: String,
    /// Production process the tooling is used in.
    #[arg(long, default_value = "")]
    pub process: String,
    #[arg(long)]
    pub standard_hours: Option<i64>,
}

impl From<&AddToolingArgs> for NewTooling {
    fn from(args: &AddToolingArgs) -> Self {
        Self {
            code: args.code.clone(),
            common_name: args.common_name.clone(),
            customer: args.customer.clone(),
            part_no: args.part_no.clone(),
            part_name: args.part_name.clone(),
            child_part_name: args.child_part_name.clone(),
            process: args.process.clone(),
            standard_hours: args.standard_hours,
        }
    }
}

pub fn run<W: Write>(writer: &mut W, action: &ToolingAction, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    match action {
        ToolingAction::Add(args) => {
            let tooling = db.upsert_tooling(&NewTooling::from(args))?;
            writeln!(writer, "Registered tooling {} ({})", tooling.id, tooling.code)?;
        }
        ToolingAction::List { json } => {
            let toolings = db.list_toolings()?;
            if *json {
                writeln!(writer, "{}", serde_json::to_string_pretty(&toolings)?)?;
            } else if toolings.is_empty() {
                writeln!(writer, "No toolings registered.")?;
            } else {
                for tooling in toolings {
                    writeln!(
                        writer,
                        "{}  {}  part {}",
                        tooling.id,
                        label(&tooling),
                        display_or_dash(&tooling.part_no)
                    )?;
                }
            }
        }
        ToolingAction::Remove { id } => {
            db.delete_tooling(id)?;
            writeln!(writer, "Removed tooling {id}")?;
        }
    }
    Ok(())
}

fn label(tooling: &Tooling) -> &str {
    if tooling.common_name.is_empty() {
        &tooling.code
    } else {
        &tooling.common_name
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}
