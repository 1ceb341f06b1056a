//! Registered machines, toolings and operators.
//!
//! Entity ids are derived from a human-entered field, so registering the same
//! entity twice updates it instead of creating a duplicate.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{MachineId, OperatorId, ToolingId, ValidationError, title_case};

static EMPLOYEE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").unwrap());

static PERSON_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L} .']+$").unwrap());

/// Checks an employee number: ASCII letters, digits and `-`.
pub fn validate_employee_number(value: &str) -> Result<&str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty {
            field: "employee number",
        });
    }
    if !EMPLOYEE_NUMBER_RE.is_match(value) {
        return Err(ValidationError::InvalidFormat {
            field: "employee number",
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Checks a person's name: letters, spaces, `.` and `'`.
pub fn validate_person_name(value: &str) -> Result<&str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty {
            field: "operator name",
        });
    }
    if !PERSON_NAME_RE.is_match(value) {
        return Err(ValidationError::InvalidFormat {
            field: "operator name",
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::Empty { field })
    } else {
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMachine {
    pub name: String,
    #[serde(default)]
    pub tonnage: Option<i64>,
}

impl NewMachine {
    /// Validates the input and derives the machine id from its name.
    pub fn id(&self) -> Result<MachineId, ValidationError> {
        MachineId::from_fragment(required("machine name", &self.name)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTooling {
    /// Tooling code stamped on the die; the id is derived from it.
    pub code: String,
    pub common_name: String,
    pub customer: String,
    pub part_no: String,
    pub part_name: String,
    pub child_part_name: String,
    pub process: String,
    pub standard_hours: Option<i64>,
}

impl NewTooling {
    pub fn id(&self) -> Result<ToolingId, ValidationError> {
        ToolingId::from_fragment(required("tooling code", &self.code)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOperator {
    pub employee_number: String,
    pub name: String,
}

impl NewOperator {
    /// Validates both fields and derives the id from the title-cased name.
    pub fn id(&self) -> Result<OperatorId, ValidationError> {
        validate_employee_number(&self.employee_number)?;
        let name = validate_person_name(&self.name)?;
        OperatorId::from_fragment(&title_case(name))
    }

    /// The name as stored: trimmed and title-cased.
    pub fn display_name(&self) -> String {
        title_case(self.name.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    pub tonnage: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tooling {
    pub id: ToolingId,
    pub code: String,
    pub common_name: String,
    pub customer: String,
    pub part_no: String,
    pub part_name: String,
    pub child_part_name: String,
    pub process: String,
    pub standard_hours: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub employee_number: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
