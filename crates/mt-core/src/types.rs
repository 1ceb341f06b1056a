//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// An identifier did not carry the prefix of its entity kind.
    #[error("invalid {field}: {value} (expected prefix {prefix})")]
    InvalidPrefix {
        field: &'static str,
        prefix: &'static str,
        value: String,
    },

    /// A field contained characters outside its allowed set.
    #[error("invalid {field}: {value}")]
    InvalidFormat { field: &'static str, value: String },

    /// Unknown status string read back from storage.
    #[error("invalid {field}: {value}")]
    InvalidStatus { field: &'static str, value: String },
}

/// Normalizes a human-entered name into an identifier fragment.
///
/// Surrounding whitespace is dropped, spaces become `-` and `/` becomes `-OF-`,
/// so `"PRESS 200/1"` turns into `"PRESS-200-OF-1"`.
pub fn normalize_fragment(raw: &str) -> String {
    raw.trim().replace(' ', "-").replace('/', "-OF-")
}

/// Upper-cases the first letter of every word and lower-cases the rest.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Generates a prefixed string ID newtype with common trait implementations.
macro_rules! define_prefixed_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Prefix every identifier of this kind starts with.
            pub const PREFIX: &'static str = $prefix;

            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                if !id.starts_with($prefix) || id.len() == $prefix.len() {
                    return Err(ValidationError::InvalidPrefix {
                        field: $field_name,
                        prefix: $prefix,
                        value: id,
                    });
                }
                Ok(Self(id))
            }

            /// Derives the ID from a human-entered attribute.
            pub fn from_fragment(raw: &str) -> Result<Self, ValidationError> {
                let fragment = normalize_fragment(raw);
                if fragment.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(format!("{}{fragment}", $prefix)))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_prefixed_id!(
    /// A machine (mesin) identifier, `MC-` followed by the normalized machine name.
    MachineId, "MC-", "machine ID"
);

define_prefixed_id!(
    /// A tooling identifier, `TL-` followed by the normalized tooling code.
    ToolingId, "TL-", "tooling ID"
);

define_prefixed_id!(
    /// An operator identifier, `OP-` followed by the normalized, title-cased name.
    OperatorId, "OP-", "operator ID"
);

/// Monotonic identifier of a row in the machine log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEventId(pub i64);

impl fmt::Display for LogEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
