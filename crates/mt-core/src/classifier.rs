//! Downtime category classification.
//!
//! The first two characters of a downtime category, upper-cased, form its
//! short code. The code decides the raw machine status and, independently,
//! the status shown on the floor board.

use serde::Serialize;
use thiserror::Error;

use crate::status::{DisplayedStatus, RawStatus};

/// Category recorded while a machine is producing.
pub const UTILITY_CATEGORY: &str = "U : Utility";

/// Category recorded on events synthesized for a machine's first observation.
pub const OBJECT_CREATION_CATEGORY: &str = "Object Creation";

/// Category an operator should stop with to release a machine.
pub const NO_PLANNING_CATEGORY: &str = "NP : No Planning";

/// Short codes that put a machine into setup.
const SETUP_CODES: [&str; 3] = ["TP", "TS", "TL"];

/// Short codes shown as plain idle rather than downtime.
const IDLE_CODES: [&str; 3] = ["NP", "BT", "BR"];

/// The category string is too short to carry a short code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid downtime category: {category:?}")]
pub struct InvalidCategory {
    pub category: String,
}

/// Result of classifying one downtime category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub short_code: String,
    pub raw_status: RawStatus,
    pub displayed_status: DisplayedStatus,
}

/// Returns the upper-cased two-character short code of a category.
pub fn short_code(category: &str) -> Result<String, InvalidCategory> {
    let mut chars = category.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) => {
            let mut code = String::with_capacity(2);
            code.extend(first.to_uppercase());
            code.extend(second.to_uppercase());
            Ok(code)
        }
        _ => Err(InvalidCategory {
            category: category.to_string(),
        }),
    }
}

/// Classifies a downtime category into its raw and displayed machine status.
pub fn classify(category: &str) -> Result<Classification, InvalidCategory> {
    let code = short_code(category)?;
    let raw_status = if SETUP_CODES.contains(&code.as_str()) {
        RawStatus::Setup
    } else {
        RawStatus::Idle
    };
    let displayed_status = if IDLE_CODES.contains(&code.as_str()) {
        DisplayedStatus::Idle
    } else {
        DisplayedStatus::Downtime
    };
    Ok(Classification {
        short_code: code,
        raw_status,
        displayed_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utility_category_is_idle_downtime() {
        let c = classify(UTILITY_CATEGORY).unwrap();
        assert_eq!(c.short_code, "U ");
        assert_eq!(c.raw_status, RawStatus::Idle);
        assert_eq!(c.displayed_status, DisplayedStatus::Downtime);
    }

    #[test]
    fn setup_codes_yield_setup_and_downtime() {
        for category in ["TP : Trial Production", "TS : Tool Setting", "tl : tooling"] {
            let c = classify(category).unwrap();
            assert_eq!(c.raw_status, RawStatus::Setup, "{category}");
            assert_eq!(c.displayed_status, DisplayedStatus::Downtime, "{category}");
        }
    }

    #[test]
    fn idle_codes_yield_idle_display() {
        for category in ["NP : No Plan", "BT : Break Time", "br : break"] {
            let c = classify(category).unwrap();
            assert_eq!(c.raw_status, RawStatus::Idle, "{category}");
            assert_eq!(c.displayed_status, DisplayedStatus::Idle, "{category}");
        }
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify("np").unwrap(), classify("NP").unwrap());
        assert_eq!(classify("tS x").unwrap(), classify("TS y").unwrap());
    }

    #[test]
    fn exactly_two_characters_is_enough() {
        let c = classify("MT").unwrap();
        assert_eq!(c.short_code, "MT");
        assert_eq!(c.displayed_status, DisplayedStatus::Downtime);
    }

    #[test]
    fn short_categories_are_rejected() {
        assert_eq!(
            classify("N").unwrap_err(),
            InvalidCategory {
                category: "N".to_string()
            }
        );
        assert!(classify("").is_err());
    }

    #[test]
    fn short_code_counts_characters_not_bytes() {
        assert_eq!(short_code("éx : accent").unwrap(), "ÉX");
        assert!(short_code("é").is_err());
    }

    #[test]
    fn every_two_letter_code_maps_into_the_product() {
        for a in 'A'..='Z' {
            for b in 'A'..='Z' {
                let code = format!("{a}{b}");
                let c = classify(&code).unwrap();
                let expected_raw = if SETUP_CODES.contains(&code.as_str()) {
                    RawStatus::Setup
                } else {
                    RawStatus::Idle
                };
                assert_eq!(c.raw_status, expected_raw);
                assert_ne!(c.displayed_status, DisplayedStatus::Running);
            }
        }
    }
}
