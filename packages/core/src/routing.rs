//! Backend routing by holding location.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::HoldRequestRecord;

/// Holding locations with this two-letter prefix are stored offsite.
const OFFSITE_LOCATION_PATTERN: &str = "(?i)^rc";

fn offsite_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(OFFSITE_LOCATION_PATTERN).expect("static pattern is valid"))
}

/// Fulfillment backend a record is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Offsite consortium storage.
    Offsite,
    /// Onsite fulfillment.
    Onsite,
}

impl Route {
    /// Route for a holding location code.
    #[must_use]
    pub fn for_location(code: &str) -> Self {
        if offsite_pattern().is_match(code) {
            Self::Offsite
        } else {
            Self::Onsite
        }
    }

    /// Route for an enriched record. Records whose item has no location stay onsite.
    #[must_use]
    pub fn for_record(record: &HoldRequestRecord) -> Self {
        record
            .holding_location_code()
            .map_or(Self::Onsite, Self::for_location)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offsite => "offsite",
            Self::Onsite => "onsite",
        }
    }
}
