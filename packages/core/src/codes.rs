//! Institution and delivery location code mappings used by the offsite backend.

use std::collections::HashMap;

/// Institution code sent as the requesting institution on every offsite request.
pub const REQUESTING_INSTITUTION: &str = "NYPL";

/// Map a source institution code to the offsite backend's institution code.
///
/// Partner codes look like `recap-cul` and map to their uppercased suffix;
/// `sierra-nypl` maps to `NYPL`. Anything else has no institution code.
#[must_use]
pub fn owning_institution(source_code: &str) -> Option<String> {
    if let Some(partner) = source_code.strip_prefix("recap-") {
        return (!partner.is_empty()).then(|| partner.to_ascii_uppercase());
    }
    (source_code == "sierra-nypl").then(|| REQUESTING_INSTITUTION.to_string())
}

/// Pickup location → offsite delivery location code lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryLocationTable {
    codes: HashMap<String, String>,
}

impl DeliveryLocationTable {
    /// An empty table; every lookup misses.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            codes: HashMap::new(),
        }
    }

    /// Build a table from `(pickup location, delivery code)` pairs.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            codes: pairs
                .into_iter()
                .map(|(k, v)| (k.into().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Parse a JSON object of `{"pickup": "CODE"}` entries.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the document is not a string map.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let codes: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self::from_pairs(codes))
    }

    /// Add or replace entries from another table.
    pub fn extend(&mut self, other: Self) {
        self.codes.extend(other.codes);
    }

    /// Delivery code for a pickup location. Lookup is case-insensitive.
    #[must_use]
    pub fn lookup(&self, pickup_location: &str) -> Option<&str> {
        self.codes
            .get(&pickup_location.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for DeliveryLocationTable {
    /// Built-in codes for the research library pickup locations.
    fn default() -> Self {
        Self::from_pairs([
            ("mal", "NA"),
            ("mab", "NB"),
            ("map", "NP"),
            ("par", "NW"),
            ("sc", "NS"),
            ("mai", "NH"),
        ])
    }
}
