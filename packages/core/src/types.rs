//! Hold request record model.
//!
//! Field names follow the hold request stream's camelCase wire format. The
//! enrichment fields (`item`, `patron_info`) and the outcome field
//! (`backend_response`) are never present on the wire; they are attached as the
//! record moves through the pipeline.

use serde::{Deserialize, Serialize};

use crate::messages::offsite::OffsiteResponse;

/// Stable identifier of a hold request. Sole correlation key for the result stream.
pub type HoldRequestId = i64;

// ---------------------------------------------------------------------------
// HoldRequestRecord
// ---------------------------------------------------------------------------

/// A single hold request decoded from the input stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldRequestRecord {
    pub id: HoldRequestId,
    #[serde(default)]
    pub job_id: Option<String>,
    /// Patron identifier (wire name `patron`).
    #[serde(rename = "patron", default)]
    pub patron_id: Option<String>,
    /// Source institution code, e.g. `sierra-nypl` or `recap-cul` (wire name `nyplSource`).
    #[serde(rename = "nyplSource", default)]
    pub source_code: Option<String>,
    /// Item identifier within the source institution (wire name `record`).
    #[serde(rename = "record", default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub request_type: Option<String>,
    #[serde(default)]
    pub record_type: Option<String>,
    #[serde(default)]
    pub pickup_location: Option<String>,
    #[serde(default)]
    pub needed_by: Option<String>,
    #[serde(default)]
    pub number_of_copies: Option<u32>,
    #[serde(default)]
    pub doc_delivery_data: Option<DocDeliveryData>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub updated_date: Option<String>,

    /// Item payload attached by the item lookup stage.
    #[serde(skip)]
    pub item: Option<Item>,
    /// Patron payload attached by the patron lookup stage.
    #[serde(skip)]
    pub patron_info: Option<Patron>,
    /// Response recorded by the backend that accepted this request.
    #[serde(skip)]
    pub backend_response: Option<BackendResponse>,
}

impl HoldRequestRecord {
    /// Create a bare record with only the id set. Mostly useful for fixtures.
    #[must_use]
    pub fn new(id: HoldRequestId) -> Self {
        Self {
            id,
            job_id: None,
            patron_id: None,
            source_code: None,
            item_id: None,
            request_type: None,
            record_type: None,
            pickup_location: None,
            needed_by: None,
            number_of_copies: None,
            doc_delivery_data: None,
            processed: false,
            created_date: None,
            updated_date: None,
            item: None,
            patron_info: None,
            backend_response: None,
        }
    }

    /// Resolved request type of this record.
    #[must_use]
    pub fn resolved_request_type(&self) -> RequestType {
        RequestType::from_wire(self.request_type.as_deref())
    }

    /// Holding location code of the attached item, if the item stage resolved one.
    #[must_use]
    pub fn holding_location_code(&self) -> Option<&str> {
        self.item
            .as_ref()
            .and_then(|item| item.location.as_ref())
            .map(|location| location.code.as_str())
    }
}

/// Optional electronic document delivery metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocDeliveryData {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chapter_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub end_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub issue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request_notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Enrichment payloads
// ---------------------------------------------------------------------------

/// Item payload returned by the item service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub nypl_source: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub call_number: Option<String>,
    #[serde(default)]
    pub location: Option<ItemLocation>,
}

/// Holding location of an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemLocation {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Patron payload returned by the patron service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patron {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "barCodes", default)]
    pub barcodes: Vec<String>,
}

impl Patron {
    /// The barcode backends expect: the last one in the collection.
    #[must_use]
    pub fn current_barcode(&self) -> Option<&str> {
        self.barcodes.last().map(String::as_str)
    }
}

/// What a backend answered for an accepted request.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendResponse {
    Offsite(OffsiteResponse),
    Onsite { status: u16 },
}

// ---------------------------------------------------------------------------
// RequestType
// ---------------------------------------------------------------------------

/// Resolved request type as understood by the fulfillment backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    /// Physical retrieval for pickup. Default for anything not listed below.
    Retrieval,
    /// Electronic document delivery (scan and send).
    Edd,
    /// Backend test request.
    Test,
}

impl RequestType {
    /// Resolve the wire value. Only `edd` and `test` (any case) are kept;
    /// everything else, including a missing value, becomes `Retrieval`.
    #[must_use]
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("edd") => Self::Edd,
            Some("test") => Self::Test,
            _ => Self::Retrieval,
        }
    }

    /// Uppercased backend value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Retrieval => "RETRIEVAL",
            Self::Edd => "EDD",
            Self::Test => "TEST",
        }
    }

    #[must_use]
    pub fn is_document_delivery(self) -> bool {
        matches!(self, Self::Edd)
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
