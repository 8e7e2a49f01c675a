//! Request and response schemas of the offsite consortium storage backend.

use serde::{Deserialize, Serialize};

/// Item request accepted by the offsite backend.
///
/// Only fields the backend knows are projected; absent values are omitted
/// from the JSON body rather than sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsiteRequest {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tracking_id: Option<String>,
    pub request_type: String,
    pub requesting_institution: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub item_owning_institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub patron_barcode: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub item_barcodes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub call_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub delivery_location: Option<String>,

    // Document delivery: the first four are required by the backend for EDD.
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

/// Body returned by the offsite backend for an item request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsiteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub screen_message: Option<String>,
    #[serde(default)]
    pub request_type: Option<String>,
    #[serde(default)]
    pub requesting_institution: Option<String>,
    #[serde(default)]
    pub delivery_location: Option<String>,
    #[serde(default)]
    pub item_barcodes: Option<Vec<String>>,
}

impl OffsiteResponse {
    /// Whether the backend accepted the request as a document delivery.
    #[must_use]
    pub fn is_document_delivery(&self) -> bool {
        self.request_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("EDD"))
    }

    /// Compact summary of the fields useful when the backend rejects a request.
    #[must_use]
    pub fn debug_info(&self) -> String {
        let mut parts = vec![format!("success={}", self.success)];
        if let Some(message) = &self.screen_message {
            parts.push(format!("screenMessage={message}"));
        }
        if let Some(request_type) = &self.request_type {
            parts.push(format!("requestType={request_type}"));
        }
        if let Some(institution) = &self.requesting_institution {
            parts.push(format!("requestingInstitution={institution}"));
        }
        if let Some(location) = &self.delivery_location {
            parts.push(format!("deliveryLocation={location}"));
        }
        if let Some(barcodes) = &self.item_barcodes {
            parts.push(format!("itemBarcodes={}", barcodes.join(",")));
        }
        parts.join(" ")
    }
}
