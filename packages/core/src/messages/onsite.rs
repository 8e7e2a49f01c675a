//! Request schema of the onsite fulfillment service.

use serde::{Deserialize, Serialize};

use crate::types::{DocDeliveryData, HoldRequestRecord};

/// Hold request accepted by the onsite fulfillment service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnsiteRequest {
    pub patron: Option<String>,
    pub nypl_source: Option<String>,
    pub record: Option<String>,
    pub pickup_location: Option<String>,
    pub needed_by: Option<String>,
    pub number_of_copies: Option<u32>,
    pub doc_delivery_data: Option<DocDeliveryData>,
    pub request_type: Option<String>,
}

impl From<&HoldRequestRecord> for OnsiteRequest {
    fn from(record: &HoldRequestRecord) -> Self {
        Self {
            patron: record.patron_id.clone(),
            nypl_source: record.source_code.clone(),
            record: record.item_id.clone(),
            pickup_location: record.pickup_location.clone(),
            needed_by: record.needed_by.clone(),
            number_of_copies: record.number_of_copies,
            doc_delivery_data: record.doc_delivery_data.clone(),
            request_type: record.request_type.clone(),
        }
    }
}
