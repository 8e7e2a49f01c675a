//! Backend posting stages and request model construction.

use std::sync::Arc;

use async_trait::async_trait;
use holdrq_core::{
    owning_institution, BackendResponse, DeliveryLocationTable, HoldRequestRecord, OffsiteRequest,
    OnsiteRequest, OutcomeRecord, RequestType, REQUESTING_INSTITUTION,
};
use tracing::{info, warn};

use crate::error::{ErrorEnvelope, Stage};
use crate::token::AccessToken;
use crate::traits::{OffsiteBackend, OnsiteBackend};

use super::operation::StageStep;
use super::stage::RecordStage;

/// Error type of an offsite rejection (`success: false` in a 2xx response).
pub const OFFSITE_REJECTED_ERROR_TYPE: &str = "scsb-api-response-success-false";

// ---------------------------------------------------------------------------
// Offsite
// ---------------------------------------------------------------------------

/// Project an enriched record onto the offsite backend's request schema.
///
/// Document delivery fields are only sent for EDD requests.
#[must_use]
pub fn build_offsite_request(
    record: &HoldRequestRecord,
    locations: &DeliveryLocationTable,
) -> OffsiteRequest {
    let request_type = record.resolved_request_type();
    let item = record.item.as_ref();

    let mut request = OffsiteRequest {
        tracking_id: Some(record.id.to_string()),
        request_type: request_type.as_str().to_string(),
        requesting_institution: REQUESTING_INSTITUTION.to_string(),
        item_owning_institution: record.source_code.as_deref().and_then(owning_institution),
        patron_barcode: record
            .patron_info
            .as_ref()
            .and_then(|p| p.current_barcode())
            .map(str::to_string),
        item_barcodes: item.and_then(|i| i.barcode.clone()).into_iter().collect(),
        call_number: item.and_then(|i| i.call_number.clone()),
        delivery_location: record
            .pickup_location
            .as_deref()
            .and_then(|p| locations.lookup(p))
            .map(str::to_string),
        ..OffsiteRequest::default()
    };

    if request_type == RequestType::Edd {
        if let Some(edd) = &record.doc_delivery_data {
            request.email_address.clone_from(&edd.email_address);
            request.chapter_title.clone_from(&edd.chapter_title);
            request.start_page.clone_from(&edd.start_page);
            request.end_page.clone_from(&edd.end_page);
            request.author.clone_from(&edd.author);
            request.issue.clone_from(&edd.issue);
            request.volume.clone_from(&edd.volume);
            request.request_notes.clone_from(&edd.request_notes);
        }
    }

    request
}

/// Posts records to the offsite storage backend.
pub struct OffsiteStage {
    backend: Arc<dyn OffsiteBackend>,
    locations: Arc<DeliveryLocationTable>,
}

impl OffsiteStage {
    #[must_use]
    pub fn new(backend: Arc<dyn OffsiteBackend>, locations: Arc<DeliveryLocationTable>) -> Self {
        Self { backend, locations }
    }
}

#[async_trait]
impl RecordStage for OffsiteStage {
    fn stage(&self) -> Stage {
        Stage::OffsiteBackend
    }

    async fn apply(
        &self,
        mut record: HoldRequestRecord,
        _token: &AccessToken,
    ) -> Result<StageStep, ErrorEnvelope> {
        let request = build_offsite_request(&record, &self.locations);
        let response = self.backend.submit(&request).await?;

        if !response.success {
            warn!(
                hold_request_id = record.id,
                debug_info = %response.debug_info(),
                "offsite backend rejected hold request"
            );
            let message = format!(
                "the offsite backend returned a false success flag for hold request record: {}; {}",
                record.id,
                response.screen_message.as_deref().unwrap_or_default()
            );
            return Ok(StageStep::Rejected(OutcomeRecord::failure(
                record.id,
                record.job_id,
                OFFSITE_REJECTED_ERROR_TYPE,
                message,
            )));
        }

        // The backend echoes the type it accepted; fall back to what was sent.
        let document_delivery = if response.request_type.is_some() {
            response.is_document_delivery()
        } else {
            RequestType::from_wire(Some(&request.request_type)).is_document_delivery()
        };
        info!(
            hold_request_id = record.id,
            document_delivery,
            "offsite backend accepted hold request"
        );
        record.backend_response = Some(BackendResponse::Offsite(response));

        if document_delivery {
            let outcome = OutcomeRecord::success(record.id, record.job_id.clone());
            Ok(StageStep::Completed(record, outcome))
        } else {
            Ok(StageStep::Continue(record))
        }
    }
}

// ---------------------------------------------------------------------------
// Onsite
// ---------------------------------------------------------------------------

/// Posts records to the onsite fulfillment service.
pub struct OnsiteStage {
    backend: Arc<dyn OnsiteBackend>,
}

impl OnsiteStage {
    #[must_use]
    pub fn new(backend: Arc<dyn OnsiteBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl RecordStage for OnsiteStage {
    fn stage(&self) -> Stage {
        Stage::OnsiteBackend
    }

    async fn apply(
        &self,
        mut record: HoldRequestRecord,
        token: &AccessToken,
    ) -> Result<StageStep, ErrorEnvelope> {
        let request = OnsiteRequest::from(&record);
        let status = self.backend.submit(&request, token).await?;
        info!(hold_request_id = record.id, status, "onsite service accepted hold request");
        record.backend_response = Some(BackendResponse::Onsite { status });

        if record.resolved_request_type().is_document_delivery() {
            let outcome = OutcomeRecord::success(record.id, record.job_id.clone());
            Ok(StageStep::Completed(record, outcome))
        } else {
            Ok(StageStep::Continue(record))
        }
    }
}
