//! Item and patron enrichment stages.

use std::sync::Arc;

use async_trait::async_trait;
use holdrq_core::HoldRequestRecord;

use crate::error::{ErrorEnvelope, ErrorKind, Stage};
use crate::token::AccessToken;
use crate::traits::{ItemLookup, PatronLookup};

use super::operation::StageStep;
use super::stage::RecordStage;

fn required<'a>(
    value: Option<&'a str>,
    stage: Stage,
    field: &'static str,
) -> Result<&'a str, ErrorEnvelope> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ErrorEnvelope::new(stage, ErrorKind::MissingKey { field }))
}

/// Attaches the item payload, looked up by source and item id.
pub struct ItemStage {
    items: Arc<dyn ItemLookup>,
}

impl ItemStage {
    #[must_use]
    pub fn new(items: Arc<dyn ItemLookup>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl RecordStage for ItemStage {
    fn stage(&self) -> Stage {
        Stage::ItemLookup
    }

    async fn apply(
        &self,
        mut record: HoldRequestRecord,
        token: &AccessToken,
    ) -> Result<StageStep, ErrorEnvelope> {
        let source = required(record.source_code.as_deref(), Stage::ItemLookup, "nyplSource")?;
        let item_id = required(record.item_id.as_deref(), Stage::ItemLookup, "record")?;
        let item = self.items.fetch_item(source, item_id, token).await?;
        record.item = Some(item);
        Ok(StageStep::Continue(record))
    }
}

/// Attaches the patron payload, looked up by patron id.
pub struct PatronStage {
    patrons: Arc<dyn PatronLookup>,
}

impl PatronStage {
    #[must_use]
    pub fn new(patrons: Arc<dyn PatronLookup>) -> Self {
        Self { patrons }
    }
}

#[async_trait]
impl RecordStage for PatronStage {
    fn stage(&self) -> Stage {
        Stage::PatronLookup
    }

    async fn apply(
        &self,
        mut record: HoldRequestRecord,
        token: &AccessToken,
    ) -> Result<StageStep, ErrorEnvelope> {
        let patron_id = required(record.patron_id.as_deref(), Stage::PatronLookup, "patron")?;
        let patron = self.patrons.fetch_patron(patron_id, token).await?;
        record.patron_info = Some(patron);
        Ok(StageStep::Continue(record))
    }
}
