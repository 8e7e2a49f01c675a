use holdrq_core::HoldRequestRecord;

/// Drop records already marked processed, keeping the order of the rest.
#[must_use]
pub fn filter_unprocessed(records: Vec<HoldRequestRecord>) -> Vec<HoldRequestRecord> {
    records.into_iter().filter(|r| !r.processed).collect()
}
