//! Location-based dispatch to the two fulfillment backends.

use holdrq_core::{HoldRequestRecord, Route};
use tracing::info;

use crate::token::AccessToken;

use super::backend::{OffsiteStage, OnsiteStage};
use super::operation::{PipelineFailure, StageReport};
use super::stage::StageRunner;

/// Records split by backend, each in input order.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub offsite: Vec<HoldRequestRecord>,
    pub onsite: Vec<HoldRequestRecord>,
}

/// Split records by the route of their item's holding location.
#[must_use]
pub fn partition(records: Vec<HoldRequestRecord>) -> Partition {
    let mut out = Partition::default();
    for record in records {
        match Route::for_record(&record) {
            Route::Offsite => out.offsite.push(record),
            Route::Onsite => out.onsite.push(record),
        }
    }
    out
}

/// Runs both backend stages over their partitions.
pub struct Dispatcher {
    runner: StageRunner,
    offsite: OffsiteStage,
    onsite: OnsiteStage,
}

impl Dispatcher {
    #[must_use]
    pub fn new(runner: StageRunner, offsite: OffsiteStage, onsite: OnsiteStage) -> Self {
        Self {
            runner,
            offsite,
            onsite,
        }
    }

    /// Post every record to its backend.
    ///
    /// The two branches run concurrently and a branch only runs when its
    /// partition is non-empty. Reports merge offsite first.
    ///
    /// # Errors
    ///
    /// If either branch fails the whole dispatch fails with no partial merge.
    /// When both fail, a permanent failure wins over a retryable one; between
    /// equals the offsite failure is reported.
    pub async fn dispatch(
        &self,
        records: Vec<HoldRequestRecord>,
        token: &AccessToken,
    ) -> Result<StageReport, PipelineFailure> {
        let Partition { offsite, onsite } = partition(records);
        info!(
            offsite = offsite.len(),
            onsite = onsite.len(),
            "partitioned records by holding location"
        );

        let offsite_branch = async {
            if offsite.is_empty() {
                Ok(StageReport::default())
            } else {
                self.runner.run(&self.offsite, offsite, token).await
            }
        };
        let onsite_branch = async {
            if onsite.is_empty() {
                Ok(StageReport::default())
            } else {
                self.runner.run(&self.onsite, onsite, token).await
            }
        };

        match tokio::join!(offsite_branch, onsite_branch) {
            (Ok(mut merged), Ok(onsite)) => {
                merged.merge(onsite);
                Ok(merged)
            }
            (Err(offsite), Err(onsite)) => {
                if onsite.is_retryable() || !offsite.is_retryable() {
                    Err(offsite)
                } else {
                    Err(onsite)
                }
            }
            (Err(failure), Ok(_)) | (Ok(_), Err(failure)) => Err(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use holdrq_core::{
        DeliveryLocationTable, Item, ItemLocation, OffsiteRequest, OffsiteResponse, OnsiteRequest,
        OutcomeRecord,
    };
    use proptest::prelude::*;
    use tokio::sync::Barrier;

    use super::*;
    use crate::error::{ErrorEnvelope, ErrorKind, Stage};
    use crate::traits::{OffsiteBackend, OnsiteBackend};
    use crate::service::classify::ErrorClassifier;
    use crate::testing::{FakeOffsiteBackend, FakeOnsiteBackend, RecordingSink};

    fn at(id: i64, location: Option<&str>) -> HoldRequestRecord {
        let mut record = HoldRequestRecord::new(id);
        record.request_type = Some("hold".into());
        record.item = Some(Item {
            barcode: Some(format!("b{id}")),
            location: location.map(|code| ItemLocation {
                code: code.into(),
                name: None,
            }),
            ..Item::default()
        });
        record
    }

    fn dispatcher(
        offsite: Arc<FakeOffsiteBackend>,
        onsite: Arc<FakeOnsiteBackend>,
        sink: Arc<RecordingSink>,
    ) -> Dispatcher {
        Dispatcher::new(
            StageRunner::new(sink, ErrorClassifier::default(), Duration::from_secs(10)),
            OffsiteStage::new(offsite, Arc::new(DeliveryLocationTable::default())),
            OnsiteStage::new(onsite),
        )
    }

    fn ids(records: &[HoldRequestRecord]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn partitions_by_location_prefix() {
        let split = partition(vec![
            at(1, Some("rc2ma")),
            at(2, Some("mal")),
            at(3, None),
            at(4, Some("RCPM2")),
        ]);
        assert_eq!(ids(&split.offsite), vec![1, 4]);
        assert_eq!(ids(&split.onsite), vec![2, 3]);
    }

    #[tokio::test]
    async fn merges_offsite_first() {
        let offsite = Arc::new(FakeOffsiteBackend::accepting_with_type("RETRIEVAL"));
        let onsite = Arc::new(FakeOnsiteBackend::accepting());
        let sink = Arc::new(RecordingSink::new());
        let report = dispatcher(offsite.clone(), onsite.clone(), sink)
            .dispatch(
                vec![at(1, Some("mal")), at(2, Some("rc2ma")), at(3, Some("sc"))],
                &AccessToken::new("t"),
            )
            .await
            .unwrap();
        assert_eq!(ids(&report.survivors), vec![2, 1, 3]);
        assert_eq!(offsite.requests().len(), 1);
        assert_eq!(onsite.requests().len(), 2);
    }

    #[tokio::test]
    async fn empty_partition_skips_backend() {
        let offsite = Arc::new(FakeOffsiteBackend::accepting_with_type("RETRIEVAL"));
        let onsite = Arc::new(FakeOnsiteBackend::accepting());
        let sink = Arc::new(RecordingSink::new());
        dispatcher(offsite.clone(), onsite.clone(), sink)
            .dispatch(vec![at(1, Some("mal"))], &AccessToken::new("t"))
            .await
            .unwrap();
        assert!(offsite.requests().is_empty());
        assert_eq!(onsite.requests().len(), 1);
    }

    #[tokio::test]
    async fn one_failing_branch_fails_dispatch() {
        let offsite = Arc::new(FakeOffsiteBackend::accepting_with_type("EDD"));
        let onsite = Arc::new(FakeOnsiteBackend::failing(ErrorKind::Status {
            status: 503,
            body: None,
        }));
        let sink = Arc::new(RecordingSink::new());
        let failure = dispatcher(offsite, onsite, sink.clone())
            .dispatch(
                vec![at(1, Some("rc2ma")), at(2, Some("mal"))],
                &AccessToken::new("t"),
            )
            .await
            .unwrap_err();
        assert!(failure.is_retryable());
        assert_eq!(failure.envelope.stage, Stage::OnsiteBackend);
        // The offsite branch still ran to completion and its outcome stays written.
        assert_eq!(sink.outcomes(), vec![OutcomeRecord::success(1, None)]);
    }

    #[tokio::test]
    async fn permanent_failure_wins_when_both_fail() {
        let offsite = Arc::new(FakeOffsiteBackend::failing(ErrorKind::Status {
            status: 500,
            body: None,
        }));
        let onsite = Arc::new(FakeOnsiteBackend::failing(ErrorKind::Status {
            status: 403,
            body: None,
        }));
        let sink = Arc::new(RecordingSink::new());
        let failure = dispatcher(offsite, onsite, sink)
            .dispatch(
                vec![at(1, Some("rc2ma")), at(2, Some("mal"))],
                &AccessToken::new("t"),
            )
            .await
            .unwrap_err();
        assert!(!failure.is_retryable());
        assert_eq!(failure.envelope.stage, Stage::OnsiteBackend);
    }

    /// Backend pair that only answers once both backends have been called.
    struct Rendezvous(Arc<Barrier>);

    #[async_trait]
    impl OffsiteBackend for Rendezvous {
        async fn submit(&self, _request: &OffsiteRequest) -> Result<OffsiteResponse, ErrorEnvelope> {
            self.0.wait().await;
            Ok(OffsiteResponse {
                success: true,
                request_type: Some("RETRIEVAL".into()),
                ..OffsiteResponse::default()
            })
        }
    }

    #[async_trait]
    impl OnsiteBackend for Rendezvous {
        async fn submit(
            &self,
            _request: &OnsiteRequest,
            _token: &AccessToken,
        ) -> Result<u16, ErrorEnvelope> {
            self.0.wait().await;
            Ok(201)
        }
    }

    #[tokio::test]
    async fn backends_are_called_concurrently() {
        let rendezvous = Arc::new(Rendezvous(Arc::new(Barrier::new(2))));
        let dispatcher = Dispatcher::new(
            StageRunner::new(
                Arc::new(RecordingSink::new()),
                ErrorClassifier::default(),
                Duration::from_secs(10),
            ),
            OffsiteStage::new(rendezvous.clone(), Arc::new(DeliveryLocationTable::default())),
            OnsiteStage::new(rendezvous),
        );

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            dispatcher.dispatch(
                vec![at(1, Some("mal")), at(2, Some("rc2ma"))],
                &AccessToken::new("t"),
            ),
        )
        .await
        .expect("offsite and onsite branches must overlap")
        .unwrap();
        assert_eq!(ids(&report.survivors), vec![2, 1]);
    }

    proptest! {
        #[test]
        fn routing_is_exclusive_and_complete(codes in proptest::collection::vec(
            proptest::option::of("(rc|RC|ma|sc)[a-z0-9]{0,3}"),
            0..20,
        )) {
            let records: Vec<HoldRequestRecord> = codes
                .iter()
                .enumerate()
                .map(|(i, c)| at(i64::try_from(i).unwrap(), c.as_deref()))
                .collect();
            let split = partition(records);
            prop_assert_eq!(split.offsite.len() + split.onsite.len(), codes.len());
            prop_assert!(split.offsite.iter().all(|r| Route::for_record(r) == Route::Offsite));
            prop_assert!(split.onsite.iter().all(|r| Route::for_record(r) == Route::Onsite));
            prop_assert!(split.offsite.windows(2).all(|w| w[0].id < w[1].id));
            prop_assert!(split.onsite.windows(2).all(|w| w[0].id < w[1].id));
        }
    }
}
