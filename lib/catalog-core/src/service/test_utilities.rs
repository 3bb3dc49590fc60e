use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::filter_compiler::{AdditionalFilter, FilterKind};
use crate::model::entity::{DatasetDetails, EntityDetails, EntityId, EntityRecord, EntityType};
use crate::provider::catalog_api::CatalogApi;
use crate::provider::catalog_api::error::CatalogApiError;

pub fn dataset(id: u64) -> EntityRecord {
    EntityRecord {
        id: EntityId::from(id),
        name: format!("DATASET {id}"),
        details: EntityDetails::Dataset(DatasetDetails::default()),
    }
}

/// Records with consecutive ids filling `page`
pub fn dataset_page(page: u32, size: u32) -> Vec<EntityRecord> {
    let first = u64::from((page - 1) * size) + 1;
    (first..first + u64::from(size)).map(dataset).collect()
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallKind {
    Count,
    Page,
}

enum Responder {
    Count(oneshot::Sender<Result<u64, CatalogApiError>>),
    Page(oneshot::Sender<Result<Vec<EntityRecord>, CatalogApiError>>),
}

struct RecordedCall {
    kind: CallKind,
    entity_type: EntityType,
    filters: Vec<AdditionalFilter>,
    cancellation: CancellationToken,
    responder: Option<Responder>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CallSummary {
    pub kind: CallKind,
    pub entity_type: EntityType,
    pub filters: Vec<AdditionalFilter>,
    pub cancelled: bool,
}

impl CallSummary {
    pub fn skip(&self) -> Option<u64> {
        self.filters
            .iter()
            .find(|filter| filter.kind == FilterKind::Skip)
            .and_then(|filter| filter.value.as_u64())
    }
}

/// Catalog API whose responses are released one by one by the test, in any
/// order. Cancellation is ignored so late responses still arrive, the way a
/// transport that cannot abort would deliver them.
#[derive(Clone, Default)]
pub struct ControlledCatalogApi {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ControlledCatalogApi {
    pub fn calls(&self) -> Vec<CallSummary> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| CallSummary {
                kind: call.kind,
                entity_type: call.entity_type,
                filters: call.filters.clone(),
                cancelled: call.cancellation.is_cancelled(),
            })
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Index of the latest page call with the given `skip`
    pub fn page_call(&self, skip: u64) -> usize {
        self.calls()
            .iter()
            .rposition(|call| call.kind == CallKind::Page && call.skip() == Some(skip))
            .unwrap()
    }

    /// Index of the latest count call
    pub fn count_call(&self) -> usize {
        self.calls()
            .iter()
            .rposition(|call| call.kind == CallKind::Count)
            .unwrap()
    }

    pub fn respond_page(&self, index: usize, result: Result<Vec<EntityRecord>, CatalogApiError>) {
        match self.take_responder(index) {
            Responder::Page(sender) => sender.send(result).unwrap(),
            Responder::Count(_) => panic!("call {index} is a count request"),
        }
    }

    pub fn respond_count(&self, index: usize, result: Result<u64, CatalogApiError>) {
        match self.take_responder(index) {
            Responder::Count(sender) => sender.send(result).unwrap(),
            Responder::Page(_) => panic!("call {index} is a page request"),
        }
    }

    fn take_responder(&self, index: usize) -> Responder {
        self.calls.lock().unwrap()[index]
            .responder
            .take()
            .expect("call already answered")
    }

    fn record(
        &self,
        kind: CallKind,
        entity_type: EntityType,
        filters: Vec<AdditionalFilter>,
        cancellation: CancellationToken,
        responder: Responder,
    ) {
        self.calls.lock().unwrap().push(RecordedCall {
            kind,
            entity_type,
            filters,
            cancellation,
            responder: Some(responder),
        });
    }
}

impl CatalogApi for ControlledCatalogApi {
    fn fetch_page(
        &self,
        entity_type: EntityType,
        filters: Vec<AdditionalFilter>,
        cancellation: CancellationToken,
    ) -> BoxFuture<'static, Result<Vec<EntityRecord>, CatalogApiError>> {
        let (sender, receiver) = oneshot::channel();
        self.record(
            CallKind::Page,
            entity_type,
            filters,
            cancellation,
            Responder::Page(sender),
        );

        async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(CatalogApiError::Transport("dropped".to_owned())))
        }
        .boxed()
    }

    fn fetch_count(
        &self,
        entity_type: EntityType,
        filters: Vec<AdditionalFilter>,
        cancellation: CancellationToken,
    ) -> BoxFuture<'static, Result<u64, CatalogApiError>> {
        let (sender, receiver) = oneshot::channel();
        self.record(
            CallKind::Count,
            entity_type,
            filters,
            cancellation,
            Responder::Count(sender),
        );

        async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(CatalogApiError::Transport("dropped".to_owned())))
        }
        .boxed()
    }
}
