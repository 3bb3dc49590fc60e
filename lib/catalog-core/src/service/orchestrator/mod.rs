//! Dispatch of count and page requests for the current loading session.
//!
//! Every request is tagged with the fingerprint of the session that issued
//! it. Starting a new session cancels everything of the previous one, and a
//! response is handed out for application only if its fingerprint still
//! matches the one computed from the current query state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt, TryFutureExt};
use tokio_util::sync::CancellationToken;

use crate::filter_compiler::CompiledQuery;
use crate::model::entity::EntityRecord;
use crate::provider::catalog_api::CatalogApi;
use crate::provider::catalog_api::error::CatalogApiError;

pub mod fingerprint;


use fingerprint::{RequestFingerprint, RequestKind, SessionFingerprint};

#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Count(u64),
    Page(Vec<EntityRecord>),
}

type SharedResponse = Shared<BoxFuture<'static, Result<Payload, CatalogApiError>>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionPhase {
    Idle,
    CountPending,
    DataPending,
    Ready,
    /// the query state moved on; nothing of this session will be applied
    Stale,
}

/// Resolution of a request, not yet checked for staleness
#[derive(Debug)]
pub struct Completion {
    pub fingerprint: RequestFingerprint,
    generation: u64,
    pub result: Result<Payload, CatalogApiError>,
}

/// Handle on an issued (or joined) request
#[derive(Clone)]
pub struct RequestHandle {
    pub fingerprint: RequestFingerprint,
    /// `true` if an identical request was already in flight
    pub attached: bool,
    response: SharedResponse,
}

impl RequestHandle {
    pub async fn response(self) -> Result<Payload, CatalogApiError> {
        self.response.await
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiscardReason {
    /// issued by an earlier session
    Superseded,
    /// fingerprint no longer matches the current query state
    Stale,
    Cancelled,
}

#[derive(Debug, PartialEq)]
pub enum Settlement {
    Count(u64),
    Page {
        page: u32,
        records: Vec<EntityRecord>,
    },
    Failed {
        kind: RequestKind,
        error: CatalogApiError,
    },
    Discarded {
        fingerprint: RequestFingerprint,
        reason: DiscardReason,
    },
}

struct Session {
    fingerprint: SessionFingerprint,
    query: CompiledQuery,
    cancellation: CancellationToken,
    stale: bool,
}

pub struct RequestOrchestrator {
    api: Arc<dyn CatalogApi>,
    session: Option<Session>,
    generation: u64,
    in_flight: HashMap<RequestFingerprint, SharedResponse>,
    pending: FuturesUnordered<BoxFuture<'static, Completion>>,
    failed: HashSet<RequestFingerprint>,
}

impl RequestOrchestrator {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self {
            api,
            session: None,
            generation: 0,
            in_flight: HashMap::new(),
            pending: FuturesUnordered::new(),
            failed: HashSet::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        let Some(session) = &self.session else {
            return SessionPhase::Idle;
        };

        if session.stale {
            SessionPhase::Stale
        } else if self.in_flight.keys().any(|key| key.kind == RequestKind::Count) {
            SessionPhase::CountPending
        } else if !self.in_flight.is_empty() {
            SessionPhase::DataPending
        } else {
            SessionPhase::Ready
        }
    }

    pub fn session_fingerprint(&self) -> Option<&SessionFingerprint> {
        self.session.as_ref().map(|session| &session.fingerprint)
    }

    pub fn is_in_flight(&self, fingerprint: &RequestFingerprint) -> bool {
        self.in_flight.contains_key(fingerprint)
    }

    pub fn is_failed(&self, fingerprint: &RequestFingerprint) -> bool {
        self.failed.contains(fingerprint)
    }

    /// Number of issued requests whose resolution has not been collected
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Tears down the current session and issues `count` and page 1 of the
    /// new one.
    pub fn start_session(&mut self, query: CompiledQuery) -> SessionFingerprint {
        self.cancel();

        let fingerprint = SessionFingerprint::new(&query);
        tracing::debug!(
            session = %fingerprint,
            entity = %query.entity_type,
            page_size = query.page_size,
            "Starting loading session"
        );

        self.session = Some(Session {
            fingerprint: fingerprint.clone(),
            query,
            cancellation: CancellationToken::new(),
            stale: false,
        });

        self.request_count();
        self.request_page(1);

        fingerprint
    }

    /// Cancels every request of the current session; their late resolutions
    /// are discarded.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(
                session = %session.fingerprint,
                in_flight = self.in_flight.len(),
                "Cancelling loading session"
            );
            session.cancellation.cancel();
        }

        self.generation += 1;
        self.in_flight.clear();
        self.failed.clear();
    }

    pub fn request_count(&mut self) -> Option<RequestHandle> {
        let session = self.session.as_ref()?;
        let fingerprint = RequestFingerprint::count(&session.fingerprint);
        if let Some(handle) = self.attach(&fingerprint) {
            return Some(handle);
        }

        let future = self
            .api
            .fetch_count(
                session.query.entity_type,
                session.query.count_filters(),
                session.cancellation.clone(),
            )
            .map_ok(Payload::Count);

        Some(self.issue(fingerprint, future.boxed()))
    }

    /// Issues `page` of the current session, or joins the identical request
    /// already in flight.
    pub fn request_page(&mut self, page: u32) -> Option<RequestHandle> {
        let session = self.session.as_ref()?;
        let fingerprint = RequestFingerprint::page(&session.fingerprint, page);
        if let Some(handle) = self.attach(&fingerprint) {
            return Some(handle);
        }

        let future = self
            .api
            .fetch_page(
                session.query.entity_type,
                session.query.page_filters(page),
                session.cancellation.clone(),
            )
            .map_ok(Payload::Page);

        Some(self.issue(fingerprint, future.boxed()))
    }

    fn attach(&self, fingerprint: &RequestFingerprint) -> Option<RequestHandle> {
        let response = self.in_flight.get(fingerprint)?;
        tracing::trace!(request = %fingerprint, "Joining in-flight request");

        Some(RequestHandle {
            fingerprint: fingerprint.clone(),
            attached: true,
            response: response.clone(),
        })
    }

    fn issue(
        &mut self,
        fingerprint: RequestFingerprint,
        future: BoxFuture<'static, Result<Payload, CatalogApiError>>,
    ) -> RequestHandle {
        tracing::debug!(request = %fingerprint, "Issuing request");

        let response = future.shared();
        self.failed.remove(&fingerprint);
        self.in_flight.insert(fingerprint.clone(), response.clone());

        let generation = self.generation;
        let completion_fingerprint = fingerprint.clone();
        self.pending.push(
            response
                .clone()
                .map(move |result| Completion {
                    fingerprint: completion_fingerprint,
                    generation,
                    result,
                })
                .boxed(),
        );

        RequestHandle {
            fingerprint,
            attached: false,
            response,
        }
    }

    /// Next resolved request in completion order, `None` once nothing is
    /// outstanding.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.pending.next().await
    }

    /// Decides what to do with a resolved request. `current` is the session
    /// fingerprint computed from the query state at this very moment.
    pub fn settle(&mut self, completion: Completion, current: &SessionFingerprint) -> Settlement {
        let Completion {
            fingerprint,
            generation,
            result,
        } = completion;

        if generation != self.generation {
            tracing::trace!(request = %fingerprint, "Discarding response of a cancelled session");
            return Settlement::Discarded {
                fingerprint,
                reason: DiscardReason::Superseded,
            };
        }

        self.in_flight.remove(&fingerprint);

        if fingerprint.session != *current {
            if let Some(session) = &mut self.session {
                session.stale = true;
            }
            tracing::debug!(request = %fingerprint, current = %current, "Discarding stale response");
            return Settlement::Discarded {
                fingerprint,
                reason: DiscardReason::Stale,
            };
        }

        match result {
            Ok(Payload::Count(count)) => Settlement::Count(count),
            Ok(Payload::Page(records)) => match fingerprint.kind {
                RequestKind::Page(page) => Settlement::Page { page, records },
                RequestKind::Count => Settlement::Failed {
                    kind: RequestKind::Count,
                    error: CatalogApiError::InvalidResponse("page payload for count".to_owned()),
                },
            },
            Err(error) if error.is_cancelled() => Settlement::Discarded {
                fingerprint,
                reason: DiscardReason::Cancelled,
            },
            Err(error) => {
                tracing::warn!(request = %fingerprint, %error, "Catalog request failed");
                self.failed.insert(fingerprint.clone());
                Settlement::Failed {
                    kind: fingerprint.kind,
                    error,
                }
            }
        }
    }
}
