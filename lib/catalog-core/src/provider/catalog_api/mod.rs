//! Entity and count endpoints of the catalog REST API.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::filter_compiler::AdditionalFilter;
use crate::model::entity::{EntityRecord, EntityType};
use crate::provider::http_client::{HttpClient, RequestBuilder};

pub mod error;


use error::CatalogApiError;

/// Returned futures own everything they need, so callers may store and
/// share them beyond the borrow of the provider.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait CatalogApi: Send + Sync {
    fn fetch_page(
        &self,
        entity_type: EntityType,
        filters: Vec<AdditionalFilter>,
        cancellation: CancellationToken,
    ) -> BoxFuture<'static, Result<Vec<EntityRecord>, CatalogApiError>>;

    fn fetch_count(
        &self,
        entity_type: EntityType,
        filters: Vec<AdditionalFilter>,
        cancellation: CancellationToken,
    ) -> BoxFuture<'static, Result<u64, CatalogApiError>>;
}

pub struct HttpCatalogApi {
    client: Arc<dyn HttpClient>,
    api_url: String,
    session_token: Option<SecretString>,
}

impl HttpCatalogApi {
    pub fn new(
        client: Arc<dyn HttpClient>,
        api_url: &str,
        session_token: Option<SecretString>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_owned(),
            session_token,
        }
    }

    fn request(
        &self,
        path: &str,
        filters: Vec<AdditionalFilter>,
        cancellation: CancellationToken,
    ) -> RequestBuilder {
        let url = format!("{}/{path}", self.api_url);
        tracing::debug!(%url, clauses = filters.len(), "Dispatching catalog request");

        let mut request = self
            .client
            .get(&url)
            .query(filters.iter().map(AdditionalFilter::to_query_pair))
            .cancellation(cancellation);

        if let Some(token) = &self.session_token {
            request = request.bearer_auth(token.expose_secret());
        }

        request
    }
}

impl CatalogApi for HttpCatalogApi {
    fn fetch_page(
        &self,
        entity_type: EntityType,
        filters: Vec<AdditionalFilter>,
        cancellation: CancellationToken,
    ) -> BoxFuture<'static, Result<Vec<EntityRecord>, CatalogApiError>> {
        let request = self.request(&entity_type.endpoint(), filters, cancellation);

        async move {
            let values: Vec<Value> = request.send().await?.error_for_status()?.json()?;

            values
                .into_iter()
                .map(|value| EntityRecord::from_json(entity_type, value))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|error| CatalogApiError::InvalidResponse(error.to_string()))
        }
        .boxed()
    }

    fn fetch_count(
        &self,
        entity_type: EntityType,
        filters: Vec<AdditionalFilter>,
        cancellation: CancellationToken,
    ) -> BoxFuture<'static, Result<u64, CatalogApiError>> {
        let path = format!("{}/count", entity_type.endpoint());
        let request = self.request(&path, filters, cancellation);

        async move { Ok(request.send().await?.error_for_status()?.json()?) }.boxed()
    }
}
