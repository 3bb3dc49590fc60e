pub mod reqwest_client;


use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use itertools::Itertools;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> RequestBuilder;

    /// Resolves to [`Error::Cancelled`] as soon as `cancellation` fires
    async fn send(
        &self,
        url: &str,
        query: Vec<(String, String)>,
        headers: Option<Headers>,
        cancellation: CancellationToken,
    ) -> Result<Response, Error>;
}

pub type Headers = HashMap<String, String>;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusCode(pub u16);

#[derive(Clone, Debug)]
pub struct Request {
    pub headers: Headers,
    pub query: Vec<(String, String)>,
    pub url: String,
}

#[derive(Debug)]
pub struct Response {
    pub body: Vec<u8>,
    pub headers: Headers,
    pub status: StatusCode,

    pub request: Request,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    HttpError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Other HTTP client error: {0}")]
    Other(String),
    #[error("HTTP status code is error: {0}")]
    StatusCodeIsError(StatusCode),
    #[error("Request cancelled")]
    Cancelled,
}

impl Error {
    pub fn log_error(self, location: &std::panic::Location, request: &Request) -> Self {
        let debug_message = format!("\nGET {} - {self}", request.url);
        match self {
            // superseded requests are expected, not failures
            Self::Cancelled => tracing::debug!(%debug_message, %location),
            _ => tracing::error!(%debug_message, %location),
        }

        self
    }
}

impl Response {
    #[track_caller]
    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.status.is_client_error() || self.status.is_server_error() {
            let location = std::panic::Location::caller();
            Err(Error::StatusCodeIsError(self.status).log_error(location, &self.request))
        } else {
            Ok(self)
        }
    }

    pub fn header_get(&self, key: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(header_key, _)| header_key.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    #[track_caller]
    pub fn json<T: DeserializeOwned>(self) -> Result<T, Error> {
        match serde_json::from_slice(&self.body) {
            Ok(value) => Ok(value),
            Err(error) => {
                let location = std::panic::Location::caller();
                Err(Error::JsonError(error).log_error(location, &self.request))
            }
        }
    }

    #[track_caller]
    fn log_success(self) -> Self {
        let debug_message = format!("\nGET {} - HTTP {}", &self.request.url, self.status);

        let location = std::panic::Location::caller();
        tracing::debug!(%debug_message, %location);
        log_request_details(location, &self.request);

        let trace_response = format!(
            "\nResponse\nStatus: {}\nHeaders:\n{}\nBody:\n{}\n",
            self.status,
            format_headers(&self.headers),
            format_body(&self.body)
        );
        tracing::trace!(%trace_response, %location);

        self
    }
}

impl StatusCode {
    pub fn is_success(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    pub fn is_client_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    pub fn is_server_error(&self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct RequestBuilder {
    client: Arc<dyn HttpClient>,
    cancellation: CancellationToken,
    headers: Headers,
    query: Vec<(String, String)>,
    url: String,
}

impl RequestBuilder {
    pub fn new(client: Arc<dyn HttpClient>, url: &str) -> Self {
        Self {
            client,
            cancellation: CancellationToken::new(),
            headers: Headers::default(),
            query: vec![],
            url: url.to_string(),
        }
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn bearer_auth(mut self, token: &str) -> Self {
        self.headers
            .insert("Authorization".to_string(), format!("Bearer {token}"));
        self
    }

    /// Appends query parameters, keeping their order and any repeated keys
    pub fn query(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub async fn send(self) -> Result<Response, Error> {
        let location = std::panic::Location::caller();
        let as_request = self.as_request();

        let headers = if self.headers.is_empty() {
            None
        } else {
            Some(self.headers)
        };

        self.client
            .send(&self.url, self.query, headers, self.cancellation)
            .await
            .map(|response| response.log_success())
            .map_err(|e| {
                let error = e.log_error(location, &as_request);
                log_request_details(location, &as_request);
                error
            })
    }

    fn as_request(&self) -> Request {
        Request {
            headers: self.headers.clone(),
            query: self.query.clone(),
            url: self.url.clone(),
        }
    }
}

fn format_headers(headers: &Headers) -> String {
    match headers.is_empty() {
        true => "<None>".to_string(),
        false => headers
            .iter()
            .map(|(k, v)| match k.eq_ignore_ascii_case("authorization") {
                true => format!("{k}: <redacted>"),
                false => format!("{k}: {v}"),
            })
            .join("\n"),
    }
}

fn format_query(query: &[(String, String)]) -> String {
    match query.is_empty() {
        true => "<None>".to_string(),
        false => query.iter().map(|(k, v)| format!("{k}={v}")).join("\n"),
    }
}

fn format_body(body: &[u8]) -> String {
    match std::str::from_utf8(body) {
        Ok(string) => string.to_string(),
        Err(_) => format!("{:?}", body),
    }
}

fn log_request_details(location: &std::panic::Location, request: &Request) {
    let trace_request = format!(
        "\nRequest\nHeaders:\n{}\nQuery:\n{}\n",
        format_headers(&request.headers),
        format_query(&request.query)
    );

    tracing::trace!(%trace_request, %location);
}
