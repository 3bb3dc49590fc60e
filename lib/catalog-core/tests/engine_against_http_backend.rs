use std::sync::Arc;

use catalog_core::config::core_config::{AppConfig, NoCustomConfig};
use catalog_core::model::entity::EntityType;
use catalog_core::provider::catalog_api::HttpCatalogApi;
use catalog_core::provider::http_client::reqwest_client::ReqwestClient;
use catalog_core::provider::router::{MemoryHistory, Router};
use catalog_core::service::engine::{EngineEvent, EngineSettings, QueryEngine};
use serde_json::json;
use similar_asserts::assert_eq;
use wiremock::http::Method;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOCATION: &str = "sort=%7B%22name%22%3A%22asc%22%7D\
    &filters=%7B%22name%22%3A%7B%22type%22%3A%22text%22%2C%22value%22%3A%2261%22%7D%7D\
    &results=20";

fn engine(mock_server: &MockServer, location: &str) -> QueryEngine<MemoryHistory> {
    let config = AppConfig::<NoCustomConfig>::from_yaml([format!(
        "apiUrl: {}/\nsessionToken: secret-session\nusername: user1\n",
        mock_server.uri()
    )])
    .unwrap();

    let api = HttpCatalogApi::new(
        Arc::new(ReqwestClient::default()),
        config.core.api_url.as_str(),
        config.core.session_token.clone(),
    );

    QueryEngine::from_config(
        &config.core,
        EntityType::Dataset,
        MemoryHistory::new(location),
        Arc::new(api),
        EngineSettings::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_filtered_sorted_dataset_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method(Method::GET))
        .and(path("/datasets"))
        .and(header("Authorization", "Bearer secret-session"))
        .and(query_param("where", r#"{"name":{"like":"61"}}"#))
        .and(query_param("order", "name asc"))
        .and(query_param("skip", "0"))
        .and(query_param("limit", "20"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": 61, "name": "DATASET 61" }])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method(Method::GET))
        .and(path("/datasets/count"))
        .and(query_param("where", r#"{"name":{"like":"61"}}"#))
        .and(query_param_is_missing("order"))
        .and(query_param_is_missing("skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(1)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut engine = engine(&mock_server, LOCATION);
    let events = engine.run_until_idle().await;

    assert_eq!(2, events.len());
    assert_eq!("DATASET 61", engine.row_at(0).unwrap().name);
    assert_eq!(Some(1), engine.total_count());
    assert_eq!(20, engine.current_state().results);
}

#[tokio::test]
async fn test_restricted_query_matches_configured_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method(Method::GET))
        .and(path("/datasets"))
        .and(query_param(
            "where",
            r#"{"investigation.investigationUsers.user.name":{"eq":"user1"}}"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method(Method::GET))
        .and(path("/datasets/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(0)))
        .mount(&mock_server)
        .await;

    let mut engine = engine(&mock_server, "restrict=true");
    engine.run_until_idle().await;

    assert_eq!(0, engine.row_count());
    assert_eq!(Some(0), engine.total_count());
    assert_eq!("restrict=true", engine.router().current_query_string());
}

#[tokio::test]
async fn test_server_error_is_reported_and_rows_stay_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method(Method::GET))
        .and(path("/datasets"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method(Method::GET))
        .and(path("/datasets/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(12)))
        .mount(&mock_server)
        .await;

    let mut engine = engine(&mock_server, "");
    let events = engine.run_until_idle().await;

    assert!(
        events
            .iter()
            .any(|event| matches!(event, EngineEvent::RequestFailed { .. }))
    );
    assert_eq!(0, engine.row_count());
    assert!(engine.is_page_failed(1));
    assert_eq!(Some(12), engine.total_count());
}
