use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use catalog_core::config::core_config::AppConfig;
use catalog_core::model::entity::EntityType;
use catalog_core::provider::catalog_api::HttpCatalogApi;
use catalog_core::provider::http_client::reqwest_client::ReqwestClient;
use catalog_core::provider::router::{MemoryHistory, Router};
use catalog_core::service::engine::{EngineEvent, EngineSettings, QueryEngine};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing_subscriber::prelude::*;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
struct BrowserConfig {
    trace_level: Option<String>,
    trace_json: Option<bool>,
}

/// Lists catalog entities the way a list view loads them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    config: Option<Vec<PathBuf>>,

    /// e.g. `investigation`, `dataset`, `facilityCycle`
    #[arg(short, long, default_value = "investigation")]
    entity: EntityType,

    /// Encoded view state, as found in the location of a list view
    #[arg(short, long, default_value = "")]
    query: String,

    /// Number of pages to scroll through
    #[arg(short, long, default_value_t = 1)]
    pages: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config_files = cli.config.unwrap_or_default();
    config_files.insert(0, "config/config.yml".into());

    let app_config: AppConfig<BrowserConfig> =
        AppConfig::from_files(&config_files).context("Failed creating config")?;

    initialize_tracing(&app_config.app)?;

    let mut client = reqwest::Client::builder();
    if let Some(timeout) = app_config.core.request_timeout {
        client = client.timeout(timeout);
    }
    let client = ReqwestClient::new(client.build().context("Failed to build HTTP client")?);

    let api = HttpCatalogApi::new(
        Arc::new(client),
        app_config.core.api_url.as_str(),
        app_config.core.session_token.clone(),
    );

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?
        .block_on(async {
            let mut engine = QueryEngine::from_config(
                &app_config.core,
                cli.entity,
                MemoryHistory::new(&cli.query),
                Arc::new(api),
                EngineSettings::default(),
            )?;

            browse(&mut engine, cli.pages).await;
            Ok::<_, anyhow::Error>(())
        })
}

async fn browse(engine: &mut QueryEngine<MemoryHistory>, pages: u32) {
    for _ in 0..pages {
        for event in engine.run_until_idle().await {
            if let EngineEvent::RequestFailed { kind, error } = event {
                tracing::error!(%kind, %error, "Request failed");
            }
        }

        let loaded = engine.row_count();
        engine.on_viewport(loaded.saturating_sub(1));
        if engine.row_count() == loaded && !engine.is_loading(loaded) {
            break;
        }
    }
    engine.run_until_idle().await;

    for row in engine.rows() {
        println!("{}\t{}", u64::from(row.id), row.name);
    }

    let total = engine
        .total_count()
        .map_or_else(|| "unknown".to_owned(), |count| count.to_string());
    println!(
        "{} of {total} {}, location ?{}",
        engine.row_count(),
        engine.entity_type().endpoint(),
        engine.router().current_query_string()
    );
}

fn initialize_tracing(config: &BrowserConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| {
            tracing_subscriber::EnvFilter::try_new(config.trace_level.as_deref().unwrap_or("info"))
        })
        .context("Failed to create env filter")?;

    let tracing_layer = tracing_subscriber::registry().with(filter);

    if config.trace_json.unwrap_or_default() {
        tracing_layer
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_layer
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    };
    Ok(())
}
