//! Shared wiring for subcommands: configuration, storage, backend.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use moot_agent::Responder;
use moot_backend::{CompletionClient, HttpTransport};
use moot_config::AppConfig;
use moot_storage::Store;

pub fn load_config() -> anyhow::Result<AppConfig> {
    AppConfig::load().context("Failed to load configuration")
}

pub async fn open_store(config: &AppConfig) -> anyhow::Result<Store> {
    Store::new(&config.storage.database_path)
        .await
        .with_context(|| format!("Failed to open database at {}", config.storage.database_path))
}

pub fn build_responder(config: &AppConfig) -> Responder {
    let transport = HttpTransport::new(
        config.backend.endpoint.clone(),
        Duration::from_secs(config.backend.request_timeout_secs),
    );
    let client = CompletionClient::new(Arc::new(transport), config);
    Responder::new(client, config)
}
