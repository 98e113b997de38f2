//! `topicnotes` executable.
//!
//! # Responsibility
//! - Wire configuration, logging, the document store and the RPC front.
//! - Host the interactive client and the load harness.

mod config;
mod menu;
mod stress;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Cli, Command, ServeConfig};
use log::info;
use std::sync::Arc;
use topicnotes_core::{init_logging, DocumentStore, NoteService, WikipediaClient};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| cli.command.default_log_level().to_string());
    init_logging(&level, cli.log_dir.as_deref()).context("failed to start logging")?;

    match cli.command {
        Command::Serve(args) => run_server(args.into_config()?).await,
        Command::Client(args) => menu::run(&args).await,
        Command::Stress(args) => stress::run(&args).await,
    }
}

async fn run_server(config: ServeConfig) -> Result<()> {
    let store = DocumentStore::load(&config.database)
        .with_context(|| format!("failed to load store `{}`", config.database.display()))?;
    let provider = WikipediaClient::with_timeout(&config.wikipedia_endpoint, config.lookup_timeout)
        .context("failed to build wikipedia client")?;
    let service = Arc::new(NoteService::new(Arc::new(store), provider));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    println!(
        "Server running on http://{}{}",
        config.bind, config.rpc_path
    );

    let app = topicnotes_rpc::router(service, &config.rpc_path);
    topicnotes_rpc::serve(listener, app, shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("event=shutdown module=cli status=start reason=ctrl_c");
    }
}
