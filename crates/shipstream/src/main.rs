use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shipstream_api::state::AppState;
use shipstream_core::{IngestPipeline, PipelineConfig};
use shipstream_store::{ObjectStore, S3Config, S3ObjectStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Shipstream ingestion CLI and API server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the ingestion API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Execute a single ingestion run and print the outcome
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => {
            let (pipeline, store) = build_pipeline().await?;
            let relay_namespace = pipeline.config().source_namespace.clone();
            let state = Arc::new(AppState::new(pipeline, store, relay_namespace));
            info!("starting Shipstream API server");
            shipstream_api::serve(state, port).await
        }
        Command::Run => {
            let (pipeline, _store) = build_pipeline().await?;
            let outcome = pipeline.run().await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
    }
}

async fn build_pipeline() -> Result<(Arc<IngestPipeline>, Arc<dyn ObjectStore>)> {
    let config = PipelineConfig::from_env()?;
    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(s3_config_from_env()?).await?);
    let pipeline = Arc::new(IngestPipeline::new(store.clone(), config)?);
    Ok((pipeline, store))
}

fn s3_config_from_env() -> Result<S3Config> {
    let bucket = std::env::var("SHIPSTREAM_BUCKET").context("SHIPSTREAM_BUCKET must be set")?;
    let region =
        std::env::var("SHIPSTREAM_REGION").unwrap_or_else(|_| "us-east-1".to_string());
    let endpoint = std::env::var("SHIPSTREAM_ENDPOINT").ok();
    let access_key_id = std::env::var("SHIPSTREAM_ACCESS_KEY_ID").ok();
    let secret_access_key = std::env::var("SHIPSTREAM_SECRET_ACCESS_KEY").ok();
    let force_path_style = std::env::var("SHIPSTREAM_FORCE_PATH_STYLE")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    Ok(S3Config {
        bucket,
        region,
        endpoint,
        access_key_id,
        secret_access_key,
        force_path_style,
    })
}
