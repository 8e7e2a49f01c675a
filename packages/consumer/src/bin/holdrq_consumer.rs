//! Hold request consumer entry point.
//!
//! Reads one partitioned-log event (from `--event` or stdin), runs it through
//! the pipeline and exits with `0` on success, `2` when the batch should be
//! redelivered and `1` when it never will succeed.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use holdrq_core::messages::StreamEvent;
use holdrq_core::DeliveryLocationTable;
use tokio::io::AsyncReadExt;
use tracing::info;

use holdrq_consumer::clients::{
    transport, DataApiClient, OAuthTokenProvider, ScsbClient, StreamsResultSink,
};
use holdrq_consumer::decoder::MsgPackStreamDecoder;
use holdrq_consumer::observability::{init_tracing, LogFormat};
use holdrq_consumer::service::{Collaborators, ConsumerConfig, Orchestrator};
use holdrq_consumer::token::process_token_store;

const EXIT_RETRY: u8 = 2;

#[derive(Parser)]
#[command(name = "holdrq-consumer", version, about)]
struct Cli {
    #[command(flatten)]
    config: ConsumerConfig,

    /// Event JSON file. Read from stdin when omitted.
    #[arg(long)]
    event: Option<PathBuf>,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Default filter directive when `RUST_LOG` is unset.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.log_format, &cli.log_level) {
        eprintln!("failed to install tracing subscriber: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "consumer aborted");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async move {
        let event = read_event(cli.event.as_deref()).await?;
        let payloads = event.payloads();
        let locations = load_locations(cli.config.delivery_locations.as_deref()).await?;
        let collaborators = http_collaborators(&cli.config)?;

        let orchestrator = Orchestrator::new(cli.config, locations, collaborators);
        Ok(match orchestrator.process(&payloads).await {
            Ok(completion) => {
                info!(path = ?completion.path, "{}", completion.message);
                ExitCode::SUCCESS
            }
            Err(failure) if failure.is_retryable() => ExitCode::from(EXIT_RETRY),
            Err(_) => ExitCode::FAILURE,
        })
    })
}

async fn read_event(path: Option<&Path>) -> Result<StreamEvent> {
    let raw = match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read event file {}", path.display()))?,
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("failed to read event from stdin")?;
            raw
        }
    };
    serde_json::from_str(&raw).context("event is not a valid partitioned-log event")
}

async fn load_locations(extension: Option<&Path>) -> Result<DeliveryLocationTable> {
    let mut table = DeliveryLocationTable::default();
    if let Some(path) = extension {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read delivery locations {}", path.display()))?;
        let extra = DeliveryLocationTable::from_json(&raw)
            .with_context(|| format!("invalid delivery locations in {}", path.display()))?;
        info!(entries = extra.len(), "loaded delivery location overrides");
        table.extend(extra);
    }
    Ok(table)
}

fn http_collaborators(config: &ConsumerConfig) -> Result<Collaborators> {
    let timeout = config.call_timeout();
    let client = transport::build_client(timeout).context("failed to build http client")?;
    let data_api = Arc::new(DataApiClient::new(
        client.clone(),
        config.nypl_data_api_base_url.clone(),
        timeout,
    ));

    Ok(Collaborators {
        token_provider: Arc::new(OAuthTokenProvider::new(
            client.clone(),
            config.oauth_provider_url.clone(),
            config.oauth_client_id.clone(),
            config.oauth_client_secret.clone(),
            config.oauth_provider_scope.clone(),
            timeout,
        )),
        token_store: process_token_store(),
        decoder: Arc::new(MsgPackStreamDecoder),
        items: data_api.clone(),
        patrons: data_api.clone(),
        onsite: data_api,
        offsite: Arc::new(ScsbClient::new(
            client.clone(),
            config.scsb_api_base_url.clone(),
            config.scsb_api_key.clone(),
            timeout,
        )),
        sink: Arc::new(StreamsResultSink::new(
            client,
            config.nypl_data_api_base_url.clone(),
            config.result_stream_name.clone(),
            config.result_schema_name.clone(),
            timeout,
        )),
    })
}
