//! Use Case Library API server binary.
//!
//! Reads SharePoint settings from the environment (a `.env` file is
//! honoured), builds the token providers and clients, and serves the API.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use usecase_api::AppState;
use usecase_api::config::{ApiConfig, DEFAULT_BIND_ADDR};
use usecase_core::auth::managed_identity::{GRAPH_RESOURCE, IdentityEndpoint};
use usecase_core::auth::{CertificateTokenSource, ManagedIdentityTokenSource, TokenCache};
use usecase_core::sharepoint::{GraphClient, RetryPolicy, SharePointClient};

const DEFAULT_LOG_FILTER: &str = "info,usecase_api=debug,usecase_core=debug";

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "usecase_api_server", about = "Use Case Library API server")]
struct Args {
    /// Port to listen on, bound to 127.0.0.1. Overrides `--bind-addr`.
    #[arg(long)]
    port: Option<u16>,

    /// Full listener address.
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind_addr: String,

    /// Client id of a user-assigned managed identity for Graph calls.
    #[arg(long, env = "MANAGED_IDENTITY_CLIENT_ID")]
    managed_identity_client_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    config.bind_addr = match args.port {
        Some(port) => format!("127.0.0.1:{port}"),
        None => args.bind_addr,
    };

    let settings = &config.sharepoint;
    info!(
        site = %settings.site_url,
        list = %settings.list_title,
        timeout_secs = settings.request_timeout.as_secs(),
        max_attempts = settings.max_attempts,
        "starting usecase_api_server"
    );
    if settings.list_id.is_none() {
        warn!("SP_LIST_ID is not set; the list endpoints will answer 500");
    }

    let http = reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .build()?;

    let certificate = CertificateTokenSource::new(http.clone(), settings.credential.clone())
        .with_authority_host(settings.authority_host.clone());
    let sharepoint = SharePointClient::from_settings(
        http.clone(),
        settings,
        Arc::new(TokenCache::new(certificate)),
    );

    let identity = IdentityEndpoint::from_env();
    match &identity {
        IdentityEndpoint::AppService { endpoint, .. } => {
            info!(%endpoint, "using App Service managed identity for Graph")
        }
        IdentityEndpoint::Imds { .. } => info!("using IMDS managed identity for Graph"),
    }
    let managed = ManagedIdentityTokenSource::new(http.clone(), identity, GRAPH_RESOURCE)
        .with_client_id(args.managed_identity_client_id);
    let graph = GraphClient::new(http, Arc::new(TokenCache::new(managed)))
        .with_base_url(settings.graph_base_url.clone())
        .with_retry(RetryPolicy {
            max_attempts: settings.max_attempts,
            ..RetryPolicy::default()
        })
        .with_timeout(settings.request_timeout);

    let bind_addr = config.bind_addr.clone();
    let app = usecase_api::router(AppState::new(config, sharepoint, graph));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
            }
        })
        .await?;

    Ok(())
}
