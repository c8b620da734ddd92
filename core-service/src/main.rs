use std::sync::Arc;

use anyhow::Context;
use bridge_desktop::{FileCredentialStore, ReqwestHttpClient};
use bridge_traits::{CredentialStore, HttpClient};
use core_auth::{spawn_renewal_task, CredentialManager};
use core_runtime::{logging::init_logging, AppConfig};
use core_service::{ApiServer, AppState, GoogleDriveProviders};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    init_logging(config.logging.clone()).context("Failed to initialize logging")?;
    info!(?config, "Starting camfeed");

    let http_client: Arc<dyn HttpClient> =
        Arc::new(ReqwestHttpClient::new().context("Failed to build HTTP client")?);
    let store: Arc<dyn CredentialStore> =
        Arc::new(FileCredentialStore::new(config.credentials_dir.clone()));

    let credentials = Arc::new(CredentialManager::from_app_config(
        &config,
        http_client.clone(),
        store,
    ));
    let authenticated = credentials.initialize().await;
    if authenticated == 0 {
        warn!("No account is authorized yet; visit /auth/google/{{index}} to authorize");
    }

    let state = AppState::new(
        credentials.clone(),
        Arc::new(GoogleDriveProviders::new(http_client)),
        config.stream.clone(),
    );
    let server = ApiServer::new(config.listen_addr(), state);

    let shutdown = server.cancel_token();
    let renewal = spawn_renewal_task(credentials, config.renewal_interval, shutdown.clone());

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                return;
            }
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    server.run().await.context("Server failed")?;
    shutdown.cancel();
    renewal.await.context("Renewal task panicked")?;

    Ok(())
}
