use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::auth::provider::OAuthHttpProvider;
use service::auth::session::SessionKeys;
use service::auth::AuthService;
use service::storage::JsonFileStore;
use service::{runtime, Services};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Wire services over the JSON-file collection store.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    runtime::ensure_env(&cfg.storage.data_dir).await?;
    let store = JsonFileStore::new(&cfg.storage.data_dir)
        .await
        .map_err(|e| StartupError::Storage(e.to_string()))?;
    let services = Services::new(store);

    if !cfg.oauth.is_configured() {
        warn!(event = "oauth_unconfigured", "OAuth client credentials missing; sign-in will fail at the provider");
    }
    let provider = Arc::new(OAuthHttpProvider::new(cfg.oauth.clone()));
    let keys = SessionKeys::new(&cfg.auth.jwt_secret, cfg.auth.session_ttl_hours);
    let auth = Arc::new(AuthService::new(
        Arc::clone(&services.users),
        provider,
        keys,
        cfg.auth.admin_emails.clone(),
    ));
    Ok(ServerState::new(services, auth, cfg.auth.cookie_secure))
}

/// Public entry: build the app and run the HTTP server until Ctrl+C.
///
/// Expects configuration already loaded and logging initialized by the binary.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg)?;
    info!(%addr, data_dir = %cfg.storage.data_dir, event = "listening", "starting studio portal server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
        })
        .await?;
    Ok(())
}
