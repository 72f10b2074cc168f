//! policygate decision service.
//!
//! - `POST /v1/access`, `POST /v1/rate-limit`
//! - `/healthz`, `/readyz`, `/metrics`
//! - Config path from the first argument (default `policygate.yaml`)

use tracing_subscriber::{fmt, EnvFilter};

use policygate_server::{app_state, config, ops, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "policygate-server stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "policygate.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.service.listen_addr()?;
    let grace = cfg.service.drain_grace();

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, "policygate-server starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    axum::serve(listener, app)
        .with_graceful_shutdown(ops::drain_on(ctrl_c, state, grace))
        .await?;
    Ok(())
}
