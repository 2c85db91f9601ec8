use axum::{extract::State, http::HeaderValue, response::Json, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use portalwatch::{scrape, types::*, AppState};

fn parse_port_from_args() -> Option<u16> {
    let mut args = std::env::args().peekable();
    while let Some(a) = args.next() {
        if a == "--port" {
            if let Some(v) = args.next() {
                if let Ok(p) = v.parse::<u16>() {
                    return Some(p);
                }
            }
        } else if let Some(rest) = a.strip_prefix("--port=") {
            if let Ok(p) = rest.parse::<u16>() {
                return Some(p);
            }
        }
    }
    None
}

fn port_from_env() -> Option<u16> {
    for k in ["PORTALWATCH_PORT", "PORT"] {
        if let Ok(v) = std::env::var(k) {
            if let Ok(p) = v.trim().parse::<u16>() {
                return Some(p);
            }
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!("Starting portalwatch");

    let state = Arc::new(AppState::new());
    info!(
        "Portal: {} | session file: {}",
        state.config.resolve_portal_url(),
        state.session_store.path().display()
    );

    // Only the frontend dev origin may call these endpoints from a browser.
    let origin = state.config.resolve_allowed_origin();
    let origin_value: HeaderValue = origin
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid allowed_origin '{}': {}", origin, e))?;
    let cors = CorsLayer::new()
        .allow_origin(origin_value)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/api/news", get(news_handler))
        .route("/api/cancellations", get(cancellations_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let port: u16 = parse_port_from_args().or_else(port_from_env).unwrap_or(8000);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Address already in use: {}. Stop the existing process or run with --port {} (or set PORT/PORTALWATCH_PORT).",
                bind_addr,
                port.saturating_add(1)
            )
        }
        Err(e) => return Err(e.into()),
    };
    info!("portalwatch listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).ok();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = async {
                if let Some(ref mut s) = sigterm {
                    s.recv().await;
                } else {
                    futures::future::pending::<()>().await;
                }
            } => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "portalwatch",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// `GET /api/news` — always 200 with an array.
///
/// Every failure (browser setup, login timeout, readiness timeout) collapses
/// to an empty array: the frontend treats "scrape broke" and "no news today"
/// identically, and the log is where the difference lives.
async fn news_handler(State(state): State<Arc<AppState>>) -> Json<Vec<NewsArticle>> {
    match scrape::scrape_news(&state).await {
        Ok(articles) => Json(articles),
        Err(e) => {
            error!("news scrape failed: {e:#}");
            Json(Vec::new())
        }
    }
}

/// `GET /api/cancellations` — always 200 with an array, same policy as news.
async fn cancellations_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Cancellation>> {
    match scrape::scrape_cancellations(&state).await {
        Ok(cancellations) => Json(cancellations),
        Err(e) => {
            error!("cancellations scrape failed: {e:#}");
            Json(Vec::new())
        }
    }
}
