//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-time failures are rendered
//! by the authentication filter.

mod api_key;

use std::env;
use std::net::SocketAddr;

use authn::application::legacy::adapt_module;
use authn::presentation::ResponseHandler;
use authn::{AuthenticatedRequest, AuthenticationFilter, AuthnConfig, ModuleConfig, authenticate};
use axum::routing::get;
use axum::{Extension, Json, Router, middleware};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api_key::ApiKeyModule;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,authn=info,audit=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = if cfg!(debug_assertions) {
        AuthnConfig::development()
    } else {
        AuthnConfig::default()
    };

    let api_keys = env::var("API_KEYS").unwrap_or_default();
    let filter = AuthenticationFilter::builder()
        .config(config)
        .auth_module(adapt_module(ApiKeyModule::from_spec(&api_keys)), ModuleConfig::new())
        .response_handler(ResponseHandler::standard())
        .build()?;

    // Startup initialization: failures are reported on every request instead
    if let Err(e) = filter.initialize().await {
        tracing::warn!(error = %e, "Auth module initialization failed, requests will be rejected");
    }

    // Build router
    let app = Router::new()
        .route("/api/whoami", get(whoami))
        .layer(middleware::from_fn_with_state(
            filter,
            authenticate::<authn::infra::TracingAuditApi>,
        ))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:31113".to_string())
        .parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn whoami(Extension(auth): Extension<AuthenticatedRequest>) -> Json<Value> {
    Json(json!({
        "requestId": auth.request_id.to_string(),
        "principal": auth.principal,
        "context": auth.context,
    }))
}
