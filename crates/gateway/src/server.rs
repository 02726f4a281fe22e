use {
    axum::{
        Router,
        extract::DefaultBodyLimit,
        http::HeaderValue,
        routing::{get, post},
    },
    tower_http::{
        cors::{AllowOrigin, Any, CorsLayer},
        trace::TraceLayer,
    },
    tracing::{info, warn},
    wardline_config::{CorsConfig, WardlineConfig},
    wardline_store::Forwarder,
};

use crate::{
    routes::{PROCESS_MESSAGE_PATH, health_handler, process_message_handler, root_handler},
    state::AppState,
};

/// Build the gateway router (shared between production startup and tests).
pub fn build_app(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route(PROCESS_MESSAGE_PATH, post(process_message_handler))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allows_any() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%origin, error = %e, "ignoring invalid CORS origin");
                None
            },
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Start the gateway HTTP server and run until Ctrl-C.
pub async fn start_gateway(config: &WardlineConfig) -> anyhow::Result<()> {
    let forwarder = Forwarder::from_config(&config.store)?;
    let state = AppState::new(forwarder).with_body_limit(config.server.max_body_bytes);
    let app = build_app(state, &config.cors);

    let listener =
        tokio::net::TcpListener::bind((config.server.bind.as_str(), config.server.port)).await?;
    info!(
        addr = %listener.local_addr()?,
        store = %config.store.base_url,
        max_body_bytes = config.server.max_body_bytes,
        collection = %config.store.collection,
        "gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("shutting down");
        })
        .await?;
    Ok(())
}
