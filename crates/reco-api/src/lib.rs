use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderName, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use clap::Parser;
use dotenvy::dotenv;
use reco_common::db::{PgPool, create_pool_from_url, create_pool_from_url_checked};
use reco_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use reco_common::matching::{RecommendationConfig, RecommendationEngine};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;

pub use config::{AppConfig, RateLimitConfig};
use error::ApiError;
use handlers::{formations, health, offres};
use middleware::{IpRateLimiter, REQUEST_ID_HEADER, build_ip_limiter};

const MAX_BODY_BYTES: usize = 256 * 1024;
// /readyz が 503 を返し始めてから接続を閉じるまでの猶予
const SHUTDOWN_DRAIN_GRACE: Duration = Duration::from_millis(200);

pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
    pub engine: RecommendationEngine,
    pub rate_limiter: Arc<IpRateLimiter>,
    pub readiness: Arc<AtomicBool>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig, engine: RecommendationEngine) -> Self {
        let rate_limiter = build_ip_limiter(config.rate_limit);
        Self {
            pool,
            config,
            engine,
            rate_limiter,
            readiness: Arc::new(AtomicBool::new(true)),
        }
    }
}

fn recommendation_routes() -> Router<SharedState> {
    Router::new()
        .route(
            "/formations/recommendations/:candidat_id",
            get(formations::recommend_formations),
        )
        .route(
            "/offres/recommendations/:candidat_id",
            get(offres::recommend_offres),
        )
}

pub fn create_router(state: SharedState) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id,
        )
    });

    Router::new()
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .route("/health", get(health::readyz))
        .nest("/api", recommendation_routes())
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit))
        .layer(from_fn(middleware::request_id_scope))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid,
        ))
        .layer(middleware::cors(&state.config.cors_origins))
        .with_state(state)
}

/// DB に接続しない状態（プールは遅延接続）。ルーターのテスト用
pub fn test_state() -> SharedState {
    let config = AppConfig::for_tests();
    let pool =
        create_pool_from_url(&config.database_url).expect("pool should build without connecting");

    Arc::new(AppState::new(
        pool,
        config,
        RecommendationEngine::default(),
    ))
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let config = AppConfig::from_cli(config::Cli::parse(), RateLimitConfig::from_env())?;
    let pool = create_pool_from_url_checked(&config.database_url)
        .await
        .map_err(|err| ApiError::Database(format!("database not reachable at startup: {err}")))?;

    let recommendation = RecommendationConfig::from_env();
    info!(
        offre_limit = recommendation.offre_limit,
        skill_weight = recommendation.offre_weights.skill,
        location_weight = recommendation.offre_weights.location,
        rate_limit_per_sec = config.rate_limit.per_sec,
        rate_limit_burst = config.rate_limit.burst,
        "configuration loaded"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState::new(
        pool,
        config,
        RecommendationEngine::new(recommendation),
    ));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(format!("failed to bind {addr}: {err}")))?;
    info!(%addr, "reco-api listening");

    axum::serve(
        listener,
        create_router(state.clone()).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(wait_for_shutdown(state))
    .await
    .map_err(|err| ApiError::Internal(err.to_string()))
}

async fn wait_for_shutdown(state: SharedState) {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("SIGINT received"),
        _ = terminate => info!("SIGTERM received"),
    }

    state.readiness.store(false, Ordering::SeqCst);
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
    info!("draining connections");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn assigns_request_id_when_client_sends_none() {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn echoes_client_request_id() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/livez")
                    .header(REQUEST_ID_HEADER, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "abc-123");
    }
}
