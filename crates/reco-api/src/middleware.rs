use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{State, connect_info::ConnectInfo},
    http::{HeaderValue, Method, Request, header::CONTENT_TYPE},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::SharedState;
use crate::config::RateLimitConfig;
use crate::error::{self, ApiError};

pub(crate) const REQUEST_ID_HEADER: &str = "x-request-id";

pub type IpRateLimiter =
    RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock, NoOpMiddleware>;

pub fn build_ip_limiter(config: RateLimitConfig) -> Arc<IpRateLimiter> {
    let per_sec = NonZeroU32::new(config.per_sec).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(config.burst).unwrap_or(per_sec);

    Arc::new(RateLimiter::keyed(
        Quota::per_second(per_sec).allow_burst(burst),
    ))
}

/// 接続元 IP ごとに制限する。接続情報がない（テスト等の）リクエストは素通し
fn check_client(limiter: &IpRateLimiter, client: Option<IpAddr>) -> Result<(), ApiError> {
    let Some(ip) = client else {
        return Ok(());
    };

    limiter.check_key(&ip).map_err(|_| {
        warn!(%ip, "rate limit exceeded");
        ApiError::TooManyRequests(format!("rate limit exceeded for {ip}"))
    })
}

pub(crate) async fn rate_limit(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    check_client(&state.rate_limiter, client)?;
    Ok(next.run(req).await)
}

/// `SetRequestIdLayer` が付けた ID をエラーレスポンスから参照できるようにする
pub(crate) async fn request_id_scope(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    error::with_request_id(request_id, next.run(req)).await
}

/// 推薦 API は GET のみ
pub(crate) fn cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "skipping unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_rejects_after_burst() {
        let limiter = build_ip_limiter(RateLimitConfig {
            per_sec: 1,
            burst: 2,
        });
        let ip: IpAddr = [10, 0, 0, 1].into();
        let other: IpAddr = [10, 0, 0, 2].into();

        assert!(check_client(&limiter, Some(ip)).is_ok());
        assert!(check_client(&limiter, Some(ip)).is_ok());
        assert!(matches!(
            check_client(&limiter, Some(ip)),
            Err(ApiError::TooManyRequests(_))
        ));
        assert!(check_client(&limiter, Some(other)).is_ok());
        assert!(check_client(&limiter, None).is_ok());
    }
}
