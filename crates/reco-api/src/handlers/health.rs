use std::sync::atomic::Ordering;

use axum::{Json, extract::State};
use serde_json::{Value, json};
use tokio::time::{Duration, timeout};

use reco_common::db::PgPool;

use crate::SharedState;
use crate::error::ApiError;

const DB_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn livez() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// 接続の取得と `SELECT 1` にそれぞれ 1 秒の上限をかける
async fn probe_database(pool: &PgPool) -> Result<(), &'static str> {
    let client = match timeout(DB_PROBE_TIMEOUT, pool.get()).await {
        Err(_) => return Err("db_pool_timeout"),
        Ok(Err(_)) => return Err("db_pool_unavailable"),
        Ok(Ok(client)) => client,
    };

    match timeout(DB_PROBE_TIMEOUT, client.simple_query("SELECT 1")).await {
        Err(_) => Err("db_ping_timeout"),
        Ok(Err(_)) => Err("db_ping_failed"),
        Ok(Ok(_)) => Ok(()),
    }
}

/// `/readyz` と `/health`。シャットダウン開始後は DB を見ずに 503
pub async fn readyz(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    if !state.readiness.load(Ordering::SeqCst) {
        return Err(ApiError::ServiceUnavailable("shutting_down".into()));
    }

    probe_database(&state.pool)
        .await
        .map_err(|reason| ApiError::ServiceUnavailable(reason.into()))?;

    Ok(Json(json!({
        "status": "ok",
        "database": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
