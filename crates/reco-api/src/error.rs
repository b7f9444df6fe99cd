use std::future::Future;

use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use reco_common::db::CatalogFetchError;
use reco_common::matching::RecommendationError;

tokio::task_local! {
    static REQUEST_ID: String;
}

/// 現在のリクエスト ID をスコープに載せて `fut` を実行する
pub async fn with_request_id<Fut, T>(request_id: Option<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    match request_id {
        Some(id) => REQUEST_ID.scope(id, fut).await,
        None => fut.await,
    }
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

const PUBLIC_MESSAGE_MAX_CHARS: usize = 200;

/// クライアントに返してよい形に整える。接続文字列やファイルパスは伏せる
fn sanitize_message(message: &str) -> String {
    let redacted: Vec<&str> = message
        .split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|token| !token.is_empty())
        .map(|token| {
            if token.contains("://") {
                "[redacted-url]"
            } else if token.starts_with('/') || token.contains('\\') {
                "[redacted-path]"
            } else {
                token
            }
        })
        .collect();

    if redacted.is_empty() {
        return "unexpected error".to_string();
    }

    let joined = redacted.join(" ");
    if joined.chars().count() <= PUBLIC_MESSAGE_MAX_CHARS {
        return joined;
    }

    let mut shortened: String = joined.chars().take(PUBLIC_MESSAGE_MAX_CHARS).collect();
    shortened.push('…');
    shortened
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("database error: {0}")]
    Database(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("too many requests: {0}")]
    TooManyRequests(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

impl ApiError {
    /// (HTTP ステータス, 機械可読コード)
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::TooManyRequests(_) => (StatusCode::TOO_MANY_REQUESTS, "too_many_requests"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// 404/400 は理由を返す。それ以外は内部事情を漏らさない定型文
    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => sanitize_message(msg),
            ApiError::TooManyRequests(_) => "too many requests".into(),
            ApiError::ServiceUnavailable(_) => "service unavailable".into(),
            ApiError::Database(_) | ApiError::Internal(_) => "internal server error".into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let request_id = current_request_id();
        let request_id_field = request_id.as_deref().unwrap_or("");

        if status.is_server_error() {
            error!(code, %status, request_id = request_id_field, error = %self, "request failed");
        } else {
            warn!(code, %status, request_id = request_id_field, error = %self, "request rejected");
        }

        let body = ErrorBody {
            code,
            message: self.public_message(),
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

impl From<CatalogFetchError> for ApiError {
    fn from(value: CatalogFetchError) -> Self {
        ApiError::Database(value.to_string())
    }
}

impl From<RecommendationError> for ApiError {
    fn from(value: RecommendationError) -> Self {
        match value {
            RecommendationError::MissingCandidate(_) => ApiError::NotFound(value.to_string()),
        }
    }
}
