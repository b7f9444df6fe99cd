use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use reco_common::api::FormationRecommendation;
use reco_common::db::fetch_formation_snapshot;

use crate::SharedState;
use crate::error::ApiError;

/// 候補者の不足スキルを補う研修を関連度順に返す
pub async fn recommend_formations(
    State(state): State<SharedState>,
    Path(candidat_id): Path<i64>,
) -> Result<Json<Vec<FormationRecommendation>>, ApiError> {
    let snapshot = fetch_formation_snapshot(&state.pool, candidat_id).await?;
    let recommendations = state.engine.recommend_formations(candidat_id, snapshot)?;

    info!(
        candidat_id,
        served = recommendations.len(),
        "formation recommendations served"
    );

    Ok(Json(recommendations))
}
