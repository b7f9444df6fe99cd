use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use reco_common::api::OffreRecommendation;
use reco_common::db::fetch_offre_snapshot;

use crate::SharedState;
use crate::error::ApiError;

pub async fn recommend_offres(
    State(state): State<SharedState>,
    Path(candidat_id): Path<i64>,
) -> Result<Json<Vec<OffreRecommendation>>, ApiError> {
    let snapshot = fetch_offre_snapshot(&state.pool, candidat_id).await?;
    let recommendations = state.engine.recommend_offres(candidat_id, snapshot)?;

    info!(
        candidat_id,
        served = recommendations.len(),
        "offre recommendations served"
    );

    Ok(Json(recommendations))
}
