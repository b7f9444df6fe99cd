use serde::Serialize;

use crate::{Offre, matching::ScoredItem};

/// 求人レコメンドのレスポンス 1 件（成分スコアは出さない）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffreRecommendation {
    pub id: i64,
    pub titre: String,
    pub description: String,
    pub combined_score: f64,
}

impl From<ScoredItem<Offre>> for OffreRecommendation {
    fn from(scored: ScoredItem<Offre>) -> Self {
        Self {
            id: scored.item.id,
            titre: scored.item.titre,
            description: scored.item.description,
            combined_score: scored.combined,
        }
    }
}
