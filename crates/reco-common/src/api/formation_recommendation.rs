use serde::Serialize;

use crate::{Formation, matching::ScoredItem};

/// 研修レコメンドのレスポンス 1 件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormationRecommendation {
    pub id: i64,
    pub titre: String,
    pub description: String,
    pub plateforme: String,
    /// この研修でカバーできる不足スキル
    #[serde(rename = "competence")]
    pub competences: Vec<String>,
    /// テキスト関連度（同一リクエスト内でのみ比較可能）
    pub relevance_score: f64,
}

impl From<ScoredItem<Formation>> for FormationRecommendation {
    fn from(scored: ScoredItem<Formation>) -> Self {
        let formation = scored.item;
        Self {
            id: formation.id,
            titre: formation.titre,
            description: formation.description,
            plateforme: formation.plateforme,
            competences: formation.competences,
            relevance_score: scored.combined,
        }
    }
}
