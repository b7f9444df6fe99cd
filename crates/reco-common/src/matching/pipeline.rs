use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, warn};

use super::{
    config::RecommendationConfig,
    gap::competency_gap,
    grouping::{formation_text, group_formation_rows},
    location::optional_location_similarity,
    ranking::{ComponentScores, rank},
    text::text_relevance,
    weights::FORMATION_WEIGHTS,
};
use crate::{
    Candidate, Offre,
    api::{FormationRecommendation, OffreRecommendation},
    schema::{
        FormationRow, FormationSnapshot, OffreSnapshot, RawCandidateRow, RawCompetenceRow, RowError,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecommendationError {
    #[error("candidate {0} not found")]
    MissingCandidate(i64),
}

/// 検証に通った行だけ残す。落とした行は理由付きで warn
fn valid_rows<R, T>(rows: Vec<R>, kind: &'static str) -> Vec<T>
where
    T: TryFrom<R, Error = RowError>,
{
    let total = rows.len();
    let valid: Vec<T> = rows
        .into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(valid) => Some(valid),
            Err(err) => {
                warn!(kind, error = %err, "excluding malformed row from scoring");
                None
            }
        })
        .collect();

    if valid.len() < total {
        debug!(kind, total, excluded = total - valid.len(), "malformed rows excluded");
    }
    valid
}

/// 同じ id の求人は最初の 1 件だけ残す（スコア表は id で引くため）
fn unique_offres(offres: Vec<Offre>) -> Vec<Offre> {
    let mut seen = HashSet::with_capacity(offres.len());
    offres
        .into_iter()
        .filter(|offre| {
            let first = seen.insert(offre.id);
            if !first {
                warn!(offre_id = offre.id, "excluding duplicate offre row");
            }
            first
        })
        .collect()
}

fn competence_names(rows: Vec<RawCompetenceRow>) -> Vec<String> {
    rows.into_iter()
        .filter_map(|row| match row.into_name() {
            Ok(name) => Some(name),
            Err(err) => {
                warn!(error = %err, "excluding malformed competence row");
                None
            }
        })
        .collect()
}

fn require_candidate(
    candidate_id: i64,
    row: Option<RawCandidateRow>,
) -> Result<Candidate, RecommendationError> {
    let Some(row) = row else {
        return Err(RecommendationError::MissingCandidate(candidate_id));
    };

    Candidate::try_from(row).map_err(|err| {
        warn!(candidate_id, error = %err, "candidate row is malformed");
        RecommendationError::MissingCandidate(candidate_id)
    })
}

/// レコメンドエンジン
///
/// 保持するのは不変の設定だけ。TF-IDF モデルは呼び出しごとに作って捨てるので、
/// 同時リクエスト間で共有される可変状態はない。
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: RecommendationConfig,
}

impl RecommendationEngine {
    pub fn new(config: RecommendationConfig) -> Self {
        Self { config }
    }

    /// 不足スキルを補う研修を関連度順に全件返す
    ///
    /// 1. ギャップ分析（求人スキル全体 − 候補者スキル）。空なら空リスト
    /// 2. 不足スキルを含む研修行を id ごとにまとめる
    /// 3. 不足スキルを並べたクエリとの TF-IDF 類似度で並べる（切り詰めなし）
    pub fn recommend_formations(
        &self,
        candidate_id: i64,
        snapshot: FormationSnapshot,
    ) -> Result<Vec<FormationRecommendation>, RecommendationError> {
        let candidate = require_candidate(candidate_id, snapshot.candidate)?;

        let candidate_competences = competence_names(snapshot.candidate_competences);
        let universe = competence_names(snapshot.universe_competences);
        let missing = competency_gap(&candidate_competences, &universe);

        debug!(
            candidate_id = candidate.id,
            held = candidate_competences.len(),
            universe = universe.len(),
            missing = missing.len(),
            "competency gap computed"
        );

        if missing.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<FormationRow> = valid_rows(snapshot.formations, "formation");
        let formations = group_formation_rows(rows, &missing);
        if formations.is_empty() {
            debug!(candidate_id = candidate.id, "no formation covers the gap");
            return Ok(Vec::new());
        }

        let corpus: Vec<String> = formations.iter().map(formation_text).collect();
        let query = missing.iter().cloned().collect::<Vec<_>>().join(" ");
        let relevance = text_relevance(&corpus, &query);

        let scores: HashMap<i64, ComponentScores> = formations
            .iter()
            .zip(relevance)
            .map(|(formation, text)| {
                (
                    formation.id,
                    ComponentScores {
                        text,
                        ..ComponentScores::default()
                    },
                )
            })
            .collect();

        let ranked = rank(formations, &scores, &FORMATION_WEIGHTS, None);

        Ok(ranked.into_iter().map(FormationRecommendation::from).collect())
    }

    /// 公開中の求人をスキル類似度と勤務地の近さで並べ、上位を返す
    pub fn recommend_offres(
        &self,
        candidate_id: i64,
        snapshot: OffreSnapshot,
    ) -> Result<Vec<OffreRecommendation>, RecommendationError> {
        let candidate = require_candidate(candidate_id, snapshot.candidate)?;

        let offres = unique_offres(valid_rows(snapshot.offres, "offre_emploi"));
        if offres.is_empty() {
            debug!(candidate_id = candidate.id, "no open offres to rank");
            return Ok(Vec::new());
        }

        let query = competence_names(snapshot.candidate_competences).join(" ");
        let corpus: Vec<String> = offres.iter().map(offre_text).collect();
        let skill_scores = text_relevance(&corpus, &query);

        let scores: HashMap<i64, ComponentScores> = offres
            .iter()
            .zip(skill_scores)
            .map(|(offre, skill)| {
                let location = optional_location_similarity(
                    candidate.location.as_deref(),
                    offre.localisation.as_deref(),
                );
                (
                    offre.id,
                    ComponentScores {
                        skill,
                        location,
                        ..ComponentScores::default()
                    },
                )
            })
            .collect();

        let ranked = rank(
            offres,
            &scores,
            &self.config.offre_weights,
            Some(self.config.offre_limit),
        );

        debug!(
            candidate_id = candidate.id,
            returned = ranked.len(),
            "offres ranked"
        );

        Ok(ranked.into_iter().map(OffreRecommendation::from).collect())
    }
}

/// 求人 1 件分のテキスト（タイトル・説明・勤務地）
fn offre_text(offre: &Offre) -> String {
    format!(
        "{} {} {}",
        offre.titre,
        offre.description,
        offre.localisation.as_deref().unwrap_or("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawFormationRow, RawOffreRow};

    fn candidate(location: Option<&str>) -> Option<RawCandidateRow> {
        Some(RawCandidateRow {
            id: Some(1),
            location: location.map(str::to_string),
        })
    }

    fn competences(names: &[&str]) -> Vec<RawCompetenceRow> {
        names.iter().map(|n| RawCompetenceRow::named(*n)).collect()
    }

    fn formation_row(id: i64, titre: &str, description: &str, competence: &str) -> RawFormationRow {
        RawFormationRow {
            id: Some(id),
            titre: Some(titre.into()),
            description: Some(description.into()),
            plateforme: Some("Coursera".into()),
            competence: Some(competence.into()),
        }
    }

    fn offre_row(id: i64, titre: &str, description: &str, localisation: &str) -> RawOffreRow {
        RawOffreRow {
            id: Some(id),
            titre: Some(titre.into()),
            description: Some(description.into()),
            localisation: Some(localisation.into()),
            ..RawOffreRow::default()
        }
    }

    #[test]
    fn formations_cover_only_missing_competencies() {
        let engine = RecommendationEngine::default();
        let snapshot = FormationSnapshot {
            candidate: candidate(None),
            candidate_competences: competences(&["Python"]),
            universe_competences: competences(&["Python", "SQL"]),
            formations: vec![
                formation_row(1, "Python avancé", "Décorateurs et générateurs", "Python"),
                formation_row(2, "Introduction", "Premiers pas en base de données", "SQL"),
                formation_row(3, "SQL avancé", "Requêtes SQL et jointures SQL", "SQL"),
                formation_row(3, "SQL avancé", "Requêtes SQL et jointures SQL", "Python"),
            ],
        };

        let result = engine.recommend_formations(1, snapshot).unwrap();

        let ids: Vec<i64> = result.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert!(result.iter().all(|r| r.competences == vec!["SQL".to_string()]));
        assert!(result[0].relevance_score > result[1].relevance_score);
        assert!(result.iter().all(|r| (0.0..=1.0).contains(&r.relevance_score)));
    }

    #[test]
    fn no_gap_means_no_formations() {
        let engine = RecommendationEngine::default();
        let snapshot = FormationSnapshot {
            candidate: candidate(None),
            candidate_competences: competences(&["Python", "SQL"]),
            universe_competences: competences(&["SQL", "Python", "SQL"]),
            formations: vec![formation_row(1, "SQL", "SQL", "SQL")],
        };

        assert!(engine.recommend_formations(1, snapshot).unwrap().is_empty());
    }

    #[test]
    fn formations_are_not_truncated() {
        let engine = RecommendationEngine::default();
        let formations = (1..=8)
            .map(|id| formation_row(id, &format!("Docker {id}"), "Conteneurs", "Docker"))
            .collect();
        let snapshot = FormationSnapshot {
            candidate: candidate(None),
            candidate_competences: vec![],
            universe_competences: competences(&["Docker"]),
            formations,
        };

        assert_eq!(engine.recommend_formations(1, snapshot).unwrap().len(), 8);
    }

    #[test]
    fn malformed_formation_rows_are_skipped() {
        let engine = RecommendationEngine::default();
        let mut broken = formation_row(9, "SQL", "SQL", "SQL");
        broken.plateforme = None;
        let snapshot = FormationSnapshot {
            candidate: candidate(None),
            candidate_competences: vec![RawCompetenceRow { name: None }],
            universe_competences: competences(&["SQL"]),
            formations: vec![broken, formation_row(2, "Bases SQL", "Tables", "SQL")],
        };

        let result = engine.recommend_formations(1, snapshot).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 2);
    }

    #[test]
    fn missing_candidate_is_an_error() {
        let engine = RecommendationEngine::default();

        let err = engine
            .recommend_formations(77, FormationSnapshot::default())
            .unwrap_err();
        assert_eq!(err, RecommendationError::MissingCandidate(77));

        let err = engine
            .recommend_offres(78, OffreSnapshot::default())
            .unwrap_err();
        assert_eq!(err, RecommendationError::MissingCandidate(78));
    }

    #[test]
    fn empty_offre_catalog_returns_empty_list() {
        let engine = RecommendationEngine::default();
        let snapshot = OffreSnapshot {
            candidate: candidate(Some("Casablanca")),
            candidate_competences: competences(&["Rust"]),
            offres: vec![],
        };

        assert_eq!(engine.recommend_offres(1, snapshot), Ok(vec![]));
    }

    #[test]
    fn closer_location_breaks_equal_skill_similarity() {
        let engine = RecommendationEngine::default();
        // タイトル・説明が同じなので、スキル類似度の差は勤務地トークンだけ
        let snapshot = OffreSnapshot {
            candidate: candidate(Some("Casablanca")),
            candidate_competences: competences(&["Java", "Spring"]),
            offres: vec![
                offre_row(1, "Développeur Java", "Spring Boot", "Rabat"),
                offre_row(2, "Développeur Java", "Spring Boot", "Casablanca"),
            ],
        };

        let result = engine.recommend_offres(1, snapshot).unwrap();

        assert_eq!(result[0].id, 2);
        assert!(result[0].combined_score > result[1].combined_score);
    }

    #[test]
    fn offres_are_truncated_to_configured_limit() {
        let engine = RecommendationEngine::default();
        let offres = (1..=9)
            .map(|id| offre_row(id, "Développeur", "Python", "Lyon"))
            .collect();
        let snapshot = OffreSnapshot {
            candidate: candidate(Some("Lyon")),
            candidate_competences: competences(&["Python"]),
            offres,
        };

        let result = engine.recommend_offres(1, snapshot).unwrap();

        assert_eq!(result.len(), 5);
        // 全件同点なので入力順のまま
        let ids: Vec<i64> = result.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn duplicate_offre_ids_are_ranked_once() {
        let engine = RecommendationEngine::default();
        let snapshot = OffreSnapshot {
            candidate: candidate(Some("Lyon")),
            candidate_competences: competences(&["Python"]),
            offres: vec![
                offre_row(4, "Développeur Python", "Django", "Lyon"),
                offre_row(4, "Comptable", "Bilans", "Lille"),
                offre_row(5, "Comptable", "Bilans", "Lille"),
            ],
        };

        let result = engine.recommend_offres(1, snapshot).unwrap();

        let ids: Vec<i64> = result.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 5]);
        assert_eq!(result[0].titre, "Développeur Python");
        assert!(result[0].combined_score > result[1].combined_score);
    }

    #[test]
    fn perfect_offre_scores_exactly_one() {
        let engine = RecommendationEngine::default();
        let snapshot = OffreSnapshot {
            candidate: candidate(Some("Paris")),
            candidate_competences: competences(&["Rust", "Paris"]),
            offres: vec![offre_row(1, "Rust", "", "Paris")],
        };

        let result = engine.recommend_offres(1, snapshot).unwrap();

        assert!((result[0].combined_score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn candidate_without_location_gets_no_location_credit() {
        let engine = RecommendationEngine::default();
        let snapshot = OffreSnapshot {
            candidate: candidate(None),
            candidate_competences: competences(&["Kotlin"]),
            offres: vec![offre_row(1, "Kotlin", "", "Paris")],
        };

        let result = engine.recommend_offres(1, snapshot).unwrap();

        assert!(result[0].combined_score <= 0.7 + 1e-12);
    }
}
