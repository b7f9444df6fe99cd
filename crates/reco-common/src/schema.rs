//! データ取得層から渡される生の行と、エンジン境界での検証。
//!
//! 生の行は全カラムが `Option`。必須カラムが欠けた行は [`RowError`] になり、
//! パイプライン側で除外される（有効な行だけでベストエフォートに採点する）。

use thiserror::Error;

use crate::{Candidate, Offre};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("malformed {table} row: missing {field}")]
    MissingField {
        table: &'static str,
        field: &'static str,
    },
}

fn required<T>(value: Option<T>, table: &'static str, field: &'static str) -> Result<T, RowError> {
    value.ok_or(RowError::MissingField { table, field })
}

/// 空白のみの名前は欠損扱い
fn required_name(
    value: Option<String>,
    table: &'static str,
    field: &'static str,
) -> Result<String, RowError> {
    let name = required(value, table, field)?;
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RowError::MissingField { table, field });
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCandidateRow {
    pub id: Option<i64>,
    pub location: Option<String>,
}

impl TryFrom<RawCandidateRow> for Candidate {
    type Error = RowError;

    fn try_from(row: RawCandidateRow) -> Result<Self, Self::Error> {
        Ok(Candidate {
            id: required(row.id, "candidat", "id")?,
            location: row.location,
        })
    }
}

/// competence テーブル由来の 1 行（name のみ）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCompetenceRow {
    pub name: Option<String>,
}

impl RawCompetenceRow {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    pub fn into_name(self) -> Result<String, RowError> {
        required_name(self.name, "competence", "name")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFormationRow {
    pub id: Option<i64>,
    pub titre: Option<String>,
    pub description: Option<String>,
    pub plateforme: Option<String>,
    pub competence: Option<String>,
}

/// 検証済みの (formation, competence) 行。グルーピング前の単位
#[derive(Debug, Clone, PartialEq)]
pub struct FormationRow {
    pub id: i64,
    pub titre: String,
    pub description: String,
    pub plateforme: String,
    pub competence: String,
}

impl TryFrom<RawFormationRow> for FormationRow {
    type Error = RowError;

    fn try_from(row: RawFormationRow) -> Result<Self, Self::Error> {
        Ok(FormationRow {
            id: required(row.id, "formation", "id")?,
            titre: required(row.titre, "formation", "titre")?,
            description: required(row.description, "formation", "description")?,
            plateforme: required(row.plateforme, "formation", "plateforme")?,
            competence: required_name(row.competence, "formation", "competence")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOffreRow {
    pub id: Option<i64>,
    pub titre: Option<String>,
    pub description: Option<String>,
    pub experience: Option<String>,
    pub localisation: Option<String>,
    pub salaire: Option<String>,
}

impl TryFrom<RawOffreRow> for Offre {
    type Error = RowError;

    fn try_from(row: RawOffreRow) -> Result<Self, Self::Error> {
        Ok(Offre {
            id: required(row.id, "offre_emploi", "id")?,
            titre: required(row.titre, "offre_emploi", "titre")?,
            description: required(row.description, "offre_emploi", "description")?,
            experience: row.experience,
            localisation: row.localisation,
            salaire: row.salaire,
        })
    }
}

/// 研修レコメンド 1 リクエスト分の入力
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormationSnapshot {
    pub candidate: Option<RawCandidateRow>,
    pub candidate_competences: Vec<RawCompetenceRow>,
    /// 求人で使われている全スキル（ギャップ分析の母集合）
    pub universe_competences: Vec<RawCompetenceRow>,
    pub formations: Vec<RawFormationRow>,
}

/// 求人レコメンド 1 リクエスト分の入力
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffreSnapshot {
    pub candidate: Option<RawCandidateRow>,
    pub candidate_competences: Vec<RawCompetenceRow>,
    pub offres: Vec<RawOffreRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formation_row_requires_competence() {
        let row = RawFormationRow {
            id: Some(1),
            titre: Some("SQL avancé".into()),
            description: Some("Requêtes".into()),
            plateforme: Some("Udemy".into()),
            competence: Some("   ".into()),
        };

        assert_eq!(
            FormationRow::try_from(row),
            Err(RowError::MissingField {
                table: "formation",
                field: "competence"
            })
        );
    }

    #[test]
    fn offre_row_keeps_optional_columns() {
        let row = RawOffreRow {
            id: Some(3),
            titre: Some("Data engineer".into()),
            description: Some("Pipelines".into()),
            localisation: None,
            ..RawOffreRow::default()
        };

        let offre = Offre::try_from(row).unwrap();
        assert_eq!(offre.id, 3);
        assert!(offre.localisation.is_none());
    }

    #[test]
    fn offre_row_without_id_is_malformed() {
        let row = RawOffreRow {
            titre: Some("Data engineer".into()),
            description: Some("Pipelines".into()),
            ..RawOffreRow::default()
        };

        let err = Offre::try_from(row).unwrap_err();
        assert_eq!(err.to_string(), "malformed offre_emploi row: missing id");
    }

    #[test]
    fn competence_names_are_trimmed() {
        assert_eq!(
            RawCompetenceRow::named("  SQL ").into_name(),
            Ok("SQL".to_string())
        );
        assert!(RawCompetenceRow::default().into_name().is_err());
    }
}
