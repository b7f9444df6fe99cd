//! レコメンド用の行取得（データ取得コラボレータ）
//!
//! 1 リクエストにつきプールから接続を借りて行を読み、返すだけ。
//! エンジンは接続に触れない。カタログ側の取得失敗は「データなし」として
//! 空で返し（warn を出す）、候補者の取得失敗だけは呼び出し元へ伝播させる。

use deadpool_postgres::PoolError;
use tokio_postgres::{Error as PgError, Row};
use tracing::{instrument, warn};

use super::{
    PgPool,
    util::{TimedClientExt, lenient_column},
};
use crate::schema::{
    FormationSnapshot, OffreSnapshot, RawCandidateRow, RawCompetenceRow, RawFormationRow,
    RawOffreRow,
};

#[derive(Debug, thiserror::Error)]
pub enum CatalogFetchError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

const CANDIDATE_SQL: &str = "SELECT id::bigint AS id, location::text AS location \
     FROM candidat WHERE id = $1::bigint";

const CANDIDATE_COMPETENCES_SQL: &str = "SELECT competence.name::text AS name \
     FROM candidat_competences \
     JOIN competence ON candidat_competences.competence_id = competence.id \
     WHERE candidat_competences.candidat_id = $1::bigint";

const OFFRE_COMPETENCE_UNIVERSE_SQL: &str = "SELECT DISTINCT competence.name::text AS name \
     FROM offre_emploi_competence \
     JOIN competence ON offre_emploi_competence.competence_id = competence.id";

const FORMATION_ROWS_SQL: &str = "SELECT formation.id::bigint AS id, \
            formation.titre::text AS titre, \
            formation.description::text AS description, \
            formation.plateforme::text AS plateforme, \
            competence.name::text AS competence \
     FROM formation \
     JOIN formation_competence ON formation.id = formation_competence.formation_id \
     JOIN competence ON formation_competence.competence_id = competence.id \
     ORDER BY formation.id, competence.name";

const OPEN_OFFRES_SQL: &str = "SELECT id::bigint AS id, \
            titre::text AS titre, \
            description::text AS description, \
            experience::text AS experience, \
            localisation::text AS localisation, \
            salaire::text AS salaire \
     FROM offre_emploi \
     WHERE status = 'OPEN' \
     ORDER BY id";

fn competence_row(row: &Row) -> RawCompetenceRow {
    RawCompetenceRow {
        name: lenient_column(row, "name"),
    }
}

#[instrument(skip(pool))]
pub async fn fetch_candidate(
    pool: &PgPool,
    candidate_id: i64,
) -> Result<Option<RawCandidateRow>, CatalogFetchError> {
    let client = pool.get().await?;
    let row = client
        .timed_query_opt_cached(CANDIDATE_SQL, &[&candidate_id], "fetch_candidate")
        .await?;

    Ok(row.map(|row| RawCandidateRow {
        id: lenient_column(&row, "id"),
        location: lenient_column(&row, "location"),
    }))
}

#[instrument(skip(pool))]
pub async fn fetch_candidate_competences(
    pool: &PgPool,
    candidate_id: i64,
) -> Result<Vec<RawCompetenceRow>, CatalogFetchError> {
    let client = pool.get().await?;
    let rows = client
        .timed_query_cached(
            CANDIDATE_COMPETENCES_SQL,
            &[&candidate_id],
            "fetch_candidate_competences",
        )
        .await?;

    Ok(rows.iter().map(competence_row).collect())
}

/// 求人に紐づくスキルの全体集合（DISTINCT）
#[instrument(skip(pool))]
pub async fn fetch_offre_competence_universe(
    pool: &PgPool,
) -> Result<Vec<RawCompetenceRow>, CatalogFetchError> {
    let client = pool.get().await?;
    let rows = client
        .timed_query_cached(
            OFFRE_COMPETENCE_UNIVERSE_SQL,
            &[],
            "fetch_offre_competence_universe",
        )
        .await?;

    Ok(rows.iter().map(competence_row).collect())
}

/// (formation, competence) 単位の行。同じ研修が複数行に分かれる
#[instrument(skip(pool))]
pub async fn fetch_formation_rows(pool: &PgPool) -> Result<Vec<RawFormationRow>, CatalogFetchError> {
    let client = pool.get().await?;
    let rows = client
        .timed_query_cached(FORMATION_ROWS_SQL, &[], "fetch_formation_rows")
        .await?;

    Ok(rows
        .iter()
        .map(|row| RawFormationRow {
            id: lenient_column(row, "id"),
            titre: lenient_column(row, "titre"),
            description: lenient_column(row, "description"),
            plateforme: lenient_column(row, "plateforme"),
            competence: lenient_column(row, "competence"),
        })
        .collect())
}

#[instrument(skip(pool))]
pub async fn fetch_open_offres(pool: &PgPool) -> Result<Vec<RawOffreRow>, CatalogFetchError> {
    let client = pool.get().await?;
    let rows = client
        .timed_query_cached(OPEN_OFFRES_SQL, &[], "fetch_open_offres")
        .await?;

    Ok(rows
        .iter()
        .map(|row| RawOffreRow {
            id: lenient_column(row, "id"),
            titre: lenient_column(row, "titre"),
            description: lenient_column(row, "description"),
            experience: lenient_column(row, "experience"),
            localisation: lenient_column(row, "localisation"),
            salaire: lenient_column(row, "salaire"),
        })
        .collect())
}

fn or_no_data<T>(result: Result<Vec<T>, CatalogFetchError>, source: &'static str) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(source, error = %err, "data source unavailable; treating as no data");
        Vec::new()
    })
}

/// 候補者のスキルが読めないときは、空のプロフィールで採点せずに
/// カタログごと「データなし」にする（エンジンは空リストを返す）
fn formation_snapshot(
    candidate: Option<RawCandidateRow>,
    candidate_competences: Result<Vec<RawCompetenceRow>, CatalogFetchError>,
    universe_competences: Result<Vec<RawCompetenceRow>, CatalogFetchError>,
    formations: Result<Vec<RawFormationRow>, CatalogFetchError>,
) -> FormationSnapshot {
    let candidate_competences = match candidate_competences {
        Ok(rows) => rows,
        Err(err) => {
            warn!(error = %err, "candidate competences unavailable; no formation data");
            return FormationSnapshot {
                candidate,
                ..FormationSnapshot::default()
            };
        }
    };

    FormationSnapshot {
        candidate,
        candidate_competences,
        universe_competences: or_no_data(universe_competences, "offre_competence_universe"),
        formations: or_no_data(formations, "formation_rows"),
    }
}

fn offre_snapshot(
    candidate: Option<RawCandidateRow>,
    candidate_competences: Result<Vec<RawCompetenceRow>, CatalogFetchError>,
    offres: Result<Vec<RawOffreRow>, CatalogFetchError>,
) -> OffreSnapshot {
    let candidate_competences = match candidate_competences {
        Ok(rows) => rows,
        Err(err) => {
            warn!(error = %err, "candidate competences unavailable; no offre data");
            return OffreSnapshot {
                candidate,
                ..OffreSnapshot::default()
            };
        }
    };

    OffreSnapshot {
        candidate,
        candidate_competences,
        offres: or_no_data(offres, "open_offres"),
    }
}

pub async fn fetch_formation_snapshot(
    pool: &PgPool,
    candidate_id: i64,
) -> Result<FormationSnapshot, CatalogFetchError> {
    let candidate = fetch_candidate(pool, candidate_id).await?;
    if candidate.is_none() {
        return Ok(FormationSnapshot::default());
    }

    let competences = fetch_candidate_competences(pool, candidate_id).await;
    if competences.is_err() {
        return Ok(formation_snapshot(candidate, competences, Ok(Vec::new()), Ok(Vec::new())));
    }

    Ok(formation_snapshot(
        candidate,
        competences,
        fetch_offre_competence_universe(pool).await,
        fetch_formation_rows(pool).await,
    ))
}

pub async fn fetch_offre_snapshot(
    pool: &PgPool,
    candidate_id: i64,
) -> Result<OffreSnapshot, CatalogFetchError> {
    let candidate = fetch_candidate(pool, candidate_id).await?;
    if candidate.is_none() {
        return Ok(OffreSnapshot::default());
    }

    let competences = fetch_candidate_competences(pool, candidate_id).await;
    if competences.is_err() {
        return Ok(offre_snapshot(candidate, competences, Ok(Vec::new())));
    }

    Ok(offre_snapshot(
        candidate,
        competences,
        fetch_open_offres(pool).await,
    ))
}
