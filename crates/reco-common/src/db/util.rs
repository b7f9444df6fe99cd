#![allow(async_fn_in_trait)]

use std::future::Future;
use std::sync::OnceLock;
use std::time::Instant;

use deadpool_postgres::GenericClient;
use tokio_postgres::types::{FromSql, ToSql};
use tokio_postgres::{Error as PgError, Row};
use tracing::warn;

type Params<'a> = &'a [&'a (dyn ToSql + Sync)];

/// `RECO_DB_LOG_MIN_DURATION_MS` 以上かかったクエリを warn で残す（未設定なら無効）
fn slow_query_threshold_ms() -> Option<u128> {
    static THRESHOLD: OnceLock<Option<u128>> = OnceLock::new();

    *THRESHOLD.get_or_init(|| {
        std::env::var("RECO_DB_LOG_MIN_DURATION_MS")
            .ok()
            .and_then(|raw| parse_threshold(&raw))
    })
}

fn parse_threshold(raw: &str) -> Option<u128> {
    match raw.trim().parse::<u128>() {
        Ok(0) | Err(_) => None,
        Ok(ms) => Some(ms),
    }
}

async fn timed<T>(label: &str, query: impl Future<Output = Result<T, PgError>>) -> Result<T, PgError> {
    let started = Instant::now();
    let result = query.await;

    if let Some(threshold_ms) = slow_query_threshold_ms() {
        let elapsed_ms = started.elapsed().as_millis();
        if elapsed_ms >= threshold_ms {
            warn!(query = label, elapsed_ms = elapsed_ms as u64, ok = result.is_ok(), "slow query");
        }
    }

    result
}

/// prepare_cached を通したクエリに所要時間の計測を付ける
pub trait TimedClientExt: GenericClient {
    async fn timed_query_cached(
        &self,
        sql: &str,
        params: Params<'_>,
        label: &str,
    ) -> Result<Vec<Row>, PgError> {
        timed(label, async {
            let statement = self.prepare_cached(sql).await?;
            self.query(&statement, params).await
        })
        .await
    }

    async fn timed_query_opt_cached(
        &self,
        sql: &str,
        params: Params<'_>,
        label: &str,
    ) -> Result<Option<Row>, PgError> {
        timed(label, async {
            let statement = self.prepare_cached(sql).await?;
            self.query_opt(&statement, params).await
        })
        .await
    }
}

impl<C: GenericClient + ?Sized> TimedClientExt for C {}

/// NULL・カラム欠落・型不一致はすべて None（行の検証はエンジン側で行う）
pub fn lenient_column<'a, T>(row: &'a Row, name: &str) -> Option<T>
where
    T: FromSql<'a>,
{
    row.try_get::<_, Option<T>>(name).ok().flatten()
}
