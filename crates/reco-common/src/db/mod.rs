pub mod catalog;
pub mod pool;
pub mod util;

pub use catalog::{
    CatalogFetchError, fetch_candidate, fetch_candidate_competences, fetch_formation_rows,
    fetch_formation_snapshot, fetch_offre_competence_universe, fetch_offre_snapshot,
    fetch_open_offres,
};
pub use pool::{DbPoolError, PgPool, create_pool_from_url, create_pool_from_url_checked};
