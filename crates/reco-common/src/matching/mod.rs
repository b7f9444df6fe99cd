pub mod config;
pub mod gap;
pub mod grouping;
pub mod location;
pub mod pipeline;
pub mod ranking;
pub mod similarity;
pub mod text;
pub mod tokenizer;
pub mod weights;

pub use config::RecommendationConfig;
pub use gap::competency_gap;
pub use location::location_similarity;
pub use pipeline::{RecommendationEngine, RecommendationError};
pub use ranking::{ComponentScores, Ranked, ScoredItem, rank};
pub use text::text_relevance;
pub use weights::{FORMATION_WEIGHTS, OFFRE_WEIGHTS, Weights};
