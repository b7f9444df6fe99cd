pub mod formation_recommendation;
pub mod offre_recommendation;

pub use formation_recommendation::FormationRecommendation;
pub use offre_recommendation::OffreRecommendation;
