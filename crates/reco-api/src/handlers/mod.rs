pub mod formations;
pub mod health;
pub mod offres;
