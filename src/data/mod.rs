pub mod models;
pub mod normalizer;
