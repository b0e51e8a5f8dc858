pub mod edge;
pub mod metrics;
pub mod series;
