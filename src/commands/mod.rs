pub mod covariates;
pub mod error_metrics;
