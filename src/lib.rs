pub mod cli;
pub mod commands;
pub mod config;
pub mod error_metrics;
pub mod utils;

pub use error_metrics::{
    Directive, ErrorKind, ErrorMetricsCollector, ErrorMetricsError, ErrorMetricsOptions, MetricsSettings,
};
