//! Error types for error-metric collection.

use thiserror::Error;

/// Result type alias for the error-metric engine.
pub type Result<T> = std::result::Result<T, ErrorMetricsError>;

/// Broad class of an [`ErrorMetricsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Detected at startup, before any locus is processed.
    Configuration,
    /// An upstream data contract was violated while processing loci.
    Domain,
}

#[derive(Error, Debug)]
pub enum ErrorMetricsError {
    #[error("Unrecognized error kind '{token}' in directive '{directive}'")]
    UnknownErrorKind { token: String, directive: String },

    #[error("Empty covariate in directive '{directive}'")]
    EmptyCovariate { directive: String },

    #[error("Unknown covariate '{token}' in directive '{directive}'")]
    UnknownCovariate { token: String, directive: String },

    #[error("Covariate '{token}' appears more than once in directive '{directive}'")]
    DuplicateCovariate { token: String, directive: String },

    #[error("Covariate 'ALL' must be the only covariate in directive '{directive}'")]
    AllNotAlone { directive: String },

    #[error("Directive '{directive}' names {count} covariates but at most {max} exist")]
    TooManyCovariates {
        directive: String,
        count: usize,
        max: usize,
    },

    #[error("More than one directive produces the output suffix '{suffix}'")]
    DuplicateSuffix { suffix: String },

    #[error("Invalid long homopolymer threshold {value} (must be at least {min})")]
    InvalidHomopolymerThreshold { value: usize, min: usize },

    #[error("Invalid prior quality {value} (must be between 1 and {max})")]
    InvalidPriorQuality { value: u8, max: u8 },

    #[error("Relative cycle position {value} is outside [0, 1]")]
    RelativePositionOutOfRange { value: f64 },

    #[error(
        "Locus {contig}:{position} is behind the variant window of source '{source_name}' \
         (last queried {last_position})"
    )]
    LocusOutOfOrder {
        source_name: String,
        contig: String,
        position: u32,
        last_position: u32,
    },
}

impl ErrorMetricsError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorMetricsError::RelativePositionOutOfRange { .. }
            | ErrorMetricsError::LocusOutOfOrder { .. } => ErrorClass::Domain,
            _ => ErrorClass::Configuration,
        }
    }
}
