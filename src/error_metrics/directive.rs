use crate::error_metrics::errors::{ErrorMetricsError, Result};
use crate::error_metrics::stratifiers::Stratifier;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Token selecting a single, unstratified accumulator.
pub const ALL_TOKEN: &str = "ALL";

pub const DEFAULT_DIRECTIVES: &[&str] = &[
    "ERROR",
    "ERROR:BASE_QUALITY",
    "ERROR:INSERT_LENGTH",
    "ERROR:GC_CONTENT",
    "ERROR:READ_DIRECTION",
    "ERROR:PAIR_ORIENTATION",
    "ERROR:HOMOPOLYMER",
    "ERROR:BINNED_HOMOPOLYMER",
    "ERROR:CYCLE",
    "ERROR:READ_ORDINALITY",
    "ERROR:READ_ORDINALITY:CYCLE",
    "ERROR:READ_ORDINALITY:HOMOPOLYMER",
    "ERROR:READ_ORDINALITY:GC_CONTENT",
    "ERROR:READ_ORDINALITY:PRE_DINUC",
    "ERROR:MAPPING_QUALITY",
    "ERROR:READ_GROUP",
    "ERROR:MISMATCHES_IN_READ",
    "ERROR:ONE_BASE_PADDED_CONTEXT",
    "OVERLAPPING_ERROR",
    "OVERLAPPING_ERROR:BASE_QUALITY",
    "OVERLAPPING_ERROR:INSERT_LENGTH",
    "OVERLAPPING_ERROR:READ_ORDINALITY",
    "OVERLAPPING_ERROR:READ_ORDINALITY:CYCLE",
    "OVERLAPPING_ERROR:READ_ORDINALITY:HOMOPOLYMER",
    "OVERLAPPING_ERROR:READ_ORDINALITY:GC_CONTENT",
    "INDEL_ERROR",
    "INDEL_ERROR:INDEL_LENGTH",
];

/// Which accumulator a directive feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Error,
    OverlappingError,
    IndelError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 3] = [ErrorKind::Error, ErrorKind::OverlappingError, ErrorKind::IndelError];

    pub fn token(&self) -> &'static str {
        match self {
            ErrorKind::Error => "ERROR",
            ErrorKind::OverlappingError => "OVERLAPPING_ERROR",
            ErrorKind::IndelError => "INDEL_ERROR",
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            ErrorKind::Error => "error",
            ErrorKind::OverlappingError => "overlapping_error",
            ErrorKind::IndelError => "indel_error",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.token() == token)
    }
}

/// A parsed `KIND[:COVARIATE...]` request.
///
/// An empty stratifier list is the `ALL` stratification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: ErrorKind,
    pub stratifiers: Vec<Stratifier>,
}

impl Directive {
    pub fn new(kind: ErrorKind, stratifiers: Vec<Stratifier>) -> Self {
        Self { kind, stratifiers }
    }

    /// Output suffix, e.g. `error_by_cycle_and_read_ordinality`.
    pub fn suffix(&self) -> String {
        if self.stratifiers.is_empty() {
            return format!("{}_by_all", self.kind.suffix());
        }
        let covariates: Vec<&str> = self.stratifiers.iter().map(|s| s.suffix()).collect();
        format!("{}_by_{}", self.kind.suffix(), covariates.join("_and_"))
    }

    pub fn is_all(&self) -> bool {
        self.stratifiers.is_empty()
    }

    pub fn defaults() -> Result<Vec<Directive>> {
        parse_directives(DEFAULT_DIRECTIVES.iter().copied())
    }
}

impl FromStr for Directive {
    type Err = ErrorMetricsError;

    fn from_str(directive: &str) -> Result<Self> {
        let tokens: Vec<&str> = directive.split(':').map(str::trim).collect();
        let kind = ErrorKind::from_token(tokens[0]).ok_or_else(|| ErrorMetricsError::UnknownErrorKind {
            token: tokens[0].to_string(),
            directive: directive.to_string(),
        })?;

        let covariates = &tokens[1..];
        let max = Stratifier::ALL.len() + 1;
        if covariates.len() > max {
            return Err(ErrorMetricsError::TooManyCovariates {
                directive: directive.to_string(),
                count: covariates.len(),
                max,
            });
        }

        let mut stratifiers = Vec::with_capacity(covariates.len());
        let mut saw_all = false;
        for &token in covariates {
            if token.is_empty() {
                return Err(ErrorMetricsError::EmptyCovariate {
                    directive: directive.to_string(),
                });
            }
            if token == ALL_TOKEN {
                if saw_all {
                    return Err(ErrorMetricsError::DuplicateCovariate {
                        token: token.to_string(),
                        directive: directive.to_string(),
                    });
                }
                saw_all = true;
                continue;
            }
            let stratifier = Stratifier::from_token(token).ok_or_else(|| ErrorMetricsError::UnknownCovariate {
                token: token.to_string(),
                directive: directive.to_string(),
            })?;
            if stratifiers.contains(&stratifier) {
                return Err(ErrorMetricsError::DuplicateCovariate {
                    token: token.to_string(),
                    directive: directive.to_string(),
                });
            }
            stratifiers.push(stratifier);
        }

        if saw_all && !stratifiers.is_empty() {
            return Err(ErrorMetricsError::AllNotAlone {
                directive: directive.to_string(),
            });
        }

        Ok(Directive::new(kind, stratifiers))
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.token())?;
        if self.stratifiers.is_empty() {
            return write!(f, ":{}", ALL_TOKEN);
        }
        for stratifier in &self.stratifiers {
            write!(f, ":{}", stratifier.token())?;
        }
        Ok(())
    }
}

/// Parses every directive and rejects runs where two of them would write the
/// same output file.
pub fn parse_directives<'a, I>(directives: I) -> Result<Vec<Directive>>
where
    I: IntoIterator<Item = &'a str>,
{
    let parsed = directives
        .into_iter()
        .map(Directive::from_str)
        .collect::<Result<Vec<_>>>()?;
    check_suffix_namespace()?;
    check_distinct_suffixes(&parsed)?;
    Ok(parsed)
}

/// Every kind by `ALL`, by each stratifier and by each ordered pair of
/// stratifiers must map to its own output suffix.
pub fn check_suffix_namespace() -> Result<()> {
    let mut seen = HashSet::new();
    for kind in ErrorKind::ALL {
        let mut candidates = vec![Directive::new(kind, Vec::new())];
        for first in Stratifier::ALL {
            candidates.push(Directive::new(kind, vec![first]));
            for second in Stratifier::ALL {
                if second != first {
                    candidates.push(Directive::new(kind, vec![first, second]));
                }
            }
        }
        for directive in candidates {
            let suffix = directive.suffix();
            if !seen.insert(suffix.clone()) {
                return Err(ErrorMetricsError::DuplicateSuffix { suffix });
            }
        }
    }
    Ok(())
}

pub fn check_distinct_suffixes(directives: &[Directive]) -> Result<()> {
    let mut seen = HashSet::new();
    for directive in directives {
        let suffix = directive.suffix();
        if !seen.insert(suffix.clone()) {
            return Err(ErrorMetricsError::DuplicateSuffix { suffix });
        }
    }
    Ok(())
}
