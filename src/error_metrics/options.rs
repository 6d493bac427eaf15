use crate::error_metrics::directive::Directive;
use crate::error_metrics::errors::{ErrorMetricsError, Result};
use crate::error_metrics::metrics;

pub const DEFAULT_PRIOR_Q: u8 = 30;
pub const DEFAULT_LONG_HOMOPOLYMER: usize = 6;
pub const MIN_LONG_HOMOPOLYMER: usize = 2;
pub const MAX_PRIOR_Q: u8 = 99;

/// Run-wide parameters read by stratifiers and metrics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricsSettings {
    pub long_homopolymer: usize,
    pub prior_q: u8,
}

impl MetricsSettings {
    pub fn new(long_homopolymer: usize, prior_q: u8) -> Result<Self> {
        if long_homopolymer < MIN_LONG_HOMOPOLYMER {
            return Err(ErrorMetricsError::InvalidHomopolymerThreshold {
                value: long_homopolymer,
                min: MIN_LONG_HOMOPOLYMER,
            });
        }
        if prior_q == 0 || prior_q > MAX_PRIOR_Q {
            return Err(ErrorMetricsError::InvalidPriorQuality {
                value: prior_q,
                max: MAX_PRIOR_Q,
            });
        }
        Ok(Self {
            long_homopolymer,
            prior_q,
        })
    }

    /// Error probability implied by the prior quality.
    pub fn prior_error(&self) -> f64 {
        metrics::prior_error(self.prior_q)
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            long_homopolymer: DEFAULT_LONG_HOMOPOLYMER,
            prior_q: DEFAULT_PRIOR_Q,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ErrorMetricsOptions {
    pub directives: Vec<Directive>,
    pub settings: MetricsSettings,
    pub min_mapping_quality: u8,
    pub min_base_quality: u8,
    pub max_depth: u32,
    pub max_loci: Option<u64>,
    pub vcf_paths: Vec<String>,
    pub selected_contigs: Option<Vec<String>>,
}

impl ErrorMetricsOptions {
    pub fn new(
        directives: Vec<Directive>,
        settings: MetricsSettings,
        min_mapping_quality: u8,
        min_base_quality: u8,
        max_depth: u32,
    ) -> Self {
        Self {
            directives,
            settings,
            min_mapping_quality,
            min_base_quality,
            max_depth,
            max_loci: None,
            vcf_paths: Vec::new(),
            selected_contigs: None,
        }
    }

    pub fn with_contigs(mut self, contigs: Option<Vec<String>>) -> Self {
        self.selected_contigs = contigs;
        self
    }

    pub fn with_vcfs(mut self, vcf_paths: Vec<String>) -> Self {
        self.vcf_paths = vcf_paths;
        self
    }

    pub fn with_max_loci(mut self, max_loci: Option<u64>) -> Self {
        self.max_loci = max_loci;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prior_error_for_q30() {
        let settings = MetricsSettings::default();
        assert!((settings.prior_error() - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_homopolymer_threshold_must_be_at_least_two() {
        assert!(MetricsSettings::new(2, 30).is_ok());
        assert!(matches!(
            MetricsSettings::new(1, 30),
            Err(ErrorMetricsError::InvalidHomopolymerThreshold { value: 1, min: 2 })
        ));
    }

    #[test]
    fn test_prior_quality_bounds() {
        assert!(MetricsSettings::new(6, 0).is_err());
        assert!(MetricsSettings::new(6, 100).is_err());
        assert!(MetricsSettings::new(6, 99).is_ok());
    }
}
