//! Per-covariate accumulators and the calibrated error-rate transform.

use crate::error_metrics::types::{ErrorEvent, MateAgreement};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Error probability of a Phred-scaled quality.
pub fn prior_error(prior_q: u8) -> f64 {
    10f64.powf(-(prior_q as f64) / 10.0)
}

/// `(events + prior) / (opportunities + 1)`, never zero for a positive prior.
pub fn calibrated_rate(events: u64, opportunities: u64, prior: f64) -> f64 {
    (events as f64 + prior) / (opportunities as f64 + 1.0)
}

pub fn phred_score(rate: f64) -> f64 {
    -10.0 * rate.log10()
}

pub fn log10_odds(rate: f64) -> f64 {
    (rate / (1.0 - rate)).log10()
}

/// An accumulator of error counts for one covariate value.
///
/// Derived fields are only ever written by `calculate_derived_fields`.
pub trait ErrorMetric: Debug + Clone + PartialEq + Serialize {
    /// Name used in logs and report headers.
    fn metric_name() -> &'static str;

    fn new(covariate: String) -> Self;

    /// Whether this accumulator counts `event` at all.
    fn accepts(event: &ErrorEvent) -> bool;

    fn add(&mut self, event: &ErrorEvent);

    /// Fills the rate fields, blending in `prior` as one pseudo-observation.
    fn calculate_derived_fields(&mut self, prior: f64);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseErrorMetric {
    pub covariate: String,
    pub total_bases: u64,
    pub error_bases: u64,
    pub error_rate: f64,
    pub q_score: f64,
    pub log10_odds: f64,
}

impl ErrorMetric for BaseErrorMetric {
    fn metric_name() -> &'static str {
        "base error"
    }

    fn new(covariate: String) -> Self {
        Self {
            covariate,
            total_bases: 0,
            error_bases: 0,
            error_rate: 0.0,
            q_score: 0.0,
            log10_odds: 0.0,
        }
    }

    fn accepts(event: &ErrorEvent) -> bool {
        matches!(event, ErrorEvent::Base { .. })
    }

    fn add(&mut self, event: &ErrorEvent) {
        if let ErrorEvent::Base { is_error, .. } = event {
            self.total_bases += 1;
            if *is_error {
                self.error_bases += 1;
            }
        }
    }

    fn calculate_derived_fields(&mut self, prior: f64) {
        let rate = calibrated_rate(self.error_bases, self.total_bases, prior);
        self.error_rate = rate;
        self.q_score = phred_score(rate);
        self.log10_odds = log10_odds(rate);
    }
}

/// Insertion and deletion counts. Each indel is charged once per read, at
/// its anchor locus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndelErrorMetric {
    pub covariate: String,
    pub total_bases: u64,
    pub num_insertions: u64,
    pub num_inserted_bases: u64,
    pub num_deletions: u64,
    pub num_deleted_bases: u64,
    pub insertions_q: f64,
    pub deletions_q: f64,
}

impl ErrorMetric for IndelErrorMetric {
    fn metric_name() -> &'static str {
        "indel error"
    }

    fn new(covariate: String) -> Self {
        Self {
            covariate,
            total_bases: 0,
            num_insertions: 0,
            num_inserted_bases: 0,
            num_deletions: 0,
            num_deleted_bases: 0,
            insertions_q: 0.0,
            deletions_q: 0.0,
        }
    }

    fn accepts(_event: &ErrorEvent) -> bool {
        true
    }

    fn add(&mut self, event: &ErrorEvent) {
        match *event {
            ErrorEvent::Base { .. } => self.total_bases += 1,
            ErrorEvent::Insertion { length } => {
                self.total_bases += length as u64;
                self.num_insertions += 1;
                self.num_inserted_bases += length as u64;
            }
            ErrorEvent::Deletion { length } => {
                self.num_deletions += 1;
                self.num_deleted_bases += length as u64;
            }
        }
    }

    fn calculate_derived_fields(&mut self, prior: f64) {
        self.insertions_q = phred_score(calibrated_rate(self.num_insertions, self.total_bases, prior));
        self.deletions_q = phred_score(calibrated_rate(self.num_deletions, self.total_bases, prior));
    }
}

/// Agreement between overlapping mate bases and the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlappingErrorMetric {
    pub covariate: String,
    pub total_bases: u64,
    pub num_bases_with_overlapping_reads: u64,
    pub num_disagrees_with_reference_only: u64,
    pub num_disagrees_with_ref_and_mate: u64,
    pub num_three_ways_disagreement: u64,
    pub disagrees_with_ref_only_q: f64,
    pub disagrees_with_ref_and_mate_q: f64,
    pub three_ways_disagreement_q: f64,
}

impl ErrorMetric for OverlappingErrorMetric {
    fn metric_name() -> &'static str {
        "overlapping error"
    }

    fn new(covariate: String) -> Self {
        Self {
            covariate,
            total_bases: 0,
            num_bases_with_overlapping_reads: 0,
            num_disagrees_with_reference_only: 0,
            num_disagrees_with_ref_and_mate: 0,
            num_three_ways_disagreement: 0,
            disagrees_with_ref_only_q: 0.0,
            disagrees_with_ref_and_mate_q: 0.0,
            three_ways_disagreement_q: 0.0,
        }
    }

    fn accepts(event: &ErrorEvent) -> bool {
        matches!(event, ErrorEvent::Base { .. })
    }

    fn add(&mut self, event: &ErrorEvent) {
        let ErrorEvent::Base { overlap, .. } = event else {
            return;
        };
        self.total_bases += 1;
        let Some(agreement) = overlap else {
            return;
        };
        self.num_bases_with_overlapping_reads += 1;
        match agreement {
            MateAgreement::AgreesWithReference => {}
            MateAgreement::DisagreesWithReferenceOnly => self.num_disagrees_with_reference_only += 1,
            MateAgreement::DisagreesWithReferenceAndMate => self.num_disagrees_with_ref_and_mate += 1,
            MateAgreement::ThreeWayDisagreement => self.num_three_ways_disagreement += 1,
        }
    }

    fn calculate_derived_fields(&mut self, prior: f64) {
        let overlapping = self.num_bases_with_overlapping_reads;
        self.disagrees_with_ref_only_q =
            phred_score(calibrated_rate(self.num_disagrees_with_reference_only, overlapping, prior));
        self.disagrees_with_ref_and_mate_q =
            phred_score(calibrated_rate(self.num_disagrees_with_ref_and_mate, overlapping, prior));
        self.three_ways_disagreement_q =
            phred_score(calibrated_rate(self.num_three_ways_disagreement, overlapping, prior));
    }
}
