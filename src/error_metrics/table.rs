use crate::error_metrics::covariate::CompositeKey;
use crate::error_metrics::directive::{check_distinct_suffixes, Directive, ErrorKind};
use crate::error_metrics::errors::Result;
use crate::error_metrics::indel::{observations_at, IndelLedger};
use crate::error_metrics::metrics::{BaseErrorMetric, ErrorMetric, IndelErrorMetric, OverlappingErrorMetric};
use crate::error_metrics::options::MetricsSettings;
use crate::error_metrics::read::{read_key, AlignedRead, ReadContext};
use crate::error_metrics::stratifiers::ObservedBase;
use crate::error_metrics::types::{
    AlignmentType, ErrorEvent, LocusContext, MateAgreement, ReadKey, ReadObservation,
};
use log::debug;
use std::collections::HashMap;

/// Accumulators for one directive, keyed by covariate values.
#[derive(Debug, Clone)]
pub struct StratifiedMetricsTable<M: ErrorMetric> {
    directive: Directive,
    metrics: HashMap<CompositeKey, M>,
}

impl<M: ErrorMetric> StratifiedMetricsTable<M> {
    pub fn new(directive: Directive) -> Self {
        Self {
            directive,
            metrics: HashMap::new(),
        }
    }

    pub fn directive(&self) -> &Directive {
        &self.directive
    }

    /// Counts `event` under the key `base` classifies to. Events the metric
    /// does not accept, or bases a stratifier cannot label, are dropped
    /// without creating an accumulator.
    pub fn add(&mut self, base: &ObservedBase, event: &ErrorEvent, settings: &MetricsSettings) -> Result<()> {
        if !M::accepts(event) {
            return Ok(());
        }
        let Some(key) = CompositeKey::build(&self.directive.stratifiers, base, settings)? else {
            return Ok(());
        };
        self.metrics
            .entry(key)
            .or_insert_with_key(|key| M::new(key.to_string()))
            .add(event);
        Ok(())
    }

    pub fn get(&self, key: &CompositeKey) -> Option<&M> {
        self.metrics.get(key)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Finalizes every accumulator and returns them in key order.
    pub fn drain(self, prior: f64) -> Vec<M> {
        let mut entries: Vec<(CompositeKey, M)> = self.metrics.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
            .into_iter()
            .map(|(_, mut metric)| {
                metric.calculate_derived_fields(prior);
                metric
            })
            .collect()
    }
}

/// A table of whichever metric type the directive's kind calls for.
#[derive(Debug, Clone)]
pub enum DirectiveTable {
    Error(StratifiedMetricsTable<BaseErrorMetric>),
    Overlapping(StratifiedMetricsTable<OverlappingErrorMetric>),
    Indel(StratifiedMetricsTable<IndelErrorMetric>),
}

impl DirectiveTable {
    pub fn new(directive: Directive) -> Self {
        match directive.kind {
            ErrorKind::Error => DirectiveTable::Error(StratifiedMetricsTable::new(directive)),
            ErrorKind::OverlappingError => DirectiveTable::Overlapping(StratifiedMetricsTable::new(directive)),
            ErrorKind::IndelError => DirectiveTable::Indel(StratifiedMetricsTable::new(directive)),
        }
    }

    pub fn directive(&self) -> &Directive {
        match self {
            DirectiveTable::Error(t) => t.directive(),
            DirectiveTable::Overlapping(t) => t.directive(),
            DirectiveTable::Indel(t) => t.directive(),
        }
    }

    pub fn add(&mut self, base: &ObservedBase, event: &ErrorEvent, settings: &MetricsSettings) -> Result<()> {
        match self {
            DirectiveTable::Error(t) => t.add(base, event, settings),
            DirectiveTable::Overlapping(t) => t.add(base, event, settings),
            DirectiveTable::Indel(t) => t.add(base, event, settings),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DirectiveTable::Error(t) => t.len(),
            DirectiveTable::Overlapping(t) => t.len(),
            DirectiveTable::Indel(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn finish(self, prior: f64) -> DirectiveMetrics {
        match self {
            DirectiveTable::Error(t) => DirectiveMetrics {
                directive: t.directive().clone(),
                rows: MetricRows::Error(t.drain(prior)),
            },
            DirectiveTable::Overlapping(t) => DirectiveMetrics {
                directive: t.directive().clone(),
                rows: MetricRows::Overlapping(t.drain(prior)),
            },
            DirectiveTable::Indel(t) => DirectiveMetrics {
                directive: t.directive().clone(),
                rows: MetricRows::Indel(t.drain(prior)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricRows {
    Error(Vec<BaseErrorMetric>),
    Overlapping(Vec<OverlappingErrorMetric>),
    Indel(Vec<IndelErrorMetric>),
}

impl MetricRows {
    pub fn len(&self) -> usize {
        match self {
            MetricRows::Error(rows) => rows.len(),
            MetricRows::Overlapping(rows) => rows.len(),
            MetricRows::Indel(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The finished table of one directive.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveMetrics {
    pub directive: Directive,
    pub rows: MetricRows,
}

impl DirectiveMetrics {
    pub fn suffix(&self) -> String {
        self.directive.suffix()
    }
}

/// One countable observation awaiting classification.
struct PendingEvent {
    key: ReadKey,
    observation: ReadObservation,
    event: ErrorEvent,
}

/// Feeds locus-ordered pileups into every directive's table.
pub struct ErrorMetricsCollector {
    settings: MetricsSettings,
    min_base_quality: u8,
    tables: Vec<DirectiveTable>,
    read_contexts: HashMap<ReadKey, ReadContext>,
    ledger: IndelLedger,
    contig: Option<String>,
    loci_processed: u64,
}

impl ErrorMetricsCollector {
    pub fn new(directives: &[Directive], settings: MetricsSettings, min_base_quality: u8) -> Result<Self> {
        check_distinct_suffixes(directives)?;
        Ok(Self {
            settings,
            min_base_quality,
            tables: directives.iter().cloned().map(DirectiveTable::new).collect(),
            read_contexts: HashMap::new(),
            ledger: IndelLedger::new(),
            contig: None,
            loci_processed: 0,
        })
    }

    pub fn tables(&self) -> &[DirectiveTable] {
        &self.tables
    }

    pub fn loci_processed(&self) -> u64 {
        self.loci_processed
    }

    /// Counts every read covering `locus`.
    ///
    /// `reference` is the whole contig the locus sits on. Loci must arrive in
    /// increasing position order within a contig.
    pub fn process_locus<R: AlignedRead>(
        &mut self,
        locus: &LocusContext,
        reference: &[u8],
        reads: &[R],
    ) -> Result<()> {
        if self.contig.as_deref() != Some(locus.contig) {
            self.read_contexts.clear();
            self.ledger = IndelLedger::new();
            self.contig = Some(locus.contig.to_string());
        }
        let position = locus.position;
        self.read_contexts.retain(|_, ctx| ctx.alignment_end >= position);
        self.ledger.retire_before(position);

        let mut pending = Vec::new();
        for read in reads {
            let key = read_key(read);
            if !self.read_contexts.contains_key(&key) {
                let ctx = ReadContext::new(read, reference);
                self.ledger.track(&key, ctx.alignment_end);
                self.read_contexts.insert(key.clone(), ctx);
            }
            let Some(ctx) = self.read_contexts.get(&key) else {
                continue;
            };

            for observation in observations_at(&ctx.cigar, ctx.alignment_start, position) {
                let event = match observation.alignment {
                    AlignmentType::Match => {
                        let Some(&read_base) = ctx.bases.get(observation.offset) else {
                            continue;
                        };
                        let quality = ctx.qualities.get(observation.offset).copied().unwrap_or(0);
                        if read_base == b'N' || locus.reference_base == b'N' || quality < self.min_base_quality {
                            continue;
                        }
                        ErrorEvent::Base {
                            is_error: read_base != locus.reference_base,
                            overlap: None,
                        }
                    }
                    AlignmentType::Deletion => {
                        let run_start = observation.deletion_start.unwrap_or(position);
                        if self.ledger.process_deletion_locus(&key, run_start, position) {
                            continue;
                        }
                        ErrorEvent::Deletion {
                            length: observation.indel_length,
                        }
                    }
                    AlignmentType::Insertion => {
                        if !self.ledger.charge_insertion(&key, position) {
                            continue;
                        }
                        ErrorEvent::Insertion {
                            length: observation.indel_length,
                        }
                    }
                };
                pending.push(PendingEvent {
                    key: key.clone(),
                    observation,
                    event,
                });
            }
        }

        self.resolve_overlaps(locus, &mut pending);

        for item in &pending {
            let Some(ctx) = self.read_contexts.get(&item.key) else {
                continue;
            };
            let base = ObservedBase::new(ctx, locus, item.observation);
            for table in self.tables.iter_mut() {
                table.add(&base, &item.event, &self.settings)?;
            }
        }
        self.loci_processed += 1;
        Ok(())
    }

    /// Marks counted bases whose mate also has a counted base here.
    fn resolve_overlaps(&self, locus: &LocusContext, pending: &mut [PendingEvent]) {
        let mut by_name: HashMap<&[u8], Vec<usize>> = HashMap::new();
        for (index, item) in pending.iter().enumerate() {
            if matches!(item.event, ErrorEvent::Base { .. }) {
                by_name.entry(item.key.name.as_slice()).or_default().push(index);
            }
        }

        let mut agreements = Vec::new();
        for indices in by_name.values() {
            let [first, second] = indices.as_slice() else {
                continue;
            };
            let (Some(first_base), Some(second_base)) = (self.base_of(&pending[*first]), self.base_of(&pending[*second]))
            else {
                continue;
            };
            agreements.push((*first, MateAgreement::classify(first_base, second_base, locus.reference_base)));
            agreements.push((*second, MateAgreement::classify(second_base, first_base, locus.reference_base)));
        }

        for (index, agreement) in agreements {
            if let ErrorEvent::Base { overlap, .. } = &mut pending[index].event {
                *overlap = Some(agreement);
            }
        }
    }

    fn base_of(&self, item: &PendingEvent) -> Option<u8> {
        self.read_contexts
            .get(&item.key)
            .and_then(|ctx| ctx.bases.get(item.observation.offset).copied())
    }

    /// Finalizes every table in directive order.
    pub fn finish(self) -> Vec<DirectiveMetrics> {
        debug!("Finishing {} tables after {} loci", self.tables.len(), self.loci_processed);
        let prior = self.settings.prior_error();
        self.tables.into_iter().map(|t| t.finish(prior)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_htslib::bam;
    use rust_htslib::bam::record::CigarString;

    fn record(name: &[u8], cigar: &str, seq: &[u8], pos: i64) -> bam::Record {
        let mut record = bam::Record::new();
        let cigar = CigarString::try_from(cigar).unwrap();
        let qual = vec![30u8; seq.len()];
        record.set(name, Some(&cigar), seq, &qual);
        record.set_pos(pos);
        record.set_mapq(60);
        record
    }

    fn directives(tokens: &[&str]) -> Vec<Directive> {
        tokens.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn run(collector: &mut ErrorMetricsCollector, reference: &[u8], reads: &[bam::Record]) {
        for position in 0..reference.len() as u32 {
            let locus = LocusContext::new("chr1", position, reference[position as usize]);
            let covering: Vec<bam::Record> = reads
                .iter()
                .filter(|r| {
                    let ctx = ReadContext::new(*r, reference);
                    ctx.alignment_start <= position && position <= ctx.alignment_end
                })
                .cloned()
                .collect();
            collector.process_locus(&locus, reference, &covering).unwrap();
        }
    }

    #[test]
    fn test_base_errors_by_read_base() {
        let reference = b"ACGTACGTAC";
        let reads = vec![record(b"r1", "10M", b"ACGTACGTAA", 0)];
        let mut collector =
            ErrorMetricsCollector::new(&directives(&["ERROR", "ERROR:READ_BASE"]), MetricsSettings::default(), 20)
                .unwrap();
        run(&mut collector, reference, &reads);

        let finished = collector.finish();
        let MetricRows::Error(all) = &finished[0].rows else {
            panic!("expected base error rows");
        };
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].covariate, "all");
        assert_eq!(all[0].total_bases, 10);
        assert_eq!(all[0].error_bases, 1);

        let MetricRows::Error(by_base) = &finished[1].rows else {
            panic!("expected base error rows");
        };
        let labels: Vec<&str> = by_base.iter().map(|m| m.covariate.as_str()).collect();
        assert_eq!(labels, vec!["A", "C", "G", "T"]);
        assert_eq!(by_base[0].total_bases, 4);
        assert_eq!(by_base[0].error_bases, 1);
    }

    #[test]
    fn test_low_quality_and_no_call_bases_skipped() {
        let reference = b"ACGTN";
        let mut low = record(b"r1", "5M", b"ANGTA", 0);
        let mut qual = low.qual().to_vec();
        qual[3] = 5;
        let cigar = CigarString::try_from("5M").unwrap();
        low.set(b"r1", Some(&cigar), b"ANGTA", &qual);
        let mut collector =
            ErrorMetricsCollector::new(&directives(&["ERROR"]), MetricsSettings::default(), 20).unwrap();
        run(&mut collector, reference, &[low]);

        let finished = collector.finish();
        let MetricRows::Error(rows) = &finished[0].rows else {
            panic!("expected base error rows");
        };
        // A and G survive; N read base, low quality T and N reference are dropped
        assert_eq!(rows[0].total_bases, 2);
        assert_eq!(rows[0].error_bases, 0);
    }

    #[test]
    fn test_overlapping_mates() {
        let reference = b"AAAAAAAAAA";
        let mut first = record(b"pair", "6M", b"AAAACA", 0);
        first.set_paired();
        first.set_first_in_template();
        let mut second = record(b"pair", "6M", b"CAGAAA", 4);
        second.set_paired();
        second.set_last_in_template();
        second.set_reverse();

        let mut collector =
            ErrorMetricsCollector::new(&directives(&["OVERLAPPING_ERROR"]), MetricsSettings::default(), 20)
                .unwrap();
        run(&mut collector, reference, &[first, second]);

        let finished = collector.finish();
        let MetricRows::Overlapping(rows) = &finished[0].rows else {
            panic!("expected overlapping rows");
        };
        assert_eq!(rows[0].total_bases, 12);
        // loci 4 and 5 are covered by both mates
        assert_eq!(rows[0].num_bases_with_overlapping_reads, 4);
        // locus 4: C vs C, locus 5: A vs A
        assert_eq!(rows[0].num_disagrees_with_reference_only, 2);
        assert_eq!(rows[0].num_disagrees_with_ref_and_mate, 0);
    }

    #[test]
    fn test_deletion_with_skipped_locus_counted_once() {
        let reference = b"ACGTACGTACGTA";
        let read = record(b"r1", "5M3D5M", b"ACGTAACGTA", 0);
        let mut collector =
            ErrorMetricsCollector::new(&directives(&["INDEL_ERROR"]), MetricsSettings::default(), 20).unwrap();
        for position in 0..reference.len() as u32 {
            // the middle deleted locus is dropped before counting, as a known variant would be
            if position == 6 {
                continue;
            }
            let locus = LocusContext::new("chr1", position, reference[position as usize]);
            collector
                .process_locus(&locus, reference, std::slice::from_ref(&read))
                .unwrap();
        }

        let finished = collector.finish();
        let MetricRows::Indel(rows) = &finished[0].rows else {
            panic!("expected indel rows");
        };
        assert_eq!(rows[0].total_bases, 10);
        assert_eq!(rows[0].num_deletions, 1);
        assert_eq!(rows[0].num_deleted_bases, 3);
    }

    #[test]
    fn test_indel_events_feed_only_indel_tables() {
        let reference = b"ACGTACGTACGT";
        let reads = vec![record(b"r1", "4M2D6M", b"ACGTGTACGT", 0)];
        let mut collector = ErrorMetricsCollector::new(
            &directives(&["ERROR", "INDEL_ERROR"]),
            MetricsSettings::default(),
            20,
        )
        .unwrap();
        run(&mut collector, reference, &reads);

        let finished = collector.finish();
        let MetricRows::Error(errors) = &finished[0].rows else {
            panic!("expected base error rows");
        };
        assert_eq!(errors[0].total_bases, 10);
        let MetricRows::Indel(indels) = &finished[1].rows else {
            panic!("expected indel rows");
        };
        assert_eq!(indels[0].total_bases, 10);
        assert_eq!(indels[0].num_deletions, 1);
        assert_eq!(indels[0].num_deleted_bases, 2);
    }

    #[test]
    fn test_duplicate_directive_suffix_rejected() {
        let result = ErrorMetricsCollector::new(
            &directives(&["ERROR:CYCLE", "ERROR:CYCLE"]),
            MetricsSettings::default(),
            20,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unlabelled_observation_creates_no_row() {
        let reference = b"ACGT";
        let reads = vec![record(b"r1", "4M", b"ACGT", 0)];
        let mut collector =
            ErrorMetricsCollector::new(&directives(&["ERROR:READ_GROUP"]), MetricsSettings::default(), 20)
                .unwrap();
        run(&mut collector, reference, &reads);
        assert!(collector.tables()[0].is_empty());
        assert_eq!(collector.loci_processed(), 4);
    }
}
