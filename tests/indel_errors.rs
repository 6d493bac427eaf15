use rust_htslib::bam;
use rust_htslib::bam::record::{Cigar, CigarString};
use sam_error_metrics::error_metrics::metrics::IndelErrorMetric;
use sam_error_metrics::error_metrics::read::ReadContext;
use sam_error_metrics::error_metrics::types::LocusContext;
use sam_error_metrics::{Directive, ErrorMetricsCollector, MetricsSettings};
use sam_error_metrics::error_metrics::MetricRows;

const START: i64 = 100;

fn reference() -> Vec<u8> {
    let mut state: u32 = 17;
    (0..400)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            b"ACGT"[((state >> 16) % 4) as usize]
        })
        .collect()
}

/// A read matching the reference wherever the CIGAR aligns it.
fn read(name: &str, cigar: &str, reference: &[u8]) -> bam::Record {
    let cigar = CigarString::try_from(cigar).unwrap();
    let mut seq = Vec::new();
    let mut ref_pos = START as usize;
    for op in cigar.iter() {
        match *op {
            Cigar::Match(l) => {
                seq.extend_from_slice(&reference[ref_pos..ref_pos + l as usize]);
                ref_pos += l as usize;
            }
            Cigar::Del(l) => ref_pos += l as usize,
            Cigar::Ins(l) | Cigar::SoftClip(l) => seq.extend(std::iter::repeat(b'A').take(l as usize)),
            _ => {}
        }
    }
    let qual = vec![30u8; seq.len()];
    let mut record = bam::Record::new();
    record.set(name.as_bytes(), Some(&cigar), &seq, &qual);
    record.set_tid(0);
    record.set_pos(START);
    record.set_mapq(60);
    record
}

/// Runs every locus of the reference through a collector and returns the
/// indel table of `directive`.
fn indel_metrics(cigars: &[&str], directive: &str) -> Vec<IndelErrorMetric> {
    let reference = reference();
    let reads: Vec<bam::Record> = cigars
        .iter()
        .enumerate()
        .map(|(i, cigar)| read(&format!("Read{i}"), cigar, &reference))
        .collect();
    let spans: Vec<(u32, u32)> = reads
        .iter()
        .map(|r| {
            let ctx = ReadContext::new(r, &reference);
            (ctx.alignment_start, ctx.alignment_end)
        })
        .collect();

    let directives: Vec<Directive> = vec![directive.parse().unwrap()];
    let mut collector = ErrorMetricsCollector::new(&directives, MetricsSettings::default(), 20).unwrap();

    for position in 0..reference.len() as u32 {
        let covering: Vec<bam::Record> = reads
            .iter()
            .zip(&spans)
            .filter(|(_, (start, end))| *start <= position && position <= *end)
            .map(|(r, _)| r.clone())
            .collect();
        if covering.is_empty() {
            continue;
        }
        let locus = LocusContext::new("chrM", position, reference[position as usize]);
        collector.process_locus(&locus, &reference, &covering).unwrap();
    }

    let mut finished = collector.finish();
    match finished.remove(0).rows {
        MetricRows::Indel(rows) => rows,
        other => panic!("expected indel rows, got {:?}", other),
    }
}

fn find<'a>(rows: &'a [IndelErrorMetric], covariate: &str) -> &'a IndelErrorMetric {
    rows.iter()
        .find(|m| m.covariate == covariate)
        .unwrap_or_else(|| panic!("no row for covariate {covariate}"))
}

/// (total_bases, insertions, inserted_bases, deletions, deleted_bases)
fn counts(metric: &IndelErrorMetric) -> (u64, u64, u64, u64, u64) {
    (
        metric.total_bases,
        metric.num_insertions,
        metric.num_inserted_bases,
        metric.num_deletions,
        metric.num_deleted_bases,
    )
}

#[test]
fn test_indel_errors_by_all() {
    let cases: Vec<(Vec<&str>, (u64, u64, u64, u64, u64))> = vec![
        (vec!["100M"], (100, 0, 0, 0, 0)),
        (vec!["50M1I50M"], (101, 1, 1, 0, 0)),
        (vec!["2I100M"], (102, 1, 2, 0, 0)),
        (vec!["100M1I"], (101, 1, 1, 0, 0)),
        (vec!["50M2I2M2I50M"], (106, 2, 4, 0, 0)),
        (vec!["50M2I2M2I50M", "50M2I2M2I50M"], (212, 4, 8, 0, 0)),
        (vec!["50M1D50M"], (100, 0, 0, 1, 1)),
        (vec!["1D100M"], (100, 0, 0, 1, 1)),
        (vec!["100M1D"], (100, 0, 0, 1, 1)),
        (vec!["50M2D2M2D50M"], (102, 0, 0, 2, 4)),
        (vec!["50M2D2M2D50M", "50M2D2M2D50M"], (204, 0, 0, 4, 8)),
        (vec!["20M1I20M1D20M"], (61, 1, 1, 1, 1)),
        (vec!["20M2I2D20M"], (42, 1, 2, 1, 2)),
        (vec!["20M2D2I20M"], (42, 1, 2, 1, 2)),
        (vec!["2I2D20M"], (22, 1, 2, 1, 2)),
        (vec!["2D2I20M"], (22, 1, 2, 1, 2)),
        (vec!["20M2D2I"], (22, 1, 2, 1, 2)),
        (vec!["20M2I2D"], (22, 1, 2, 1, 2)),
    ];

    for (cigars, expected) in cases {
        let rows = indel_metrics(&cigars, "INDEL_ERROR");
        assert_eq!(rows.len(), 1, "{:?}", cigars);
        assert_eq!(counts(find(&rows, "all")), expected, "{:?}", cigars);
    }
}

#[test]
fn test_indel_errors_by_indel_length() {
    let cases: Vec<(&str, &str, (u64, u64, u64, u64, u64))> = vec![
        ("50M1I50M", "1", (1, 1, 1, 0, 0)),
        ("50M2I50M", "2", (2, 1, 2, 0, 0)),
        ("20M2I20M2I20M", "2", (4, 2, 4, 0, 0)),
        ("1I10M", "1", (1, 1, 1, 0, 0)),
        ("10M1I", "1", (1, 1, 1, 0, 0)),
        ("50M1D50M", "1", (0, 0, 0, 1, 1)),
        ("50M2D50M", "2", (0, 0, 0, 1, 2)),
        ("20M2D20M2D20M", "2", (0, 0, 0, 2, 4)),
        ("1D10M", "1", (0, 0, 0, 1, 1)),
        ("10M1D", "1", (0, 0, 0, 1, 1)),
        ("20M2I20M3D20M", "2", (2, 1, 2, 0, 0)),
        ("20M2I20M3D20M", "3", (0, 0, 0, 1, 3)),
        ("2I2D20M", "2", (2, 1, 2, 1, 2)),
        ("2D2I20M", "2", (2, 1, 2, 1, 2)),
        ("2M2D2I", "2", (2, 1, 2, 1, 2)),
        ("20M2I2D", "2", (2, 1, 2, 1, 2)),
    ];

    for (cigar, covariate, expected) in cases {
        let rows = indel_metrics(&[cigar], "INDEL_ERROR:INDEL_LENGTH");
        assert_eq!(counts(find(&rows, covariate)), expected, "{cigar}");
    }
}

#[test]
fn test_indel_quality_scores_use_prior() {
    let rows = indel_metrics(&["100M"], "INDEL_ERROR");
    let all = find(&rows, "all");
    // (0 + 0.001) / 101
    let expected = -10.0 * (0.001f64 / 101.0).log10();
    assert!((all.insertions_q - expected).abs() < 1e-9);
    assert!((all.deletions_q - expected).abs() < 1e-9);
}
