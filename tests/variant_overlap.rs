use sam_error_metrics::error_metrics::variants::{
    InMemoryVariantSource, VariantOverlapFilter, VariantRecord, VariantSource,
};

fn nist() -> Box<dyn VariantSource> {
    Box::new(InMemoryVariantSource::new(
        "nist",
        vec![
            VariantRecord::new("1", 216_407_408, 216_407_408),
            VariantRecord::new("2", 18_016_236, 18_016_236),
        ],
    ))
}

fn nist_chr1() -> Box<dyn VariantSource> {
    Box::new(InMemoryVariantSource::new(
        "nist.chr1",
        vec![VariantRecord::new("1", 216_407_408, 216_407_408)],
    ))
}

#[test]
fn test_variant_site_and_neighbour() {
    let mut filter = VariantOverlapFilter::new(vec![nist()]);

    let site = filter.check_locus("2", 18_016_236).unwrap();
    assert_eq!(site.len(), 1);
    assert_eq!(site[0].len(), 1);
    assert!(site.is_variant());

    let neighbour = filter.check_locus("2", 18_016_237).unwrap();
    assert_eq!(neighbour.len(), 1);
    assert_eq!(neighbour[-1].len(), 0);
    assert!(!neighbour.is_variant());
}

#[test]
fn test_multiple_sources() {
    let mut filter = VariantOverlapFilter::new(vec![nist(), nist_chr1()]);

    let chr1 = filter.check_locus("1", 216_407_408).unwrap();
    assert_eq!(chr1.len(), 2);
    assert_eq!(chr1[0].len(), 1);
    assert_eq!(chr1[1].len(), 1);
    assert_eq!(chr1[-1], chr1[1]);
    assert_eq!(chr1[-2], chr1[0]);

    let chr2 = filter.check_locus("2", 18_016_236).unwrap();
    assert_eq!(chr2[0].len(), 1);
    assert!(chr2[-1].is_empty());

    let quiet = filter.check_locus("2", 180_162_275).unwrap();
    assert_eq!(quiet.iter().map(|records| records.len()).sum::<usize>(), 0);
}

#[test]
fn test_multi_base_variant_spans_its_reference_allele() {
    let deletion = InMemoryVariantSource::new("sample", vec![VariantRecord::new("chrM", 99, 101)]);
    let mut filter = VariantOverlapFilter::new(vec![Box::new(deletion)]);
    let hits: Vec<bool> = (98..103)
        .map(|pos| filter.check_locus("chrM", pos).unwrap().is_variant())
        .collect();
    assert_eq!(hits, vec![false, true, true, true, false]);
}
