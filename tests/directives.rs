use sam_error_metrics::error_metrics::directive::{parse_directives, Directive};
use sam_error_metrics::error_metrics::stratifiers::Stratifier;
use sam_error_metrics::ErrorMetricsError;

#[test]
fn test_directive_suffixes() {
    let cases = [
        ("ERROR", "error_by_all"),
        ("ERROR:ALL", "error_by_all"),
        ("ERROR:GC_CONTENT", "error_by_gc"),
        ("ERROR:READ_ORDINALITY", "error_by_read_ordinality"),
        ("ERROR:READ_BASE", "error_by_read_base"),
        ("ERROR:REFERENCE_BASE", "error_by_ref_base"),
        ("ERROR:PRE_DINUC", "error_by_pre_dinuc"),
        ("ERROR:POST_DINUC", "error_by_post_dinuc"),
        ("ERROR:HOMOPOLYMER_LENGTH", "error_by_homopolymer_length"),
        ("ERROR:HOMOPOLYMER", "error_by_homopolymer_and_following_ref_base"),
        (
            "ERROR:BINNED_HOMOPOLYMER",
            "error_by_binned_length_homopolymer_and_following_ref_base",
        ),
        ("ERROR:FLOWCELL_TILE", "error_by_tile"),
        ("ERROR:FLOWCELL_X", "error_by_x"),
        ("ERROR:FLOWCELL_Y", "error_by_y"),
        ("ERROR:READ_DIRECTION", "error_by_read_direction"),
        ("ERROR:PAIR_ORIENTATION", "error_by_pair_orientation"),
        ("ERROR:PAIR_PROPERNESS", "error_by_pair_proper"),
        ("ERROR:CYCLE", "error_by_cycle"),
        ("ERROR:BINNED_CYCLE", "error_by_binned_cycle"),
        ("ERROR:SOFT_CLIPS", "error_by_soft_clipped_bases"),
        ("ERROR:INSERT_LENGTH", "error_by_insert_length"),
        ("ERROR:BASE_QUALITY", "error_by_base_quality"),
        ("ERROR:MAPPING_QUALITY", "error_by_mapping_quality"),
        ("ERROR:READ_GROUP", "error_by_read_group"),
        ("ERROR:MISMATCHES_IN_READ", "error_by_mismatches_in_read"),
        ("ERROR:ONE_BASE_PADDED_CONTEXT", "error_by_one_base_padded_context"),
        ("ERROR:TWO_BASE_PADDED_CONTEXT", "error_by_two_base_padded_context"),
        ("ERROR:CONSENSUS", "error_by_consensus"),
        ("ERROR:NS_IN_READ", "error_by_ns_in_read"),
        ("ERROR:POST_DINUC:BASE_QUALITY", "error_by_post_dinuc_and_base_quality"),
        (
            "ERROR:POST_DINUC:BASE_QUALITY:GC_CONTENT",
            "error_by_post_dinuc_and_base_quality_and_gc",
        ),
        (
            " ERROR : POST_DINUC : BASE_QUALITY : GC_CONTENT ",
            "error_by_post_dinuc_and_base_quality_and_gc",
        ),
        ("OVERLAPPING_ERROR", "overlapping_error_by_all"),
        ("OVERLAPPING_ERROR:ALL", "overlapping_error_by_all"),
        ("OVERLAPPING_ERROR:GC_CONTENT", "overlapping_error_by_gc"),
        ("OVERLAPPING_ERROR:READ_ORDINALITY", "overlapping_error_by_read_ordinality"),
        (
            "OVERLAPPING_ERROR:HOMOPOLYMER",
            "overlapping_error_by_homopolymer_and_following_ref_base",
        ),
        ("OVERLAPPING_ERROR:CYCLE", "overlapping_error_by_cycle"),
        ("OVERLAPPING_ERROR:BASE_QUALITY", "overlapping_error_by_base_quality"),
        ("INDEL_ERROR", "indel_error_by_all"),
        ("INDEL_ERROR:INDEL_LENGTH", "indel_error_by_indel_length"),
    ];

    for (text, suffix) in cases {
        let directive: Directive = text.parse().unwrap_or_else(|e| panic!("{text}: {e}"));
        assert_eq!(directive.suffix(), suffix, "{text}");
    }
}

#[test]
fn test_bad_directives() {
    for text in ["ERROR:", "ERRORS:READ_ORDINALITY", "ERROR;REFERENCE_BASE", "ERROR:what", "ERROR::CYCLE"] {
        let err = text.parse::<Directive>().unwrap_err();
        assert_eq!(
            err.class(),
            sam_error_metrics::error_metrics::ErrorClass::Configuration,
            "{text}"
        );
    }

    match "ERROR:what".parse::<Directive>() {
        Err(ErrorMetricsError::UnknownCovariate { token, .. }) => assert_eq!(token, "what"),
        other => panic!("unexpected result {:?}", other),
    }
    assert!(matches!(
        "ERRORS:READ_ORDINALITY".parse::<Directive>(),
        Err(ErrorMetricsError::UnknownErrorKind { .. })
    ));
    assert!(matches!("ERROR:".parse::<Directive>(), Err(ErrorMetricsError::EmptyCovariate { .. })));
}

#[test]
fn test_every_covariate_plus_all_is_rejected() {
    let mut text = String::from("ERROR");
    for stratifier in Stratifier::ALL {
        text.push(':');
        text.push_str(stratifier.token());
    }
    let every: Directive = text.parse().unwrap();
    assert_eq!(every.stratifiers.len(), Stratifier::ALL.len());

    text.push_str(":ALL");
    assert!(text.parse::<Directive>().is_err());

    text.push_str(":CYCLE");
    assert!(matches!(
        text.parse::<Directive>(),
        Err(ErrorMetricsError::TooManyCovariates { .. })
    ));
}

#[test]
fn test_run_rejects_colliding_outputs() {
    assert!(parse_directives(["ERROR:CYCLE", "INDEL_ERROR:CYCLE"]).is_ok());
    assert!(matches!(
        parse_directives(["ERROR:CYCLE", " ERROR : CYCLE "]),
        Err(ErrorMetricsError::DuplicateSuffix { .. })
    ));
}
