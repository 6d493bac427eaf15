use sam_error_metrics::error_metrics::stratifiers::bins::CycleBin;
use sam_error_metrics::error_metrics::ErrorClass;

fn next_up(x: f64) -> f64 {
    f64::from_bits(x.to_bits() + 1)
}

#[test]
fn test_cycle_bin_boundaries() {
    let cases = [
        (0.0, CycleBin::Quintile1),
        (0.2, CycleBin::Quintile1),
        (next_up(0.2), CycleBin::Quintile2),
        (0.4, CycleBin::Quintile2),
        (next_up(0.4), CycleBin::Quintile3),
        (0.54, CycleBin::Quintile3),
        (0.6, CycleBin::Quintile3),
        (next_up(0.6), CycleBin::Quintile4),
        (0.8, CycleBin::Quintile4),
        (next_up(0.8), CycleBin::Quintile5),
        (1.0, CycleBin::Quintile5),
    ];
    for (position, expected) in cases {
        assert_eq!(CycleBin::from_relative_position(position).unwrap(), expected, "{position}");
    }
}

#[test]
fn test_cycle_bin_rejects_positions_outside_read() {
    let smallest_negative = -f64::from_bits(1);
    for position in [next_up(1.0), smallest_negative, -1.0, -0.1, 1.1, 100.0, f64::NAN] {
        let err = CycleBin::from_relative_position(position).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Domain, "{position}");
    }
}
