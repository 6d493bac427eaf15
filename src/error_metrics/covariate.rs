use crate::error_metrics::errors::Result;
use crate::error_metrics::options::MetricsSettings;
use crate::error_metrics::stratifiers::{ObservedBase, Stratifier};
use std::cmp::Ordering;
use std::fmt;

pub const ALL_LABEL: &str = "all";

/// Ordered tuple of covariate labels identifying one accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey(Vec<String>);

impl CompositeKey {
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    pub fn all() -> Self {
        Self(vec![ALL_LABEL.to_string()])
    }

    /// Runs `base` through every stratifier in order. `None` as soon as one of
    /// them cannot label it.
    pub fn build(
        stratifiers: &[Stratifier],
        base: &ObservedBase,
        settings: &MetricsSettings,
    ) -> Result<Option<Self>> {
        if stratifiers.is_empty() {
            return Ok(Some(Self::all()));
        }
        let mut labels = Vec::with_capacity(stratifiers.len());
        for stratifier in stratifiers {
            match stratifier.classify(base, settings)? {
                Some(label) => labels.push(label),
                None => return Ok(None),
            }
        }
        Ok(Some(Self(labels)))
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

impl Ord for CompositeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            match natural_cmp(a, b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl PartialOrd for CompositeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Numbers sort numerically and ahead of text, so cycle 2 comes before 10
fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(labels: &[&str]) -> CompositeKey {
        CompositeKey::new(labels.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_display_joins_labels() {
        assert_eq!(key(&["FIRST", "12"]).to_string(), "FIRST,12");
        assert_eq!(CompositeKey::all().to_string(), "all");
    }

    #[test]
    fn test_numeric_labels_sort_numerically() {
        let mut keys = vec![key(&["10"]), key(&["2"]), key(&["1"]), key(&["0.5"])];
        keys.sort();
        let sorted: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(sorted, vec!["0.5", "1", "2", "10"]);
    }

    #[test]
    fn test_labels_compare_position_by_position() {
        let mut keys = vec![
            key(&["SECOND", "1"]),
            key(&["FIRST", "10"]),
            key(&["FIRST", "9"]),
        ];
        keys.sort();
        let sorted: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(sorted, vec!["FIRST,9", "FIRST,10", "SECOND,1"]);
    }

    #[test]
    fn test_numbers_before_text() {
        assert!(key(&["5"]) < key(&["A"]));
        assert!(key(&["A,C"]) < key(&["C,A"]));
    }
}
