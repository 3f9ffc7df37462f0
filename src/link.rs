//! Link table entries: latency samples recorded for an ordered service pair

use crate::{Latency, ServiceId};
use serde::{Deserialize, Serialize};

/// Ordered `(from, to)` pair identifying a link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkKey {
    pub from: ServiceId,
    pub to: ServiceId,
}

impl LinkKey {
    pub fn new(from: ServiceId, to: ServiceId) -> Self {
        Self { from, to }
    }
}

impl std::fmt::Display for LinkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// All latency samples observed for one ordered pair, in insertion order.
///
/// A link only comes into existence together with its first sample, so the
/// sample list is never empty.
#[derive(Debug, Clone)]
pub struct Link {
    samples: Vec<Latency>,
}

impl Link {
    pub fn new(first: Latency) -> Self {
        Self {
            samples: vec![first],
        }
    }

    #[cfg(test)]
    fn empty() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    pub fn record(&mut self, latency: Latency) {
        self.samples.push(latency);
    }

    pub fn samples(&self) -> &[Latency] {
        &self.samples
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Arithmetic mean of all samples, truncated toward zero.
    ///
    /// Panics if the link has no samples, which would mean the link table
    /// invariant is broken.
    pub fn mean(&self) -> Latency {
        assert!(
            !self.samples.is_empty(),
            "link has no latency samples; link table invariant broken"
        );
        let sum: i128 = self.samples.iter().map(|&s| s as i128).sum();
        (sum / self.samples.len() as i128) as Latency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_sample_mean() {
        assert_eq!(Link::new(7).mean(), 7);
    }

    #[test]
    fn test_mean_truncates() {
        let mut link = Link::new(5);
        link.record(6);
        assert_eq!(link.mean(), 5);
        link.record(8);
        assert_eq!(link.mean(), 6);
    }

    #[test]
    fn test_mean_truncates_toward_zero_for_negatives() {
        let mut link = Link::new(-5);
        link.record(-6);
        assert_eq!(link.mean(), -5);
    }

    #[test]
    fn test_samples_keep_insertion_order() {
        let mut link = Link::new(3);
        link.record(1);
        link.record(2);
        assert_eq!(link.samples(), &[3, 1, 2]);
        assert_eq!(link.sample_count(), 3);
    }

    #[test]
    #[should_panic(expected = "invariant broken")]
    fn test_empty_link_aborts() {
        Link::empty().mean();
    }

    #[test]
    fn test_key_display() {
        let key = LinkKey::new(ServiceId::new("A"), ServiceId::new("B"));
        assert_eq!(key.to_string(), "A->B");
    }
}
