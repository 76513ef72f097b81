use crate::data::Location;
use crate::risk::{classify, RiskLevel};

/// Per-level location counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Distribution {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl Distribution {
    pub fn count(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Critical => self.critical,
            RiskLevel::High => self.high,
            RiskLevel::Medium => self.medium,
            RiskLevel::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }

    fn bump(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Critical => self.critical += 1,
            RiskLevel::High => self.high += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Low => self.low += 1,
        }
    }
}

/// Facility-wide summary. Score figures are rounded to one decimal.
#[derive(Clone, Debug, PartialEq)]
pub struct Statistics {
    pub average: f64,
    pub max: f64,
    pub min: f64,
    pub total: usize,
    pub distribution: Distribution,
}

/// Summarize a snapshot; `None` for an empty list
pub fn aggregate(locations: &[Location]) -> Option<Statistics> {
    if locations.is_empty() {
        return None;
    }

    let mut sum = 0.0;
    let mut max = f64::NEG_INFINITY;
    let mut min = f64::INFINITY;
    let mut distribution = Distribution::default();

    for loc in locations {
        let score = loc.risk_score;
        sum += score;
        max = max.max(score);
        min = min.min(score);
        // Buckets share the classifier thresholds
        distribution.bump(classify(score));
    }

    Some(Statistics {
        average: round1(sum / locations.len() as f64),
        max: round1(max),
        min: round1(min),
        total: locations.len(),
        distribution,
    })
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario() {
        let locations = vec![
            Location::new(1, "a", 85.0),
            Location::new(2, "b", 55.0),
            Location::new(3, "c", 20.0),
        ];
        let stats = aggregate(&locations).unwrap();
        assert_eq!(stats.average, 53.3);
        assert_eq!(stats.max, 85.0);
        assert_eq!(stats.min, 20.0);
        assert_eq!(stats.total, 3);
        assert_eq!(
            stats.distribution,
            Distribution { critical: 1, high: 0, medium: 1, low: 1 }
        );
    }

    #[test]
    fn test_empty_is_none() {
        assert!(aggregate(&[]).is_none());
    }

    #[test]
    fn test_distribution_sums_to_len() {
        let locations: Vec<Location> = (0..57)
            .map(|i| Location::new(i, format!("loc {}", i), (i as f64 * 7.3) % 130.0 - 10.0))
            .collect();
        let stats = aggregate(&locations).unwrap();
        assert_eq!(stats.distribution.total(), locations.len());
        for level in RiskLevel::ALL {
            let expected = locations.iter().filter(|l| classify(l.risk_score) == level).count();
            assert_eq!(stats.distribution.count(level), expected);
        }
    }

    #[test]
    fn test_boundaries_fall_in_upper_bucket() {
        let locations = vec![
            Location::new(1, "a", 80.0),
            Location::new(2, "b", 60.0),
            Location::new(3, "c", 40.0),
            Location::new(4, "d", 39.9),
        ];
        let d = aggregate(&locations).unwrap().distribution;
        assert_eq!(d, Distribution { critical: 1, high: 1, medium: 1, low: 1 });
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round1(45.26), 45.3);
        assert_eq!(round1(72.0), 72.0);
        assert_eq!(round1(-0.04), -0.0);
    }
}
