use serde::{Deserialize, Serialize};

/// One Monte Carlo scenario: daily portfolio values from day 0 (the starting
/// value) through the final horizon day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulatedPath {
    pub values: Vec<f64>,
}

impl SimulatedPath {
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Terminal portfolio value, 0 for an empty path
    #[must_use]
    pub fn final_value(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    /// Worst peak-to-trough decline along the path as a non-positive fraction.
    ///
    /// Paths shorter than two values have no drawdown. The ratio is only taken
    /// while the running peak is positive.
    #[must_use]
    pub fn max_drawdown(&self) -> f64 {
        let Some((&first, rest)) = self.values.split_first() else {
            return 0.0;
        };

        let mut peak = first;
        let mut max_dd = 0.0;
        for &v in rest {
            if v > peak {
                peak = v;
            }
            if peak > 0.0 {
                let dd = (v - peak) / peak;
                if dd < max_dd {
                    max_dd = dd;
                }
            }
        }
        max_dd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_value() {
        assert_eq!(SimulatedPath::default().final_value(), 0.0);
        assert_eq!(SimulatedPath::new(vec![100.0]).final_value(), 100.0);
        assert_eq!(
            SimulatedPath::new(vec![100.0, 110.0, 95.0, 120.0]).final_value(),
            120.0
        );
    }

    #[test]
    fn test_max_drawdown() {
        let cases: [(&[f64], f64); 7] = [
            (&[], 0.0),
            (&[100.0], 0.0),
            (&[100.0, 110.0], 0.0),
            (&[100.0, 50.0], -0.5),
            (&[100.0, 50.0, 200.0, 100.0], -0.5),
            (&[100.0, 120.0, 60.0, 130.0, 65.0], -0.5),
            (&[100.0, 90.0, 80.0, 70.0], -0.3),
        ];

        for (values, expected) in cases {
            let path = SimulatedPath::new(values.to_vec());
            let dd = path.max_drawdown();
            assert!(
                (dd - expected).abs() < 1e-9,
                "max_drawdown({values:?}) = {dd}, want {expected}"
            );
            assert!(dd <= 0.0, "drawdown must be non-positive, got {dd}");
        }
    }

    #[test]
    fn test_max_drawdown_skips_non_positive_peak() {
        // Peak never becomes positive, so no ratio is taken
        let path = SimulatedPath::new(vec![0.0, -10.0, -5.0]);
        assert_eq!(path.max_drawdown(), 0.0);

        // Once the peak turns positive the decline is measured from it
        let path = SimulatedPath::new(vec![-1.0, 10.0, 5.0]);
        assert!((path.max_drawdown() + 0.5).abs() < 1e-12);
    }
}
