//! Statistics aggregation over a path set

use crate::model::{ResultStats, SimulatedPath};

/// Nearest-rank percentile of an ascending sample: index `floor(n * p)`,
/// clamped to the last element.
fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (sorted.len() as f64 * p).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Median at index `n / 2` (the upper middle for even sizes)
fn median(sorted: &[f64]) -> f64 {
    sorted.get(sorted.len() / 2).copied().unwrap_or(0.0)
}

/// Summarize terminal values, losses and drawdowns of `paths`.
///
/// `horizon_years` is the path horizon in trading years and only feeds the
/// median CAGR. An empty path set yields [`ResultStats::default`].
#[must_use]
pub fn compute_stats(paths: &[SimulatedPath], start_value: f64, horizon_years: f64) -> ResultStats {
    if paths.is_empty() {
        return ResultStats::default();
    }

    let mut terminals: Vec<f64> = paths.iter().map(SimulatedPath::final_value).collect();
    let mut drawdowns: Vec<f64> = paths.iter().map(SimulatedPath::max_drawdown).collect();
    terminals.sort_by(f64::total_cmp);
    drawdowns.sort_by(f64::total_cmp);

    let n = terminals.len() as f64;
    let mean = terminals.iter().sum::<f64>() / n;
    let variance = terminals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let losses = terminals.iter().filter(|&&v| v < start_value).count();

    let p50 = median(&terminals);
    let median_cagr = if start_value > 0.0 && horizon_years > 0.0 && p50 > 0.0 {
        (p50 / start_value).powf(1.0 / horizon_years) - 1.0
    } else {
        0.0
    };

    ResultStats {
        p5: nearest_rank(&terminals, 0.05),
        p25: nearest_rank(&terminals, 0.25),
        p50,
        p75: nearest_rank(&terminals, 0.75),
        p95: nearest_rank(&terminals, 0.95),
        mean,
        std_dev: variance.sqrt(),
        probability_of_loss: losses as f64 / n,
        median_max_drawdown: median(&drawdowns),
        p95_max_drawdown: nearest_rank(&drawdowns, 0.95),
        median_cagr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_paths(n: usize, start: f64, end: f64) -> Vec<SimulatedPath> {
        (0..n)
            .map(|_| SimulatedPath::new(vec![start, end]))
            .collect()
    }

    #[test]
    fn test_empty_paths() {
        assert_eq!(compute_stats(&[], 100.0, 1.0), ResultStats::default());
    }

    #[test]
    fn test_all_gain() {
        let stats = compute_stats(&constant_paths(1000, 100_000.0, 110_000.0), 100_000.0, 1.0);
        for (_, v) in stats.percentile_values() {
            assert!((v - 110_000.0).abs() < 1e-6);
        }
        assert_eq!(stats.probability_of_loss, 0.0);
        assert!((stats.mean - 110_000.0).abs() < 1e-6);
        assert!(stats.std_dev.abs() < 1e-6);
        assert!((stats.median_cagr - 0.10).abs() < 1e-9);
        assert_eq!(stats.median_max_drawdown, 0.0);
    }

    #[test]
    fn test_all_loss() {
        let stats = compute_stats(&constant_paths(1000, 100_000.0, 90_000.0), 100_000.0, 1.0);
        assert_eq!(stats.probability_of_loss, 1.0);
        assert!((stats.median_max_drawdown + 0.1).abs() < 1e-12);
        assert!((stats.p95_max_drawdown + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_ending_at_start_is_not_a_loss() {
        let stats = compute_stats(&constant_paths(10, 100.0, 100.0), 100.0, 1.0);
        assert_eq!(stats.probability_of_loss, 0.0);
        assert_eq!(stats.median_cagr, 0.0);
    }

    #[test]
    fn test_median_cagr_doubling() {
        let stats = compute_stats(&constant_paths(1000, 100_000.0, 200_000.0), 100_000.0, 5.0);
        let expected = 2.0_f64.powf(1.0 / 5.0) - 1.0;
        assert!((stats.median_cagr - expected).abs() < 1e-6);
    }

    #[test]
    fn test_cagr_guards() {
        let paths = constant_paths(3, 100.0, 150.0);
        assert_eq!(compute_stats(&paths, 100.0, 0.0).median_cagr, 0.0);
        assert_eq!(compute_stats(&paths, 0.0, 1.0).median_cagr, 0.0);
        let wiped = constant_paths(3, 100.0, 0.0);
        assert_eq!(compute_stats(&wiped, 100.0, 1.0).median_cagr, 0.0);
    }

    #[test]
    fn test_nearest_rank_indexing() {
        // Terminals 0..20 in shuffled order
        let paths: Vec<SimulatedPath> = (0..20)
            .rev()
            .map(|i| SimulatedPath::new(vec![10.0, f64::from(i)]))
            .collect();
        let stats = compute_stats(&paths, 10.0, 1.0);
        assert_eq!(stats.p5, 1.0);
        assert_eq!(stats.p25, 5.0);
        assert_eq!(stats.p50, 10.0);
        assert_eq!(stats.p75, 15.0);
        assert_eq!(stats.p95, 19.0);
        assert_eq!(stats.probability_of_loss, 0.5);
        assert!((stats.mean - 9.5).abs() < 1e-12);
    }

    #[test]
    fn test_population_std_dev() {
        let paths = vec![
            SimulatedPath::new(vec![1.0, 2.0]),
            SimulatedPath::new(vec![1.0, 4.0]),
        ];
        let stats = compute_stats(&paths, 1.0, 1.0);
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert!((stats.std_dev - 1.0).abs() < 1e-12);
        // Upper middle of an even sample
        assert_eq!(stats.p50, 4.0);
    }

    #[test]
    fn test_empty_path_has_zero_terminal() {
        let stats = compute_stats(&[SimulatedPath::default()], 100.0, 1.0);
        assert_eq!(stats.p50, 0.0);
        assert_eq!(stats.probability_of_loss, 1.0);
        assert_eq!(stats.median_max_drawdown, 0.0);
    }
}
