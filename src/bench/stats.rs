// Run statistics module
// Latency samples are kept in microseconds; percentiles sort at report time.

use std::time::Duration;

/// Aggregated outcome of one load-test run
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub requests: u64,
    pub errors: u64,
    pub elapsed: Duration,
    latencies_us: Vec<u64>,
}

impl RunStats {
    pub fn record(&mut self, latency: Duration) {
        self.requests += 1;
        #[allow(clippy::cast_possible_truncation)]
        self.latencies_us.push(latency.as_micros() as u64);
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Fold another run's samples into this one. Concurrent runs overlap, so
    /// the merged elapsed time is the longest of the two, not the sum.
    pub fn merge(&mut self, other: Self) {
        self.requests += other.requests;
        self.errors += other.errors;
        self.elapsed = self.elapsed.max(other.elapsed);
        self.latencies_us.extend(other.latencies_us);
    }

    /// Successful requests per second over the run's wall-clock time
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let requests = self.requests as f64;
        requests / secs
    }

    pub fn latency_avg_ms(&self) -> f64 {
        if self.latencies_us.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.latencies_us.iter().sum();
        #[allow(clippy::cast_precision_loss)]
        let avg_us = sum as f64 / self.latencies_us.len() as f64;
        avg_us / 1000.0
    }

    /// Latency percentile in milliseconds, nearest-rank
    pub fn latency_percentile_ms(&self, percentile: f64) -> f64 {
        if self.latencies_us.is_empty() {
            return 0.0;
        }
        let mut sorted = self.latencies_us.clone();
        sorted.sort_unstable();

        #[allow(clippy::cast_precision_loss)]
        let rank = (percentile / 100.0 * sorted.len() as f64).ceil();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (rank as usize).saturating_sub(1).min(sorted.len() - 1);
        #[allow(clippy::cast_precision_loss)]
        let value = sorted[index] as f64;
        value / 1000.0
    }
}

/// Coarse qualitative rating from peak observed throughput, fixed thresholds
pub fn rating_for(peak_rps: f64) -> &'static str {
    if peak_rps >= 50_000.0 {
        "excellent"
    } else if peak_rps >= 20_000.0 {
        "good"
    } else if peak_rps >= 5_000.0 {
        "fair"
    } else {
        "poor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_with(latencies_ms: &[u64], elapsed: Duration) -> RunStats {
        let mut stats = RunStats::default();
        for ms in latencies_ms {
            stats.record(Duration::from_millis(*ms));
        }
        stats.elapsed = elapsed;
        stats
    }

    #[test]
    fn test_throughput() {
        let stats = stats_with(&[1, 1, 1, 1], Duration::from_secs(2));
        assert!((stats.throughput() - 2.0).abs() < f64::EPSILON);

        let empty = RunStats::default();
        assert!(empty.throughput().abs() < f64::EPSILON);
    }

    #[test]
    fn test_latency_percentiles() {
        let stats = stats_with(&[10, 20, 30, 40, 50, 60, 70, 80, 90, 100], Duration::from_secs(1));
        assert!((stats.latency_percentile_ms(50.0) - 50.0).abs() < f64::EPSILON);
        assert!((stats.latency_percentile_ms(99.0) - 100.0).abs() < f64::EPSILON);
        assert!((stats.latency_avg_ms() - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_merge_takes_longest_elapsed() {
        let mut a = stats_with(&[10], Duration::from_secs(5));
        let b = stats_with(&[20, 30], Duration::from_secs(8));
        a.merge(b);

        assert_eq!(a.requests, 3);
        assert_eq!(a.elapsed, Duration::from_secs(8));
    }

    #[test]
    fn test_rating_thresholds() {
        assert_eq!(rating_for(60_000.0), "excellent");
        assert_eq!(rating_for(50_000.0), "excellent");
        assert_eq!(rating_for(49_999.9), "good");
        assert_eq!(rating_for(20_000.0), "good");
        assert_eq!(rating_for(5_000.0), "fair");
        assert_eq!(rating_for(4_999.9), "poor");
        assert_eq!(rating_for(0.0), "poor");
    }
}
