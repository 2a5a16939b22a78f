//! Sorted-sample percentile reduction.

use serde::Serialize;

/// Timing statistics for a single benchmark case, all in integer
/// nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimingStats {
    pub wall_p50_ns: i64,
    pub wall_p90_ns: i64,
    pub cpu_p50_ns: i64,
    pub cpu_p90_ns: i64,
    pub sample_count: u32,
}

/// Linearly interpolated percentile over an ascending-sorted sample
/// slice, at fractional index `p/100 * (n - 1)`. Empty input yields 0.
pub fn percentile(sorted: &[i64], p: f64) -> i64 {
    if sorted.is_empty() {
        return 0;
    }

    let index = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }

    let fraction = index - lower as f64;
    (sorted[lower] as f64 * (1.0 - fraction) + sorted[upper] as f64 * fraction) as i64
}

/// Sort both sample buffers in place and reduce them to p50/p90.
pub fn compute_stats(wall_samples: &mut [i64], cpu_samples: &mut [i64]) -> TimingStats {
    if wall_samples.is_empty() || cpu_samples.is_empty() {
        return TimingStats::default();
    }

    wall_samples.sort_unstable();
    cpu_samples.sort_unstable();

    TimingStats {
        wall_p50_ns: percentile(wall_samples, 50.0),
        wall_p90_ns: percentile(wall_samples, 90.0),
        cpu_p50_ns: percentile(cpu_samples, 50.0),
        cpu_p90_ns: percentile(cpu_samples, 90.0),
        sample_count: wall_samples.len() as u32,
    }
}
