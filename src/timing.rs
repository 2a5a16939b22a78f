//! High-resolution timing substrate: monotonic wall clock, process CPU
//! time, and a one-shot CPU frequency estimate.

use std::sync::OnceLock;
use std::time::Instant;

/// Monotonic, strictly non-decreasing timestamp. Never a wall clock
/// subject to NTP jumps.
pub fn now_monotonic() -> Instant {
    Instant::now()
}

/// Nanoseconds elapsed between two monotonic timestamps.
pub fn elapsed_ns(start: Instant, end: Instant) -> i64 {
    end.duration_since(start).as_nanos() as i64
}

/// Process CPU time (user + system) in nanoseconds. Returns 0 on
/// platforms without a process CPU clock.
#[cfg(unix)]
pub fn cpu_time_ns() -> i64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
    if rc == 0 {
        ts.tv_sec as i64 * 1_000_000_000 + ts.tv_nsec as i64
    } else {
        0
    }
}

#[cfg(not(unix))]
pub fn cpu_time_ns() -> i64 {
    0
}

/// Semantics of [`cpu_time_ns`], probed once per process and recorded in
/// run metadata.
pub fn cpu_time_semantics() -> &'static str {
    static SEMANTICS: OnceLock<&'static str> = OnceLock::new();
    SEMANTICS.get_or_init(probe_cpu_time_semantics)
}

#[cfg(unix)]
fn probe_cpu_time_semantics() -> &'static str {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
    if rc == 0 {
        "process"
    } else {
        "unsupported"
    }
}

#[cfg(not(unix))]
fn probe_cpu_time_semantics() -> &'static str {
    "unsupported"
}

/// Estimated CPU frequency in Hz. Used only for reporting; estimated
/// once per process.
pub fn cpu_frequency_hz() -> u64 {
    static FREQUENCY: OnceLock<u64> = OnceLock::new();
    *FREQUENCY.get_or_init(estimate_cpu_frequency)
}

fn estimate_cpu_frequency() -> u64 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
            for line in cpuinfo.lines() {
                if let Some(rest) = line.strip_prefix("cpu MHz") {
                    if let Some(value) = rest.split(':').nth(1) {
                        if let Ok(mhz) = value.trim().parse::<f64>() {
                            return (mhz * 1_000_000.0) as u64;
                        }
                    }
                }
            }
        }
    }
    0
}

pub fn to_ns(ns: i64) -> i64 {
    ns
}

pub fn to_us(ns: i64) -> f64 {
    ns as f64 / 1_000.0
}

pub fn to_ms(ns: i64) -> f64 {
    ns as f64 / 1_000_000.0
}

pub fn to_s(ns: i64) -> f64 {
    ns as f64 / 1_000_000_000.0
}
