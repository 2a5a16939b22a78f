//! Host environment metadata for run reports.

use chrono::{Local, SecondsFormat};
use serde::Serialize;

/// Environment information recorded in run metadata.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentInfo {
    pub os_name: String,
    pub os_version: String,
    pub arch: String,
    pub cpu_model: String,
    pub cpu_cores: u32,
    pub memory_bytes: u64,
    pub compiler_name: String,
    pub compiler_version: String,
}

/// Collect environment information for the current system. Fields that
/// cannot be probed fall back to "unknown" / zero.
pub fn collect() -> EnvironmentInfo {
    EnvironmentInfo {
        os_name: std::env::consts::OS.to_owned(),
        os_version: os_version(),
        arch: std::env::consts::ARCH.to_owned(),
        cpu_model: cpu_model(),
        cpu_cores: std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(0),
        memory_bytes: memory_bytes(),
        compiler_name: "rustc".to_owned(),
        compiler_version: option_env!("VGBENCH_RUSTC_VERSION")
            .unwrap_or("unknown")
            .to_owned(),
    }
}

/// Current local time as RFC 3339 with UTC offset.
pub fn timestamp_rfc3339() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Short git hash embedded at build time, or "unknown".
pub fn git_commit() -> &'static str {
    option_env!("VGBENCH_GIT_HASH").unwrap_or("unknown")
}

fn os_version() -> String {
    #[cfg(target_os = "linux")]
    {
        if let Ok(release) = std::fs::read_to_string("/proc/sys/kernel/osrelease") {
            return release.trim().to_owned();
        }
    }
    "unknown".to_owned()
}

fn cpu_model() -> String {
    #[cfg(target_os = "linux")]
    {
        if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
            for line in cpuinfo.lines() {
                if line.starts_with("model name") {
                    if let Some(value) = line.split(':').nth(1) {
                        return value.trim().to_owned();
                    }
                }
            }
        }
    }
    "unknown".to_owned()
}

fn memory_bytes() -> u64 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(meminfo) = std::fs::read_to_string("/proc/meminfo") {
            for line in meminfo.lines() {
                if line.starts_with("MemTotal:") {
                    let mut parts = line.split_whitespace();
                    if let Some(kib) = parts.nth(1).and_then(|v| v.parse::<u64>().ok()) {
                        return kib * 1024;
                    }
                }
            }
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_fills_static_fields() {
        let env = collect();
        assert!(!env.os_name.is_empty());
        assert!(!env.arch.is_empty());
        assert_eq!(env.compiler_name, "rustc");
    }

    #[test]
    fn timestamp_has_offset() {
        let timestamp = timestamp_rfc3339();
        // RFC 3339 with offset: either a zone suffix or +hh:mm/-hh:mm.
        assert!(
            timestamp.ends_with('Z')
                || timestamp.get(timestamp.len() - 6..).is_some_and(|suffix| {
                    suffix.starts_with('+') || suffix.starts_with('-')
                }),
            "timestamp {timestamp}"
        );
    }
}
