//! Machine-readable (JSON, CSV) and human-readable run reports.
//!
//! The JSON document always starts with `schema_version`; the CSV always
//! starts with a `# schema_version=...` comment line followed by the
//! canonical header. Both writers create missing parent directories.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::environment::EnvironmentInfo;
use crate::harness::{BenchmarkPolicy, CaseDecision, CaseResult};
use crate::stats::TimingStats;
use crate::timing::to_ms;

/// Report schema version. Bump when the emitted shape changes.
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Metadata describing one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub timestamp: String,
    pub suite_version: String,
    pub git_commit: String,
    pub environment: EnvironmentInfo,
    pub policy: PolicySummary,
}

/// The policy fields recorded in reports.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PolicySummary {
    pub warmup_iterations: u32,
    pub measurement_iterations: u32,
    pub repetitions: u32,
    pub thread_count: u32,
}

impl From<&BenchmarkPolicy> for PolicySummary {
    fn from(policy: &BenchmarkPolicy) -> Self {
        Self {
            warmup_iterations: policy.warmup_iters,
            measurement_iterations: policy.measure_iters,
            repetitions: policy.repetitions,
            thread_count: policy.thread_count,
        }
    }
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    schema_version: &'a str,
    run_metadata: &'a RunMetadata,
    cases: Vec<CaseDocument<'a>>,
}

#[derive(Serialize)]
struct CaseDocument<'a> {
    backend_id: &'a str,
    scene_id: &'a str,
    scene_hash: &'a str,
    width: u32,
    height: u32,
    decision: &'static str,
    reasons: &'a [String],
    stats: &'a TimingStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact_path: Option<&'a PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    golden_path: Option<&'a PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssim_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssim_passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssim_message: Option<&'a str>,
}

impl<'a> CaseDocument<'a> {
    fn from_result(result: &'a CaseResult) -> Self {
        Self {
            backend_id: &result.backend_id,
            scene_id: &result.scene_id,
            scene_hash: &result.scene_hash,
            width: result.width,
            height: result.height,
            decision: result.decision.as_str(),
            reasons: &result.reasons,
            stats: &result.stats,
            artifact_path: result.artifact_path.as_ref(),
            golden_path: result.golden_path.as_ref(),
            ssim_score: result.ssim_score,
            ssim_passed: result.ssim_passed,
            ssim_message: result.ssim_message.as_deref(),
        }
    }
}

/// Serialize a run to the JSON report string.
pub fn to_json(metadata: &RunMetadata, results: &[CaseResult]) -> Result<String> {
    let document = ReportDocument {
        schema_version: SCHEMA_VERSION,
        run_metadata: metadata,
        cases: results.iter().map(CaseDocument::from_result).collect(),
    };
    serde_json::to_string_pretty(&document).context("failed to serialize run report")
}

/// Write the JSON report, creating missing parent directories.
pub fn write_json(path: &Path, metadata: &RunMetadata, results: &[CaseResult]) -> Result<()> {
    let json = to_json(metadata, results)?;
    ensure_parent_dir(path)?;
    fs::write(path, json).with_context(|| format!("failed to write report {}", path.display()))
}

/// Canonical CSV column header.
pub const CSV_HEADER: &str = "backend_id,scene_id,scene_hash,width,height,decision,\
wall_p50_ns,wall_p90_ns,cpu_p50_ns,cpu_p90_ns,sample_count";

/// Serialize a run to the CSV report string.
pub fn to_csv(results: &[CaseResult]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# schema_version={SCHEMA_VERSION}\n"));
    out.push_str(CSV_HEADER);
    out.push('\n');

    for result in results {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{}\n",
            escape_csv(&result.backend_id),
            escape_csv(&result.scene_id),
            escape_csv(&result.scene_hash),
            result.width,
            result.height,
            result.decision.as_str(),
            result.stats.wall_p50_ns,
            result.stats.wall_p90_ns,
            result.stats.cpu_p50_ns,
            result.stats.cpu_p90_ns,
            result.stats.sample_count,
        ));
    }
    out
}

/// Write the CSV report, creating missing parent directories.
pub fn write_csv(path: &Path, results: &[CaseResult]) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, to_csv(results))
        .with_context(|| format!("failed to write report {}", path.display()))
}

/// Double-quote fields containing commas, quotes, or line breaks, with
/// embedded quotes doubled.
fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create report directory {}", parent.display())
            })?;
        }
    }
    Ok(())
}

/// Print the human-readable summary to stdout.
pub fn print_summary(metadata: &RunMetadata, results: &[CaseResult]) {
    println!();
    println!("==================== vgbench results ====================");
    println!();
    println!("Environment:");
    println!(
        "  OS:        {} {}",
        metadata.environment.os_name, metadata.environment.os_version
    );
    println!("  Arch:      {}", metadata.environment.arch);
    println!("  CPU:       {}", metadata.environment.cpu_model);
    println!("  Cores:     {}", metadata.environment.cpu_cores);
    println!(
        "  Compiler:  {} {}",
        metadata.environment.compiler_name, metadata.environment.compiler_version
    );
    println!("  Timestamp: {}", metadata.timestamp);
    println!();
    println!("Benchmark Policy:");
    println!("  Warmup:      {} iterations", metadata.policy.warmup_iterations);
    println!(
        "  Measurement: {} iterations",
        metadata.policy.measurement_iterations
    );
    println!("  Repetitions: {}", metadata.policy.repetitions);
    println!();

    let executed = count(results, CaseDecision::Execute);
    let skipped = count(results, CaseDecision::Skip);
    let failed = count(results, CaseDecision::Fail);
    println!(
        "Results: {} executed, {} skipped, {} failed / {} total",
        executed,
        skipped,
        failed,
        results.len()
    );
    println!();

    if results.is_empty() {
        return;
    }

    println!(
        "{:<12} {:<24} {:<8} {:>14} {:>14}",
        "Backend", "Scene", "Status", "Wall p50 (ms)", "CPU p50 (ms)"
    );
    println!("{}", "-".repeat(76));
    for result in results {
        let status = match result.decision {
            CaseDecision::Execute => "OK",
            other => other.as_str(),
        };
        print!(
            "{:<12} {:<24} {:<8}",
            result.backend_id, result.scene_id, status
        );
        if result.decision == CaseDecision::Execute {
            print!(
                " {:>14.2} {:>14.2}",
                to_ms(result.stats.wall_p50_ns),
                to_ms(result.stats.cpu_p50_ns)
            );
        } else if let Some(reason) = result.reasons.first() {
            print!("  ({reason})");
        }
        println!();
    }
    println!();
}

fn count(results: &[CaseResult], decision: CaseDecision) -> usize {
    results.iter().filter(|r| r.decision == decision).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_escaping_quotes_specials() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv("line\nbreak"), "\"line\nbreak\"");
    }
}
