//! Per-case benchmark execution.
//!
//! One call to [`run_case`] drives a single (backend, scene) pair through
//! the lifecycle: compatibility gate, prepare, warm-up, measured loop,
//! statistics, then the optional artifact and SSIM steps. Statistics and
//! artifacts run strictly after measurement and never contribute to the
//! timed samples.

use std::path::PathBuf;

use log::warn;

use crate::artifacts;
use crate::backend::{Backend, SurfaceConfig};
use crate::capabilities::{check_compatibility, RequiredFeatures};
use crate::scene::PreparedScene;
use crate::ssim;
use crate::stats::{compute_stats, TimingStats};
use crate::timing;

/// Knobs for a benchmark run.
#[derive(Debug, Clone)]
pub struct BenchmarkPolicy {
    pub warmup_iters: u32,
    pub measure_iters: u32,
    pub repetitions: u32,
    pub thread_count: u32,
    pub generate_png: bool,
    pub compare_ssim: bool,
    pub output_dir: PathBuf,
    pub golden_dir: PathBuf,
}

impl Default for BenchmarkPolicy {
    fn default() -> Self {
        Self {
            warmup_iters: 3,
            measure_iters: 10,
            repetitions: 1,
            thread_count: 1,
            generate_png: false,
            compare_ssim: false,
            output_dir: PathBuf::from("."),
            golden_dir: PathBuf::from("golden"),
        }
    }
}

/// Execution outcome for a benchmark case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseDecision {
    Execute,
    Skip,
    Fail,
    Fallback,
}

impl CaseDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Execute => "EXECUTE",
            Self::Skip => "SKIP",
            Self::Fail => "FAIL",
            Self::Fallback => "FALLBACK",
        }
    }
}

/// Result of one (backend, scene) case. Either a successful measurement
/// (`Execute` with populated stats and empty reasons) or a non-Execute
/// decision with at least one machine-readable reason code.
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub backend_id: String,
    pub scene_id: String,
    pub scene_hash: String,
    pub width: u32,
    pub height: u32,
    pub decision: CaseDecision,
    pub reasons: Vec<String>,
    pub stats: TimingStats,
    pub artifact_path: Option<PathBuf>,
    pub golden_path: Option<PathBuf>,
    pub ssim_score: Option<f64>,
    pub ssim_passed: Option<bool>,
    pub ssim_message: Option<String>,
}

impl CaseResult {
    fn new(backend_id: String, scene: &PreparedScene) -> Self {
        Self {
            backend_id,
            scene_id: scene.scene_id.clone(),
            scene_hash: scene.scene_hash.clone(),
            width: scene.width,
            height: scene.height,
            decision: CaseDecision::Skip,
            reasons: Vec::new(),
            stats: TimingStats::default(),
            artifact_path: None,
            golden_path: None,
            ssim_score: None,
            ssim_passed: None,
            ssim_message: None,
        }
    }

    fn skip(mut self, reason: String) -> Self {
        self.decision = CaseDecision::Skip;
        self.reasons.push(reason);
        self
    }

    fn fail(mut self, reason: String) -> Self {
        self.decision = CaseDecision::Fail;
        self.reasons.push(reason);
        self
    }
}

/// Run a single benchmark case. The backend must already be initialized.
pub fn run_case(
    backend: &mut dyn Backend,
    scene: &PreparedScene,
    required: &RequiredFeatures,
    policy: &BenchmarkPolicy,
) -> CaseResult {
    let result = CaseResult::new(backend.info().id, scene);

    // Compatibility gate.
    let caps = backend.capabilities();
    if policy.thread_count > 1 && !caps.supports_parallel_render {
        return result.skip("UNSUPPORTED_FEATURE:parallel_render".to_owned());
    }
    if let Some(reason) = check_compatibility(&caps, required) {
        return result.skip(reason);
    }

    if let Err(error) = backend.prepare(scene) {
        return result.fail(format!("PREPARE_FAILED:{}", error.message));
    }

    // Output buffer is sized before any timing begins.
    let config = SurfaceConfig::for_scene(scene);
    let mut output = vec![0u8; config.buffer_len()];

    for _ in 0..policy.warmup_iters {
        if let Err(error) = backend.render(scene, &config, &mut output) {
            return result.fail(format!("WARMUP_FAILED:{}", error.message));
        }
    }

    let mut wall_samples = Vec::with_capacity(policy.measure_iters as usize);
    let mut cpu_samples = Vec::with_capacity(policy.measure_iters as usize);
    for _ in 0..policy.measure_iters {
        let cpu_start = timing::cpu_time_ns();
        let wall_start = timing::now_monotonic();

        let status = backend.render(scene, &config, &mut output);

        let wall_end = timing::now_monotonic();
        let cpu_end = timing::cpu_time_ns();

        if let Err(error) = status {
            return result.fail(format!("RENDER_FAILED:{}", error.message));
        }

        wall_samples.push(timing::elapsed_ns(wall_start, wall_end));
        cpu_samples.push(cpu_end - cpu_start);
    }

    let mut result = result;
    result.stats = compute_stats(&mut wall_samples, &mut cpu_samples);
    result.decision = CaseDecision::Execute;

    if policy.generate_png {
        capture_artifact(&mut result, policy, &config, &output);
    }
    if policy.compare_ssim {
        compare_against_golden(&mut result, policy, &config, &output);
    }

    result
}

/// Write the rendered frame as a PNG. Failures are logged and never
/// demote the measurement.
fn capture_artifact(
    result: &mut CaseResult,
    policy: &BenchmarkPolicy,
    config: &SurfaceConfig,
    output: &[u8],
) {
    let file_name = artifacts::artifact_file_name(&result.scene_id, &result.backend_id, ".png");
    let path = policy.output_dir.join(file_name);
    match artifacts::write_png(&path, config.width, config.height, output) {
        Ok(()) => result.artifact_path = Some(path),
        Err(error) => warn!(
            "failed to write artifact for {}/{}: {error:#}",
            result.backend_id, result.scene_id
        ),
    }
}

fn compare_against_golden(
    result: &mut CaseResult,
    policy: &BenchmarkPolicy,
    config: &SurfaceConfig,
    output: &[u8],
) {
    let file_name = artifacts::artifact_file_name(&result.scene_id, &result.backend_id, ".png");
    let golden_path = policy.golden_dir.join(file_name);
    if !golden_path.exists() {
        result.ssim_message = Some("Golden image not found".to_owned());
        return;
    }
    result.golden_path = Some(golden_path.clone());

    let (golden_width, golden_height, golden) = match artifacts::read_png(&golden_path) {
        Ok(golden) => golden,
        Err(error) => {
            result.ssim_passed = Some(false);
            result.ssim_message = Some(format!("Failed to read golden image: {error:#}"));
            return;
        }
    };
    if golden_width != config.width || golden_height != config.height {
        result.ssim_passed = Some(false);
        result.ssim_message = Some("Dimension mismatch".to_owned());
        return;
    }

    let comparison = ssim::compare(config.width, config.height, output, &golden);
    result.ssim_score = Some(comparison.score);
    result.ssim_passed = Some(comparison.passed);
    result.ssim_message = Some(comparison.message);
}
