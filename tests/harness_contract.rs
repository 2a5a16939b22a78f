use vgbench::backend::{Backend, BackendArgs, BackendInfo, SurfaceConfig};
use vgbench::backends::NullBackend;
use vgbench::capabilities::{Capabilities, RequiredFeatures};
use vgbench::harness::{run_case, BenchmarkPolicy, CaseDecision};
use vgbench::scene::PreparedScene;
use vgbench::status::BenchError;

/// Backend whose failure mode is scripted per test.
struct ScriptedBackend {
    caps: Capabilities,
    fail_prepare: Option<&'static str>,
    fail_render: Option<&'static str>,
}

impl ScriptedBackend {
    fn healthy() -> Self {
        Self {
            caps: Capabilities::all(),
            fail_prepare: None,
            fail_render: None,
        }
    }
}

impl Backend for ScriptedBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            id: "scripted".to_owned(),
            name: "Scripted test backend".to_owned(),
            version: "0.0.0".to_owned(),
            cpu_only: true,
        }
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn initialize(&mut self, _args: &BackendArgs) -> Result<(), BenchError> {
        Ok(())
    }

    fn prepare(&mut self, _scene: &PreparedScene) -> Result<(), BenchError> {
        match self.fail_prepare {
            Some(message) => Err(BenchError::fail(message)),
            None => Ok(()),
        }
    }

    fn render(
        &self,
        _scene: &PreparedScene,
        _config: &SurfaceConfig,
        _output: &mut [u8],
    ) -> Result<(), BenchError> {
        match self.fail_render {
            Some(message) => Err(BenchError::fail(message)),
            None => Ok(()),
        }
    }

    fn shutdown(&mut self) {}
}

fn initialized_null() -> NullBackend {
    let mut backend = NullBackend::new();
    backend.initialize(&BackendArgs::default()).expect("init");
    backend
}

#[test]
fn happy_path_executes_and_samples() {
    let scene = PreparedScene::built_in_test_scene(800, 600);
    let mut backend = initialized_null();
    let policy = BenchmarkPolicy {
        warmup_iters: 3,
        measure_iters: 10,
        ..BenchmarkPolicy::default()
    };

    let result = run_case(&mut backend, &scene, &RequiredFeatures::default(), &policy);

    assert_eq!(result.decision, CaseDecision::Execute);
    assert!(result.reasons.is_empty());
    assert_eq!(result.stats.sample_count, 10);
    assert!(result.stats.wall_p50_ns >= 0);
    assert!(result.stats.cpu_p50_ns >= 0);
    assert!(result.stats.wall_p90_ns >= result.stats.wall_p50_ns);
    assert_eq!(result.backend_id, "null");
    assert_eq!(result.scene_id, "test/simple_rect");
    assert_eq!((result.width, result.height), (800, 600));
}

#[test]
fn incompatible_scene_is_skipped() {
    let scene = PreparedScene::built_in_test_scene(100, 100);
    let mut backend = ScriptedBackend {
        caps: Capabilities {
            supports_evenodd: false,
            ..Capabilities::all()
        },
        ..ScriptedBackend::healthy()
    };
    let required = RequiredFeatures {
        needs_evenodd: true,
        ..RequiredFeatures::default()
    };

    let result = run_case(
        &mut backend,
        &scene,
        &required,
        &BenchmarkPolicy::default(),
    );

    assert_eq!(result.decision, CaseDecision::Skip);
    assert_eq!(result.reasons, vec!["UNSUPPORTED_FEATURE:evenodd".to_owned()]);
    assert_eq!(result.stats.sample_count, 0);
}

#[test]
fn thread_count_gate_skips_serial_backends() {
    let scene = PreparedScene::built_in_test_scene(100, 100);
    // Capabilities::all() leaves parallel_render off.
    let mut backend = ScriptedBackend::healthy();
    let policy = BenchmarkPolicy {
        thread_count: 4,
        ..BenchmarkPolicy::default()
    };

    let result = run_case(&mut backend, &scene, &RequiredFeatures::default(), &policy);

    assert_eq!(result.decision, CaseDecision::Skip);
    assert_eq!(
        result.reasons,
        vec!["UNSUPPORTED_FEATURE:parallel_render".to_owned()]
    );
}

#[test]
fn prepare_failure_reports_reason_and_no_samples() {
    let scene = PreparedScene::built_in_test_scene(100, 100);
    let mut backend = ScriptedBackend {
        fail_prepare: Some("boom"),
        ..ScriptedBackend::healthy()
    };

    let result = run_case(
        &mut backend,
        &scene,
        &RequiredFeatures::default(),
        &BenchmarkPolicy::default(),
    );

    assert_eq!(result.decision, CaseDecision::Fail);
    assert_eq!(result.reasons, vec!["PREPARE_FAILED:boom".to_owned()]);
    assert_eq!(result.stats.sample_count, 0);
}

#[test]
fn warmup_failure_is_distinguished_from_render_failure() {
    let scene = PreparedScene::built_in_test_scene(100, 100);
    let mut backend = ScriptedBackend {
        fail_render: Some("raster exploded"),
        ..ScriptedBackend::healthy()
    };

    let with_warmup = run_case(
        &mut backend,
        &scene,
        &RequiredFeatures::default(),
        &BenchmarkPolicy::default(),
    );
    assert_eq!(with_warmup.decision, CaseDecision::Fail);
    assert_eq!(
        with_warmup.reasons,
        vec!["WARMUP_FAILED:raster exploded".to_owned()]
    );

    let no_warmup_policy = BenchmarkPolicy {
        warmup_iters: 0,
        ..BenchmarkPolicy::default()
    };
    let measured = run_case(
        &mut backend,
        &scene,
        &RequiredFeatures::default(),
        &no_warmup_policy,
    );
    assert_eq!(measured.decision, CaseDecision::Fail);
    assert_eq!(
        measured.reasons,
        vec!["RENDER_FAILED:raster exploded".to_owned()]
    );
}

#[test]
fn ssim_without_golden_records_message_only() {
    let dir = tempfile::tempdir().expect("tempdir should create");
    let scene = PreparedScene::built_in_test_scene(64, 64);
    let mut backend = initialized_null();
    let policy = BenchmarkPolicy {
        compare_ssim: true,
        golden_dir: dir.path().join("golden"),
        ..BenchmarkPolicy::default()
    };

    let result = run_case(&mut backend, &scene, &RequiredFeatures::default(), &policy);

    assert_eq!(result.decision, CaseDecision::Execute);
    assert_eq!(result.ssim_message.as_deref(), Some("Golden image not found"));
    assert!(result.ssim_score.is_none());
    assert!(result.golden_path.is_none());
}

#[test]
fn artifact_capture_records_path() {
    let dir = tempfile::tempdir().expect("tempdir should create");
    let scene = PreparedScene::built_in_test_scene(64, 64);
    let mut backend = initialized_null();
    let policy = BenchmarkPolicy {
        generate_png: true,
        output_dir: dir.path().to_path_buf(),
        ..BenchmarkPolicy::default()
    };

    let result = run_case(&mut backend, &scene, &RequiredFeatures::default(), &policy);

    assert_eq!(result.decision, CaseDecision::Execute);
    let artifact = result.artifact_path.expect("artifact path recorded");
    assert!(artifact.ends_with("test_simple_rect_null.png"));
    assert!(artifact.exists());
}
