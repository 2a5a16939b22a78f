use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::warn;

use vgbench::backends::BackendCatalog;
use vgbench::capabilities::RequiredFeatures;
use vgbench::harness::{run_case, BenchmarkPolicy, CaseDecision, CaseResult};
use vgbench::ir::{builder, decoder};
use vgbench::report::{self, RunMetadata};
use vgbench::scene::PreparedScene;
use vgbench::scene_catalog::SceneCatalog;
use vgbench::{environment, timing, BackendArgs};

const DEFAULT_MANIFEST: &str = "assets/scenes/manifest.json";
const DEFAULT_ASSETS_DIR: &str = "assets/scenes";

#[derive(Debug, Parser)]
#[command(name = "vgbench")]
#[command(about = "Benchmark CPU-only 2D vector graphics rasterizers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run benchmarks and emit reports.
    Run {
        /// Backend ids to benchmark (default: all registered).
        #[arg(long, value_delimiter = ',')]
        backends: Vec<String>,
        /// Scene ids or .irbin paths to benchmark.
        #[arg(long, value_delimiter = ',')]
        scenes: Vec<String>,
        /// Benchmark every scene in the manifest.
        #[arg(long)]
        all_scenes: bool,
        /// Scene manifest path.
        #[arg(long, default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,
        /// Untimed warm-up iterations per case.
        #[arg(long, default_value_t = 3)]
        warmup: u32,
        /// Measured iterations per case.
        #[arg(long, default_value_t = 10)]
        iterations: u32,
        #[arg(long, default_value_t = 1)]
        repetitions: u32,
        /// Thread count hint passed to backends.
        #[arg(long, default_value_t = 1)]
        threads: u32,
        /// Directory for reports and artifacts.
        #[arg(short = 'o', long, default_value = ".")]
        output_dir: PathBuf,
        /// Report format: json, csv, or both.
        #[arg(long, default_value = "json")]
        format: String,
        /// Skip the human-readable summary.
        #[arg(long)]
        no_summary: bool,
        /// Capture each rendered frame as a PNG artifact.
        #[arg(long)]
        generate_png: bool,
        /// Compare rendered frames against golden images.
        #[arg(long)]
        compare_ssim: bool,
        /// Directory holding golden images.
        #[arg(long, default_value = "golden")]
        golden_dir: PathBuf,
        /// Stop dispatching cases after the first non-Execute decision.
        #[arg(long)]
        fail_fast: bool,
    },
    /// List registered backends and available scenes.
    List {
        #[arg(long, default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,
    },
    /// Print environment metadata.
    Metadata,
    /// Validate .irbin scene files.
    Validate {
        /// Scene files to validate.
        files: Vec<PathBuf>,
        /// Also spot-check the CPU timer against wall time.
        #[arg(long)]
        timer: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            backends,
            scenes,
            all_scenes,
            manifest,
            warmup,
            iterations,
            repetitions,
            threads,
            output_dir,
            format,
            no_summary,
            generate_png,
            compare_ssim,
            golden_dir,
            fail_fast,
        } => {
            let policy = BenchmarkPolicy {
                warmup_iters: warmup,
                measure_iters: iterations,
                repetitions,
                thread_count: threads,
                generate_png,
                compare_ssim,
                output_dir: output_dir.clone(),
                golden_dir,
            };
            run_command(RunOptions {
                backends,
                scenes,
                all_scenes,
                manifest,
                output_dir,
                format,
                print_summary: !no_summary,
                fail_fast,
                policy,
            })
        }
        Commands::List { manifest } => list_command(&manifest),
        Commands::Metadata => metadata_command(),
        Commands::Validate { files, timer } => validate_command(&files, timer),
    }
}

struct RunOptions {
    backends: Vec<String>,
    scenes: Vec<String>,
    all_scenes: bool,
    manifest: PathBuf,
    output_dir: PathBuf,
    format: String,
    print_summary: bool,
    fail_fast: bool,
    policy: BenchmarkPolicy,
}

fn run_command(options: RunOptions) -> Result<()> {
    let catalog = BackendCatalog::with_builtin_backends();

    let mut backend_ids = if options.backends.is_empty() {
        catalog.ids()
    } else {
        options.backends.clone()
    };
    backend_ids.sort();
    backend_ids.dedup();
    if backend_ids.is_empty() {
        bail!("no backends available");
    }

    let scene_catalog = load_scene_catalog(&options.manifest);
    let mut scenes = collect_scenes(&options, scene_catalog.as_ref());
    if scenes.is_empty() {
        let bytes = builder::simple_rect_scene(800, 600).build();
        let scene =
            decoder::prepare(&bytes, "test/simple_rect").expect("built-in scene must decode");
        scenes.push((scene, RequiredFeatures::default()));
    }
    scenes.sort_by(|a, b| a.0.scene_id.cmp(&b.0.scene_id));

    let mut results: Vec<CaseResult> = Vec::new();
    let mut stop_dispatch = false;
    for backend_id in &backend_ids {
        if stop_dispatch {
            break;
        }
        let Some(mut backend) = catalog.create(backend_id) else {
            warn!("backend '{backend_id}' not found, skipping");
            continue;
        };
        let args = BackendArgs {
            thread_count: options.policy.thread_count,
        };
        if let Err(error) = backend.initialize(&args) {
            warn!("failed to initialize '{backend_id}': {error}");
            continue;
        }

        for (scene, required) in &scenes {
            let result = run_case(backend.as_mut(), scene, required, &options.policy);
            let decision = result.decision;
            results.push(result);
            if options.fail_fast && decision != CaseDecision::Execute {
                stop_dispatch = true;
                break;
            }
        }

        backend.shutdown();
    }

    let metadata = RunMetadata {
        timestamp: environment::timestamp_rfc3339(),
        suite_version: env!("CARGO_PKG_VERSION").to_owned(),
        git_commit: environment::git_commit().to_owned(),
        environment: environment::collect(),
        policy: (&options.policy).into(),
    };

    if options.print_summary {
        report::print_summary(&metadata, &results);
    }

    if options.format == "json" || options.format == "both" {
        let json_path = options.output_dir.join("results.json");
        match report::write_json(&json_path, &metadata, &results) {
            Ok(()) => println!("JSON output: {}", json_path.display()),
            Err(error) => warn!("error writing JSON report: {error:#}"),
        }
    }
    if options.format == "csv" || options.format == "both" {
        let csv_path = options.output_dir.join("results.csv");
        match report::write_csv(&csv_path, &results) {
            Ok(()) => println!("CSV output: {}", csv_path.display()),
            Err(error) => warn!("error writing CSV report: {error:#}"),
        }
    }

    Ok(())
}

fn load_scene_catalog(manifest: &Path) -> Option<SceneCatalog> {
    if !manifest.exists() {
        return None;
    }
    match SceneCatalog::load(manifest) {
        Ok(catalog) => Some(catalog),
        Err(error) => {
            warn!("failed to load scene manifest: {error:#}");
            None
        }
    }
}

/// Resolve requested scenes: manifest entries when `--all-scenes`,
/// otherwise each `--scenes` argument as a literal path, a manifest id,
/// or `<assets>/<id>.irbin`, in that order.
fn collect_scenes(
    options: &RunOptions,
    catalog: Option<&SceneCatalog>,
) -> Vec<(PreparedScene, RequiredFeatures)> {
    let mut scenes = Vec::new();

    if options.all_scenes {
        if let Some(catalog) = catalog {
            for scene_id in catalog.scene_ids() {
                let Some(path) = catalog.scene_path(&scene_id) else {
                    continue;
                };
                if let Some(scene) = load_scene(&path, &scene_id) {
                    let required = catalog
                        .info(&scene_id)
                        .map(|info| info.required_features)
                        .unwrap_or_default();
                    scenes.push((scene, required));
                }
            }
            println!("Loaded {} scenes from manifest", scenes.len());
        }
        return scenes;
    }

    for scene_arg in &options.scenes {
        let path = PathBuf::from(scene_arg);
        if path.extension().is_some_and(|ext| ext == "irbin") || path.exists() {
            let scene_id = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| scene_arg.clone());
            if let Some(scene) = load_scene(&path, &scene_id) {
                scenes.push((scene, RequiredFeatures::default()));
                println!("Loaded scene: {scene_arg}");
            }
            continue;
        }

        if let Some(catalog) = catalog {
            if let Some(path) = catalog.scene_path(scene_arg) {
                if path.exists() {
                    if let Some(scene) = load_scene(&path, scene_arg) {
                        let required = catalog
                            .info(scene_arg)
                            .map(|info| info.required_features)
                            .unwrap_or_default();
                        scenes.push((scene, required));
                        println!("Loaded scene: {scene_arg}");
                    }
                    continue;
                }
            }
        }

        let asset_path = Path::new(DEFAULT_ASSETS_DIR).join(format!("{scene_arg}.irbin"));
        if asset_path.exists() {
            if let Some(scene) = load_scene(&asset_path, scene_arg) {
                scenes.push((scene, RequiredFeatures::default()));
                println!("Loaded scene: {scene_arg}");
            }
        } else {
            warn!("scene not found: {scene_arg}");
        }
    }

    scenes
}

fn load_scene(path: &Path, scene_id: &str) -> Option<PreparedScene> {
    let bytes = match decoder::load_bytes(path) {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!("failed to load scene {scene_id}: {error:#}");
            return None;
        }
    };
    match decoder::prepare(&bytes, scene_id) {
        Ok(scene) => Some(scene),
        Err(error) => {
            warn!("failed to parse scene {scene_id}: {error:#}");
            None
        }
    }
}

fn list_command(manifest: &Path) -> Result<()> {
    let catalog = BackendCatalog::with_builtin_backends();
    println!("Available Backends:");
    for id in catalog.ids() {
        println!("  - {id}");
    }

    println!();
    println!("Available Scenes:");
    println!("  - test/simple_rect (built-in test scene)");
    if let Some(scene_catalog) = load_scene_catalog(manifest) {
        for scene_id in scene_catalog.scene_ids() {
            match scene_catalog.info(&scene_id) {
                Some(info) if !info.description.is_empty() => {
                    println!("  - {} ({})", scene_id, info.description);
                }
                _ => println!("  - {scene_id}"),
            }
        }
    }
    Ok(())
}

fn metadata_command() -> Result<()> {
    let env = environment::collect();
    println!("Environment Metadata:");
    println!("  OS:        {} {}", env.os_name, env.os_version);
    println!("  Arch:      {}", env.arch);
    println!("  CPU:       {}", env.cpu_model);
    println!("  Cores:     {}", env.cpu_cores);
    println!("  Memory:    {} MB", env.memory_bytes / (1024 * 1024));
    println!("  Compiler:  {} {}", env.compiler_name, env.compiler_version);
    println!("  CPU Time:  {}", timing::cpu_time_semantics());
    println!(
        "  CPU Freq:  {:.1} MHz (est)",
        timing::cpu_frequency_hz() as f64 / 1_000_000.0
    );
    println!();
    println!("Build Info:");
    println!("  Version:   {}", env!("CARGO_PKG_VERSION"));
    println!("  Enabled Backends:");
    for id in BackendCatalog::with_builtin_backends().ids() {
        println!("    - {id}");
    }
    Ok(())
}

fn validate_command(files: &[PathBuf], timer: bool) -> Result<()> {
    if timer {
        validate_timer();
    }
    if files.is_empty() && !timer {
        bail!("nothing to validate: pass .irbin files or --timer");
    }

    let mut invalid = 0usize;
    for file in files {
        let bytes = decoder::load_bytes(file)?;
        let report = decoder::validate(&bytes);
        if report.is_valid() {
            println!("OK: {}", file.display());
        } else {
            invalid += 1;
            println!("INVALID: {}", file.display());
            for error in &report.errors {
                println!("  error: {error}");
            }
        }
        for warning in &report.warnings {
            println!("  warning: {warning}");
        }
    }

    if invalid > 0 {
        bail!("{invalid} of {} files failed validation", files.len());
    }
    Ok(())
}

fn validate_timer() {
    println!("Validating CPU timer accuracy...");
    let wall_start = timing::now_monotonic();
    let cpu_start = timing::cpu_time_ns();

    // Busy wait for 100ms.
    while timing::now_monotonic().duration_since(wall_start) < Duration::from_millis(100) {
        std::hint::spin_loop();
    }

    let wall_end = timing::now_monotonic();
    let cpu_end = timing::cpu_time_ns();

    println!(
        "  Wall Time: {:.1} ms",
        timing::to_ms(timing::elapsed_ns(wall_start, wall_end))
    );
    println!("  CPU Time:  {:.1} ms", timing::to_ms(cpu_end - cpu_start));
    println!("  Semantics: {}", timing::cpu_time_semantics());
}
