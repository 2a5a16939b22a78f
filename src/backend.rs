//! The pluggable rasterizer contract.

use crate::capabilities::Capabilities;
use crate::scene::PreparedScene;
use crate::status::BenchError;

/// Backend identification and metadata.
#[derive(Debug, Clone)]
pub struct BackendInfo {
    /// Stable short identifier (e.g. "tiny_skia").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Library version string.
    pub version: String,
    /// CPU-only enforcement flag.
    pub cpu_only: bool,
}

/// Surface configuration for rendering.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
}

impl SurfaceConfig {
    pub fn for_scene(scene: &PreparedScene) -> Self {
        Self {
            width: scene.width,
            height: scene.height,
        }
    }

    /// Required output buffer length: width * height * 4 (RGBA8).
    pub fn buffer_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Initialization arguments for backends.
#[derive(Debug, Clone, Copy)]
pub struct BackendArgs {
    /// Thread count hint (0 = backend default).
    pub thread_count: u32,
}

impl Default for BackendArgs {
    fn default() -> Self {
        Self { thread_count: 1 }
    }
}

/// A pluggable rasterizer.
///
/// Lifecycle: `initialize` once per instance, `prepare` once per scene,
/// then any number of `render` calls, then `shutdown`. After `shutdown`
/// only `info`, `capabilities` and a fresh `initialize` are valid.
///
/// `render` is the hot path. The caller supplies a buffer of exactly
/// `width * height * 4` bytes whose contents are undefined on entry; the
/// backend must not resize or pre-fill it before interpreting the first
/// Clear opcode, must not touch the filesystem, log, or allocate in the
/// steady state, and must finish all rasterization before returning.
/// Output is premultiplied RGBA8 with a row stride of `width * 4`.
/// Repeated calls with the same scene and config must be bit-identical,
/// and backends advertising `parallel_render` must tolerate concurrent
/// calls on distinct buffers.
pub trait Backend: Send + Sync {
    fn info(&self) -> BackendInfo;

    fn capabilities(&self) -> Capabilities;

    fn initialize(&mut self, args: &BackendArgs) -> Result<(), BenchError>;

    /// Once per scene before any measured iteration; may allocate and
    /// cache derived data keyed by the scene.
    fn prepare(&mut self, scene: &PreparedScene) -> Result<(), BenchError>;

    fn render(
        &self,
        scene: &PreparedScene,
        config: &SurfaceConfig,
        output: &mut [u8],
    ) -> Result<(), BenchError>;

    fn shutdown(&mut self);
}
