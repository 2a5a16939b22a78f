//! Null backend: implements the full contract without rendering.
//!
//! Exists so the harness, hot-path allocation checks, and reporting can
//! be exercised without a real rasterizer.

use crate::backend::{Backend, BackendArgs, BackendInfo, SurfaceConfig};
use crate::capabilities::Capabilities;
use crate::scene::PreparedScene;
use crate::status::BenchError;

#[derive(Debug, Default)]
pub struct NullBackend {
    initialized: bool,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for NullBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            id: "null".to_owned(),
            name: "Null Backend (Debug/Testing)".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            cpu_only: true,
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn initialize(&mut self, _args: &BackendArgs) -> Result<(), BenchError> {
        self.initialized = true;
        Ok(())
    }

    fn prepare(&mut self, _scene: &PreparedScene) -> Result<(), BenchError> {
        if !self.initialized {
            return Err(BenchError::fail("null backend not initialized"));
        }
        Ok(())
    }

    fn render(
        &self,
        scene: &PreparedScene,
        config: &SurfaceConfig,
        _output: &mut [u8],
    ) -> Result<(), BenchError> {
        if !self.initialized {
            return Err(BenchError::fail("null backend not initialized"));
        }
        if !scene.is_valid() {
            return Err(BenchError::invalid_arg("invalid scene"));
        }
        if config.width == 0 || config.height == 0 {
            return Err(BenchError::invalid_arg("invalid surface configuration"));
        }
        // Buffer contents stay undefined: the null backend draws nothing.
        Ok(())
    }

    fn shutdown(&mut self) {
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_requires_initialize() {
        let backend = NullBackend::new();
        let scene = PreparedScene::built_in_test_scene(16, 16);
        let config = SurfaceConfig::for_scene(&scene);
        let mut buffer = vec![0u8; config.buffer_len()];
        assert!(backend.render(&scene, &config, &mut buffer).is_err());
    }

    #[test]
    fn shutdown_then_initialize_recovers() {
        let mut backend = NullBackend::new();
        backend.initialize(&BackendArgs::default()).expect("init");
        backend.shutdown();
        backend.initialize(&BackendArgs::default()).expect("re-init");
        let scene = PreparedScene::built_in_test_scene(16, 16);
        backend.prepare(&scene).expect("prepare");
    }
}
