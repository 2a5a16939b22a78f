use vgbench::backend::{Backend, BackendArgs, SurfaceConfig};
use vgbench::backends::SkiaCpuBackend;
use vgbench::ir::builder::solid_basic_scene;
use vgbench::ir::decoder::prepare;

/// Backends advertising parallel render must produce bit-identical
/// output from concurrent calls on distinct buffers.
#[test]
fn concurrent_renders_are_bit_identical() {
    let bytes = solid_basic_scene(400, 300).build();
    let scene = prepare(&bytes, "fills/solid_basic").expect("decode");

    let mut backend = SkiaCpuBackend::new();
    backend.initialize(&BackendArgs::default()).expect("init");
    backend.prepare(&scene).expect("prepare");
    assert!(backend.capabilities().supports_parallel_render);

    let config = SurfaceConfig::for_scene(&scene);
    const THREADS: usize = 4;
    let mut buffers = vec![vec![0u8; config.buffer_len()]; THREADS];

    let backend_ref = &backend;
    let scene_ref = &scene;
    std::thread::scope(|scope| {
        for buffer in &mut buffers {
            scope.spawn(move || {
                backend_ref
                    .render(scene_ref, &config, buffer)
                    .expect("concurrent render");
            });
        }
    });

    for buffer in &buffers[1..] {
        assert_eq!(buffer, &buffers[0], "buffers must match bit for bit");
    }
}
