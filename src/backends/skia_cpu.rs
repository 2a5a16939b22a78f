//! tiny-skia reference backend.
//!
//! `prepare` converts the scene's paint and path tables into tiny-skia's
//! own types once; `render` only replays the command stream against those
//! caches, drawing straight into the caller's buffer.

use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, LinearGradient, Paint, PathBuilder, PixmapMut, Point,
    RadialGradient, Shader, SpreadMode, Stroke, Transform,
};

use crate::backend::{Backend, BackendArgs, BackendInfo, SurfaceConfig};
use crate::capabilities::Capabilities;
use crate::ir::format::{self, Opcode, PathVerb, StrokeCap, StrokeJoin};
use crate::scene::{self, PreparedScene};
use crate::status::BenchError;

#[derive(Default)]
pub struct SkiaCpuBackend {
    initialized: bool,
    prepared: Option<PreparedSkiaScene>,
}

struct PreparedSkiaScene {
    scene_hash: String,
    scene_id: String,
    paths: Vec<tiny_skia::Path>,
    paints: Vec<Paint<'static>>,
}

impl SkiaCpuBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for SkiaCpuBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            id: "tiny_skia".to_owned(),
            name: "tiny-skia CPU rasterizer".to_owned(),
            version: "0.11".to_owned(),
            cpu_only: true,
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_parallel_render: true,
            ..Capabilities::all()
        }
    }

    fn initialize(&mut self, _args: &BackendArgs) -> Result<(), BenchError> {
        self.initialized = true;
        Ok(())
    }

    fn prepare(&mut self, scene: &PreparedScene) -> Result<(), BenchError> {
        if !self.initialized {
            return Err(BenchError::fail("tiny_skia backend not initialized"));
        }
        if !scene.is_valid() {
            return Err(BenchError::invalid_arg("invalid scene"));
        }

        let mut paths = Vec::with_capacity(scene.paths.len());
        for (index, path) in scene.paths.iter().enumerate() {
            paths.push(convert_path(path).ok_or_else(|| {
                BenchError::fail(format!("path {index} produced no usable geometry"))
            })?);
        }

        let mut paints = Vec::with_capacity(scene.paints.len());
        for (index, paint) in scene.paints.iter().enumerate() {
            paints.push(convert_paint(paint).ok_or_else(|| {
                BenchError::fail(format!("paint {index} could not be converted"))
            })?);
        }

        self.prepared = Some(PreparedSkiaScene {
            scene_hash: scene.scene_hash.clone(),
            scene_id: scene.scene_id.clone(),
            paths,
            paints,
        });
        Ok(())
    }

    fn render(
        &self,
        scene: &PreparedScene,
        config: &SurfaceConfig,
        output: &mut [u8],
    ) -> Result<(), BenchError> {
        if !self.initialized {
            return Err(BenchError::fail("tiny_skia backend not initialized"));
        }
        let Some(prepared) = self.prepared.as_ref() else {
            return Err(BenchError::fail("render called before prepare"));
        };
        if prepared.scene_hash != scene.scene_hash || prepared.scene_id != scene.scene_id {
            return Err(BenchError::invalid_arg("scene does not match prepared cache"));
        }
        if config.width != scene.width || config.height != scene.height {
            return Err(BenchError::invalid_arg("surface does not match scene dimensions"));
        }
        if output.len() != config.buffer_len() {
            return Err(BenchError::invalid_arg("output buffer has the wrong size"));
        }

        replay(prepared, scene, config, output)
    }

    fn shutdown(&mut self) {
        self.prepared = None;
        self.initialized = false;
    }
}

#[derive(Clone, Copy)]
struct DrawState {
    transform: Transform,
    fill_paint: usize,
    fill_rule: FillRule,
    stroke_paint: usize,
    stroke_width: f32,
    stroke_cap: LineCap,
    stroke_join: LineJoin,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            fill_paint: 0,
            fill_rule: FillRule::Winding,
            stroke_paint: 0,
            stroke_width: 1.0,
            stroke_cap: LineCap::Butt,
            stroke_join: LineJoin::Miter,
        }
    }
}

fn replay(
    prepared: &PreparedSkiaScene,
    scene: &PreparedScene,
    config: &SurfaceConfig,
    output: &mut [u8],
) -> Result<(), BenchError> {
    let stream = &scene.command_stream;
    let mut pos = 0usize;
    let mut state = DrawState::default();
    let mut stack: Vec<DrawState> = Vec::new();

    loop {
        let Some(&op_byte) = stream.get(pos) else {
            return Err(BenchError::fail("command stream ended without End opcode"));
        };
        pos += 1;
        let Some(opcode) = Opcode::from_u8(op_byte) else {
            return Err(BenchError::fail(format!(
                "unsupported opcode 0x{op_byte:02x} in command stream"
            )));
        };

        match opcode {
            Opcode::End => return Ok(()),
            Opcode::Save => stack.push(state),
            Opcode::Restore => {
                state = stack
                    .pop()
                    .ok_or_else(|| BenchError::fail("Restore without matching Save"))?;
            }
            Opcode::Clear => {
                let color = read_u32(stream, &mut pos)?;
                // IR colors are already premultiplied RGBA8, which is the
                // buffer's storage format; write the pixel verbatim.
                let (r, g, b, a) = format::unpack_rgba8(color);
                let pixel = [r, g, b, a];
                for chunk in output.chunks_exact_mut(4) {
                    chunk.copy_from_slice(&pixel);
                }
            }
            Opcode::SetMatrix => {
                state.transform = read_transform(stream, &mut pos)?;
            }
            Opcode::ConcatMatrix => {
                let m = read_transform(stream, &mut pos)?;
                state.transform = state.transform.pre_concat(m);
            }
            Opcode::SetFill => {
                state.fill_paint = read_u16(stream, &mut pos)? as usize;
                state.fill_rule = match read_u8(stream, &mut pos)? {
                    0 => FillRule::Winding,
                    1 => FillRule::EvenOdd,
                    rule => {
                        return Err(BenchError::fail(format!("unknown fill rule {rule}")));
                    }
                };
            }
            Opcode::SetStroke => {
                state.stroke_paint = read_u16(stream, &mut pos)? as usize;
                state.stroke_width = read_f32(stream, &mut pos)?;
                let opts = read_u8(stream, &mut pos)?;
                state.stroke_cap = match format::unpack_stroke_cap(opts) {
                    Some(StrokeCap::Butt) | None => LineCap::Butt,
                    Some(StrokeCap::Round) => LineCap::Round,
                    Some(StrokeCap::Square) => LineCap::Square,
                };
                state.stroke_join = match format::unpack_stroke_join(opts) {
                    Some(StrokeJoin::Miter) | None => LineJoin::Miter,
                    Some(StrokeJoin::Round) => LineJoin::Round,
                    Some(StrokeJoin::Bevel) => LineJoin::Bevel,
                };
            }
            Opcode::FillPath => {
                let path_id = read_u16(stream, &mut pos)? as usize;
                let path = prepared
                    .paths
                    .get(path_id)
                    .ok_or_else(|| BenchError::fail(format!("path {path_id} out of range")))?;
                let paint = prepared.paints.get(state.fill_paint).ok_or_else(|| {
                    BenchError::fail(format!("paint {} out of range", state.fill_paint))
                })?;
                let mut pixmap = borrow_pixmap(output, config)?;
                pixmap.fill_path(path, paint, state.fill_rule, state.transform, None);
            }
            Opcode::StrokePath => {
                let path_id = read_u16(stream, &mut pos)? as usize;
                let path = prepared
                    .paths
                    .get(path_id)
                    .ok_or_else(|| BenchError::fail(format!("path {path_id} out of range")))?;
                let paint = prepared.paints.get(state.stroke_paint).ok_or_else(|| {
                    BenchError::fail(format!("paint {} out of range", state.stroke_paint))
                })?;
                let stroke = Stroke {
                    width: state.stroke_width,
                    line_cap: state.stroke_cap,
                    line_join: state.stroke_join,
                    ..Stroke::default()
                };
                let mut pixmap = borrow_pixmap(output, config)?;
                pixmap.stroke_path(path, paint, &stroke, state.transform, None);
            }
        }
    }
}

fn borrow_pixmap<'a>(
    output: &'a mut [u8],
    config: &SurfaceConfig,
) -> Result<PixmapMut<'a>, BenchError> {
    PixmapMut::from_bytes(output, config.width, config.height)
        .ok_or_else(|| BenchError::invalid_arg("output buffer does not match surface"))
}

fn convert_path(path: &scene::PathData) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    let mut point = 0usize;
    let pairs = path.points.len() / 2;
    let read = |index: usize| (path.points[index * 2], path.points[index * 2 + 1]);

    for verb in &path.verbs {
        if point + verb.point_count() > pairs {
            return None;
        }
        match verb {
            PathVerb::MoveTo => {
                let (x, y) = read(point);
                builder.move_to(x, y);
                point += 1;
            }
            PathVerb::LineTo => {
                let (x, y) = read(point);
                builder.line_to(x, y);
                point += 1;
            }
            PathVerb::QuadTo => {
                let (cx, cy) = read(point);
                let (x, y) = read(point + 1);
                builder.quad_to(cx, cy, x, y);
                point += 2;
            }
            PathVerb::CubicTo => {
                let (c1x, c1y) = read(point);
                let (c2x, c2y) = read(point + 1);
                let (x, y) = read(point + 2);
                builder.cubic_to(c1x, c1y, c2x, c2y, x, y);
                point += 3;
            }
            PathVerb::Close => builder.close(),
        }
    }
    builder.finish()
}

fn convert_paint(paint: &scene::Paint) -> Option<Paint<'static>> {
    let shader = match paint {
        scene::Paint::Solid { color } => Shader::SolidColor(color_from_premul(*color)),
        scene::Paint::Linear { start, end, stops } => LinearGradient::new(
            Point::from_xy(start.0, start.1),
            Point::from_xy(end.0, end.1),
            convert_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        )?,
        scene::Paint::Radial {
            center,
            radius,
            stops,
        } => RadialGradient::new(
            Point::from_xy(center.0, center.1),
            Point::from_xy(center.0, center.1),
            *radius,
            convert_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        )?,
    };

    let mut converted = Paint::default();
    converted.shader = shader;
    converted.anti_alias = true;
    Some(converted)
}

fn convert_stops(stops: &[scene::GradientStop]) -> Vec<tiny_skia::GradientStop> {
    stops
        .iter()
        .map(|stop| tiny_skia::GradientStop::new(stop.offset, color_from_premul(stop.color)))
        .collect()
}

/// Demultiply an IR premultiplied RGBA8 color into tiny-skia's straight
/// color representation.
fn color_from_premul(color: u32) -> Color {
    let (r, g, b, a) = format::unpack_rgba8(color);
    if a == 0 {
        return Color::from_rgba8(0, 0, 0, 0);
    }
    if a == 255 {
        return Color::from_rgba8(r, g, b, a);
    }
    let alpha = u16::from(a);
    let demul = |value: u8| ((u16::from(value) * 255 + alpha / 2) / alpha).min(255) as u8;
    Color::from_rgba8(demul(r), demul(g), demul(b), a)
}

fn read_u8(stream: &[u8], pos: &mut usize) -> Result<u8, BenchError> {
    let byte = *stream
        .get(*pos)
        .ok_or_else(|| BenchError::fail("command payload truncated"))?;
    *pos += 1;
    Ok(byte)
}

fn read_u16(stream: &[u8], pos: &mut usize) -> Result<u16, BenchError> {
    let slice = stream
        .get(*pos..*pos + 2)
        .ok_or_else(|| BenchError::fail("command payload truncated"))?;
    *pos += 2;
    Ok(u16::from_le_bytes(slice.try_into().expect("length 2")))
}

fn read_u32(stream: &[u8], pos: &mut usize) -> Result<u32, BenchError> {
    let slice = stream
        .get(*pos..*pos + 4)
        .ok_or_else(|| BenchError::fail("command payload truncated"))?;
    *pos += 4;
    Ok(u32::from_le_bytes(slice.try_into().expect("length 4")))
}

fn read_f32(stream: &[u8], pos: &mut usize) -> Result<f32, BenchError> {
    read_u32(stream, pos).map(f32::from_bits)
}

fn read_transform(stream: &[u8], pos: &mut usize) -> Result<Transform, BenchError> {
    let mut m = [0.0f32; 6];
    for value in &mut m {
        *value = read_f32(stream, pos)?;
    }
    Ok(Transform::from_row(m[0], m[1], m[2], m[3], m[4], m[5]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_the_built_in_scene() {
        let scene = PreparedScene::built_in_test_scene(64, 64);
        let mut backend = SkiaCpuBackend::new();
        backend.initialize(&BackendArgs::default()).expect("init");
        backend.prepare(&scene).expect("prepare");

        let config = SurfaceConfig::for_scene(&scene);
        let mut buffer = vec![0u8; config.buffer_len()];
        backend.render(&scene, &config, &mut buffer).expect("render");

        // (2, 2) is background; the rect starts at (100, 100) and is off
        // a 64x64 canvas, so everything should be white.
        let pixel = &buffer[(2 * 64 + 2) * 4..(2 * 64 + 2) * 4 + 4];
        assert_eq!(pixel, &[255, 255, 255, 255]);
    }

    #[test]
    fn render_rejects_unprepared_scene() {
        let scene = PreparedScene::built_in_test_scene(16, 16);
        let mut backend = SkiaCpuBackend::new();
        backend.initialize(&BackendArgs::default()).expect("init");

        let config = SurfaceConfig::for_scene(&scene);
        let mut buffer = vec![0u8; config.buffer_len()];
        assert!(backend.render(&scene, &config, &mut buffer).is_err());
    }

    #[test]
    fn premultiplied_colors_demultiply() {
        // 50% translucent premultiplied red: r = 128, a = 128.
        let color = color_from_premul(format::pack_rgba8(128, 0, 0, 128));
        assert!(color.red() > 0.99);
        assert!((color.alpha() - 128.0 / 255.0).abs() < 0.01);
    }
}
