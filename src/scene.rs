//! Immutable, replay-ready scene representation.

use crate::ir::format::{
    self, FillRule, Opcode, PathVerb, IR_MAJOR_VERSION, IR_MINOR_VERSION,
};

/// A gradient stop: offset in [0, 1] plus a premultiplied RGBA8 color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: u32,
}

/// A paint definition. Colors are premultiplied RGBA8 with R in the low
/// byte of the u32.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid {
        color: u32,
    },
    Linear {
        start: (f32, f32),
        end: (f32, f32),
        stops: Vec<GradientStop>,
    },
    Radial {
        center: (f32, f32),
        radius: f32,
        stops: Vec<GradientStop>,
    },
}

/// Path geometry as a parallel verb/point pair. `points` holds (x, y)
/// pairs; the sum of point consumption over `verbs` equals
/// `points.len() / 2`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData {
    pub verbs: Vec<PathVerb>,
    pub points: Vec<f32>,
}

impl PathData {
    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.verbs.push(PathVerb::MoveTo);
        self.points.extend([x, y]);
        self
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.verbs.push(PathVerb::LineTo);
        self.points.extend([x, y]);
        self
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        self.verbs.push(PathVerb::QuadTo);
        self.points.extend([cx, cy, x, y]);
        self
    }

    pub fn cubic_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) -> &mut Self {
        self.verbs.push(PathVerb::CubicTo);
        self.points.extend([c1x, c1y, c2x, c2y, x, y]);
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.verbs.push(PathVerb::Close);
        self
    }

    /// Axis-aligned rectangle.
    pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Self {
        let mut path = Self::default();
        path.move_to(x, y)
            .line_to(x + w, y)
            .line_to(x + w, y + h)
            .line_to(x, y + h)
            .close();
        path
    }

    /// Circle approximated with four cubic beziers.
    pub fn circle(cx: f32, cy: f32, r: f32) -> Self {
        const K: f32 = 0.552_284_75;
        let mut path = Self::default();
        path.move_to(cx + r, cy)
            .cubic_to(cx + r, cy + r * K, cx + r * K, cy + r, cx, cy + r)
            .cubic_to(cx - r * K, cy + r, cx - r, cy + r * K, cx - r, cy)
            .cubic_to(cx - r, cy - r * K, cx - r * K, cy - r, cx, cy - r)
            .cubic_to(cx + r * K, cy - r, cx + r, cy - r * K, cx + r, cy)
            .close();
        path
    }

    /// Total (x, y) pairs the verb sequence consumes.
    pub fn consumed_points(&self) -> usize {
        self.verbs.iter().map(|verb| verb.point_count()).sum()
    }
}

/// Immutable prepared scene optimized for replay. Backends borrow the
/// paint and path tables read-only and iterate `command_stream` directly.
#[derive(Debug, Clone)]
pub struct PreparedScene {
    pub scene_id: String,
    /// Lowercase hex SHA-256 digest of the source bytes.
    pub scene_hash: String,
    pub ir_major_version: u8,
    pub ir_minor_version: u8,
    pub width: u32,
    pub height: u32,
    pub paints: Vec<Paint>,
    pub paths: Vec<PathData>,
    /// Canonical replay form, terminated by the End opcode.
    pub command_stream: Vec<u8>,
}

impl PreparedScene {
    /// Whether the scene is ready for rendering.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && !self.command_stream.is_empty()
    }

    /// Built-in 800x600 test scene: a solid red rectangle on a white
    /// background. Used as the `run` fallback and by harness tests.
    pub fn built_in_test_scene(width: u32, height: u32) -> Self {
        let red = Paint::Solid {
            color: format::pack_rgba8(0xFF, 0x00, 0x00, 0xFF),
        };
        let rect = PathData::rect(100.0, 100.0, 200.0, 150.0);

        let mut stream = Vec::new();
        stream.push(Opcode::Clear as u8);
        stream.extend(format::pack_rgba8(0xFF, 0xFF, 0xFF, 0xFF).to_le_bytes());
        stream.push(Opcode::SetFill as u8);
        stream.extend(0u16.to_le_bytes());
        stream.push(FillRule::NonZero as u8);
        stream.push(Opcode::FillPath as u8);
        stream.extend(0u16.to_le_bytes());
        stream.push(Opcode::End as u8);

        Self {
            scene_id: "test/simple_rect".to_owned(),
            scene_hash: "builtin".to_owned(),
            ir_major_version: IR_MAJOR_VERSION,
            ir_minor_version: IR_MINOR_VERSION,
            width,
            height,
            paints: vec![red],
            paths: vec![rect],
            command_stream: stream,
        }
    }
}
