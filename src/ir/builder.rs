//! Authoring API that emits binary IR scene files.
//!
//! The builder accumulates paint and path tables plus a command stream,
//! then serializes the section layout with a checksummed header. It is
//! the round-trip counterpart of the decoder and backs the built-in
//! scenes used by tests and the `run` fallback.

use crate::ir::format::{
    self, FillRule, Opcode, PaintKind, SectionType, StrokeCap, StrokeJoin, HEADER_SIZE,
    IR_MAGIC, IR_MAJOR_VERSION, IR_MINOR_VERSION, SECTION_HEADER_SIZE,
};
use crate::scene::{Paint, PathData};

#[derive(Debug, Clone)]
pub struct IrBuilder {
    width: u32,
    height: u32,
    paints: Vec<Paint>,
    paths: Vec<PathData>,
    commands: Vec<u8>,
}

impl IrBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            paints: Vec::new(),
            paths: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Add a paint and return its table index.
    pub fn add_paint(&mut self, paint: Paint) -> u16 {
        let index = self.paints.len() as u16;
        self.paints.push(paint);
        index
    }

    /// Add a solid paint from straight RGBA components.
    pub fn add_solid(&mut self, r: u8, g: u8, b: u8, a: u8) -> u16 {
        self.add_paint(Paint::Solid {
            color: format::pack_rgba8(r, g, b, a),
        })
    }

    /// Add a path and return its table index.
    pub fn add_path(&mut self, path: PathData) -> u16 {
        let index = self.paths.len() as u16;
        self.paths.push(path);
        index
    }

    pub fn clear(&mut self, r: u8, g: u8, b: u8, a: u8) -> &mut Self {
        self.commands.push(Opcode::Clear as u8);
        self.commands
            .extend(format::pack_rgba8(r, g, b, a).to_le_bytes());
        self
    }

    pub fn save(&mut self) -> &mut Self {
        self.commands.push(Opcode::Save as u8);
        self
    }

    pub fn restore(&mut self) -> &mut Self {
        self.commands.push(Opcode::Restore as u8);
        self
    }

    pub fn set_matrix(&mut self, m: [f32; 6]) -> &mut Self {
        self.commands.push(Opcode::SetMatrix as u8);
        for value in m {
            self.commands.extend(value.to_le_bytes());
        }
        self
    }

    pub fn concat_matrix(&mut self, m: [f32; 6]) -> &mut Self {
        self.commands.push(Opcode::ConcatMatrix as u8);
        for value in m {
            self.commands.extend(value.to_le_bytes());
        }
        self
    }

    pub fn set_fill(&mut self, paint_id: u16, rule: FillRule) -> &mut Self {
        self.commands.push(Opcode::SetFill as u8);
        self.commands.extend(paint_id.to_le_bytes());
        self.commands.push(rule as u8);
        self
    }

    pub fn set_stroke(
        &mut self,
        paint_id: u16,
        width: f32,
        cap: StrokeCap,
        join: StrokeJoin,
    ) -> &mut Self {
        self.commands.push(Opcode::SetStroke as u8);
        self.commands.extend(paint_id.to_le_bytes());
        self.commands.extend(width.to_le_bytes());
        self.commands.push(format::pack_stroke_options(cap, join));
        self
    }

    pub fn fill_path(&mut self, path_id: u16) -> &mut Self {
        self.commands.push(Opcode::FillPath as u8);
        self.commands.extend(path_id.to_le_bytes());
        self
    }

    pub fn stroke_path(&mut self, path_id: u16) -> &mut Self {
        self.commands.push(Opcode::StrokePath as u8);
        self.commands.extend(path_id.to_le_bytes());
        self
    }

    /// Serialize the complete binary: header, Info, Paint, Path and
    /// Command sections.
    pub fn build(&self) -> Vec<u8> {
        let mut sections = Vec::new();
        append_section(&mut sections, SectionType::Info, &self.info_payload());
        if !self.paints.is_empty() {
            append_section(&mut sections, SectionType::Paint, &self.paint_payload());
        }
        if !self.paths.is_empty() {
            append_section(&mut sections, SectionType::Path, &self.path_payload());
        }
        append_section(&mut sections, SectionType::Command, &self.command_payload());

        let total_size = (HEADER_SIZE + sections.len()) as u32;
        let crc = format::crc32(&sections);

        let mut bytes = Vec::with_capacity(total_size as usize);
        bytes.extend(IR_MAGIC);
        bytes.push(IR_MAJOR_VERSION);
        bytes.push(IR_MINOR_VERSION);
        bytes.extend(0u16.to_le_bytes());
        bytes.extend(total_size.to_le_bytes());
        bytes.extend(crc.to_le_bytes());
        bytes.extend(sections);
        bytes
    }

    fn info_payload(&self) -> Vec<u8> {
        let entries = [
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
        ];
        let mut payload = Vec::new();
        payload.extend((entries.len() as u16).to_le_bytes());
        for (key, value) in entries {
            payload.extend((key.len() as u16).to_le_bytes());
            payload.extend(key.as_bytes());
            payload.extend((value.len() as u16).to_le_bytes());
            payload.extend(value.as_bytes());
        }
        payload
    }

    fn paint_payload(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend((self.paints.len() as u16).to_le_bytes());
        for paint in &self.paints {
            match paint {
                Paint::Solid { color } => {
                    payload.push(PaintKind::Solid as u8);
                    payload.extend(color.to_le_bytes());
                }
                Paint::Linear { start, end, stops } => {
                    payload.push(PaintKind::Linear as u8);
                    payload.extend(start.0.to_le_bytes());
                    payload.extend(start.1.to_le_bytes());
                    payload.extend(end.0.to_le_bytes());
                    payload.extend(end.1.to_le_bytes());
                    payload.extend((stops.len() as u16).to_le_bytes());
                    for stop in stops {
                        payload.extend(stop.offset.to_le_bytes());
                        payload.extend(stop.color.to_le_bytes());
                    }
                }
                Paint::Radial {
                    center,
                    radius,
                    stops,
                } => {
                    payload.push(PaintKind::Radial as u8);
                    payload.extend(center.0.to_le_bytes());
                    payload.extend(center.1.to_le_bytes());
                    payload.extend(radius.to_le_bytes());
                    payload.extend((stops.len() as u16).to_le_bytes());
                    for stop in stops {
                        payload.extend(stop.offset.to_le_bytes());
                        payload.extend(stop.color.to_le_bytes());
                    }
                }
            }
        }
        payload
    }

    fn path_payload(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend((self.paths.len() as u16).to_le_bytes());
        for path in &self.paths {
            payload.extend((path.verbs.len() as u16).to_le_bytes());
            payload.extend((path.points.len() as u16).to_le_bytes());
            for verb in &path.verbs {
                payload.push(*verb as u8);
            }
            for point in &path.points {
                payload.extend(point.to_le_bytes());
            }
        }
        payload
    }

    fn command_payload(&self) -> Vec<u8> {
        let mut payload = self.commands.clone();
        payload.push(Opcode::End as u8);
        payload
    }
}

fn append_section(out: &mut Vec<u8>, section_type: SectionType, payload: &[u8]) {
    let length = (SECTION_HEADER_SIZE + payload.len()) as u32;
    out.push(section_type as u8);
    out.push(0);
    out.extend(length.to_le_bytes());
    out.extend(payload);
}

/// The built-in test scene, in its encoded form: a red rectangle on a
/// white background.
pub fn simple_rect_scene(width: u32, height: u32) -> IrBuilder {
    let mut builder = IrBuilder::new(width, height);
    let red = builder.add_solid(255, 0, 0, 255);
    let rect = builder.add_path(PathData::rect(100.0, 100.0, 200.0, 150.0));
    builder
        .clear(255, 255, 255, 255)
        .set_fill(red, FillRule::NonZero)
        .fill_path(rect);
    builder
}

/// A denser built-in scene: solid-filled rectangles and circles.
pub fn solid_basic_scene(width: u32, height: u32) -> IrBuilder {
    let mut builder = IrBuilder::new(width, height);
    let red = builder.add_solid(255, 0, 0, 255);
    let green = builder.add_solid(0, 255, 0, 255);
    let blue = builder.add_solid(0, 0, 255, 255);
    let yellow = builder.add_solid(255, 255, 0, 255);

    let rect1 = builder.add_path(PathData::rect(50.0, 50.0, 200.0, 150.0));
    let rect2 = builder.add_path(PathData::rect(300.0, 50.0, 200.0, 150.0));
    let rect3 = builder.add_path(PathData::rect(550.0, 50.0, 200.0, 150.0));
    let circle1 = builder.add_path(PathData::circle(150.0, 400.0, 100.0));
    let circle2 = builder.add_path(PathData::circle(400.0, 400.0, 80.0));
    let circle3 = builder.add_path(PathData::circle(650.0, 400.0, 60.0));

    builder
        .clear(255, 255, 255, 255)
        .set_fill(red, FillRule::NonZero)
        .fill_path(rect1)
        .set_fill(green, FillRule::NonZero)
        .fill_path(rect2)
        .set_fill(blue, FillRule::NonZero)
        .fill_path(rect3)
        .set_fill(yellow, FillRule::NonZero)
        .fill_path(circle1)
        .set_fill(red, FillRule::NonZero)
        .fill_path(circle2)
        .set_fill(blue, FillRule::NonZero)
        .fill_path(circle3);
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_total_size_and_crc() {
        let bytes = simple_rect_scene(800, 600).build();
        assert_eq!(&bytes[0..4], b"VGIR");
        let total_size = u32::from_le_bytes(bytes[8..12].try_into().expect("size"));
        assert_eq!(total_size as usize, bytes.len());
        let crc = u32::from_le_bytes(bytes[12..16].try_into().expect("crc"));
        assert_eq!(crc, format::crc32(&bytes[HEADER_SIZE..]));
    }

    #[test]
    fn command_payload_is_end_terminated() {
        let builder = simple_rect_scene(64, 64);
        let payload = builder.command_payload();
        assert_eq!(*payload.last().expect("payload"), Opcode::End as u8);
    }
}
