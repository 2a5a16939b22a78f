//! Validating decoder for binary IR scene files.
//!
//! `validate` accumulates errors and warnings without bailing early
//! wherever the layout still permits forward progress; `prepare` runs the
//! same pass and materializes an immutable [`PreparedScene`]. The decoder
//! never mutates its input and never retains a reference to it.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};

use crate::ir::format::{
    self, Opcode, PaintKind, PathVerb, SectionType, HEADER_SIZE, IR_MAGIC, IR_MAJOR_VERSION,
    SECTION_HEADER_SIZE,
};
use crate::scene::{GradientStop, Paint, PathData, PreparedScene};

/// Accumulated findings from a validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Read a scene file into memory.
pub fn load_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read scene file {}", path.display()))
}

/// Lowercase hex SHA-256 digest of the source bytes.
pub fn scene_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

/// Validate a scene file, accumulating all findings.
pub fn validate(bytes: &[u8]) -> ValidationReport {
    let mut report = ValidationReport::default();
    decode_internal(bytes, &mut report);
    report
}

/// Validate and decode a scene file into its replay-ready form.
pub fn prepare(bytes: &[u8], scene_id: &str) -> Result<PreparedScene> {
    let mut report = ValidationReport::default();
    let decoded = decode_internal(bytes, &mut report);
    if !report.is_valid() {
        bail!("scene validation failed: {}", report.errors.join("; "));
    }

    Ok(PreparedScene {
        scene_id: scene_id.to_owned(),
        scene_hash: scene_hash(bytes),
        ir_major_version: bytes[4],
        ir_minor_version: bytes[5],
        width: decoded.width,
        height: decoded.height,
        paints: decoded.paints,
        paths: decoded.paths,
        command_stream: decoded.command_stream,
    })
}

#[derive(Debug, Default)]
struct Decoded {
    width: u32,
    height: u32,
    paints: Vec<Paint>,
    paths: Vec<PathData>,
    command_stream: Vec<u8>,
}

fn decode_internal(bytes: &[u8], report: &mut ValidationReport) -> Decoded {
    let mut decoded = Decoded {
        width: 800,
        height: 600,
        ..Decoded::default()
    };

    if bytes.len() < HEADER_SIZE {
        report
            .errors
            .push("file too small: missing 16-byte header".to_owned());
        return decoded;
    }
    if bytes[0..4] != IR_MAGIC {
        report
            .errors
            .push("invalid magic bytes: expected 'VGIR'".to_owned());
        return decoded;
    }
    let major = bytes[4];
    if major != IR_MAJOR_VERSION {
        report.errors.push(format!(
            "unsupported IR major version {major} (expected {IR_MAJOR_VERSION})"
        ));
        return decoded;
    }
    let reserved = u16::from_le_bytes([bytes[6], bytes[7]]);
    if reserved != 0 {
        report
            .warnings
            .push(format!("header reserved field is 0x{reserved:04x}, expected 0"));
    }
    let total_size = u32::from_le_bytes(bytes[8..12].try_into().expect("header slice"));
    if total_size as usize != bytes.len() {
        report.errors.push(format!(
            "size mismatch: header says {} bytes but file is {}",
            total_size,
            bytes.len()
        ));
        return decoded;
    }
    let stored_crc = u32::from_le_bytes(bytes[12..16].try_into().expect("header slice"));
    let computed_crc = format::crc32(&bytes[HEADER_SIZE..]);
    if stored_crc != computed_crc {
        report.errors.push(format!(
            "checksum mismatch: header says {stored_crc:#010x}, content is {computed_crc:#010x}"
        ));
    }

    let mut saw_command = false;
    let mut offset = HEADER_SIZE;
    while offset < bytes.len() {
        if bytes.len() - offset < SECTION_HEADER_SIZE {
            report.errors.push(format!(
                "truncated section header at offset {offset}"
            ));
            break;
        }
        let type_byte = bytes[offset];
        let section_reserved = bytes[offset + 1];
        let length = u32::from_le_bytes(
            bytes[offset + 2..offset + 6].try_into().expect("section slice"),
        ) as usize;

        if section_reserved != 0 {
            report.warnings.push(format!(
                "section at offset {offset} has reserved byte 0x{section_reserved:02x}"
            ));
        }
        if length < SECTION_HEADER_SIZE {
            report.errors.push(format!(
                "section at offset {offset} declares impossible length {length}"
            ));
            break;
        }
        if offset + length > bytes.len() {
            report.errors.push(format!(
                "section at offset {offset} overruns the file ({} bytes declared, {} remain)",
                length,
                bytes.len() - offset
            ));
            break;
        }

        let payload = &bytes[offset + SECTION_HEADER_SIZE..offset + length];
        match SectionType::from_u8(type_byte) {
            Some(SectionType::Info) => parse_info(payload, &mut decoded, report),
            Some(SectionType::Paint) => parse_paints(payload, &mut decoded, report),
            Some(SectionType::Path) => parse_paths(payload, &mut decoded, report),
            Some(SectionType::Command) => {
                saw_command = true;
                decoded.command_stream = payload.to_vec();
            }
            Some(SectionType::Extension) => {}
            None => {
                report.warnings.push(format!(
                    "unknown section type 0x{type_byte:02x} at offset {offset}, skipped"
                ));
            }
        }
        offset += length;
    }

    if decoded.width == 0 || decoded.height == 0 {
        report.errors.push(format!(
            "scene dimensions must be positive, got {}x{}",
            decoded.width, decoded.height
        ));
    }

    if !saw_command {
        report.errors.push("missing Command section".to_owned());
    } else {
        scan_command_stream(&decoded, report);
    }

    decoded
}

fn parse_info(payload: &[u8], decoded: &mut Decoded, report: &mut ValidationReport) {
    let mut reader = ByteReader::new(payload);
    let Some(count) = reader.u16() else {
        report.errors.push("Info section truncated".to_owned());
        return;
    };
    for _ in 0..count {
        let Some(key) = reader.sized_str() else {
            report.errors.push("Info section key truncated".to_owned());
            return;
        };
        let Some(value) = reader.sized_str() else {
            report.errors.push("Info section value truncated".to_owned());
            return;
        };
        // Unknown keys are tolerated; non-numeric width/height are not.
        match key.as_str() {
            "width" => match value.parse::<u32>() {
                Ok(width) => decoded.width = width,
                Err(_) => report
                    .errors
                    .push(format!("Info width is not an integer: '{value}'")),
            },
            "height" => match value.parse::<u32>() {
                Ok(height) => decoded.height = height,
                Err(_) => report
                    .errors
                    .push(format!("Info height is not an integer: '{value}'")),
            },
            _ => {}
        }
    }
}

fn parse_paints(payload: &[u8], decoded: &mut Decoded, report: &mut ValidationReport) {
    let mut reader = ByteReader::new(payload);
    let Some(count) = reader.u16() else {
        report.errors.push("Paint section truncated".to_owned());
        return;
    };
    decoded.paints = Vec::with_capacity(count as usize);
    for index in 0..count {
        let Some(kind_byte) = reader.u8() else {
            report
                .errors
                .push(format!("paint {index} truncated before type byte"));
            return;
        };
        let Some(kind) = PaintKind::from_u8(kind_byte) else {
            report
                .errors
                .push(format!("paint {index} has unknown type 0x{kind_byte:02x}"));
            return;
        };
        let paint = match kind {
            PaintKind::Solid => reader.u32().map(|color| Paint::Solid { color }),
            PaintKind::Linear => read_linear(&mut reader, index, report),
            PaintKind::Radial => read_radial(&mut reader, index, report),
        };
        match paint {
            Some(paint) => decoded.paints.push(paint),
            None => {
                report
                    .errors
                    .push(format!("paint {index} truncated mid-record"));
                return;
            }
        }
    }
}

fn read_linear(
    reader: &mut ByteReader<'_>,
    index: u16,
    report: &mut ValidationReport,
) -> Option<Paint> {
    let start = (reader.f32()?, reader.f32()?);
    let end = (reader.f32()?, reader.f32()?);
    let stops = read_stops(reader, index, report)?;
    Some(Paint::Linear { start, end, stops })
}

fn read_radial(
    reader: &mut ByteReader<'_>,
    index: u16,
    report: &mut ValidationReport,
) -> Option<Paint> {
    let center = (reader.f32()?, reader.f32()?);
    let radius = reader.f32()?;
    let stops = read_stops(reader, index, report)?;
    Some(Paint::Radial {
        center,
        radius,
        stops,
    })
}

fn read_stops(
    reader: &mut ByteReader<'_>,
    paint_index: u16,
    report: &mut ValidationReport,
) -> Option<Vec<GradientStop>> {
    let count = reader.u16()?;
    let mut stops = Vec::with_capacity(count as usize);
    let mut previous = 0.0f32;
    for stop_index in 0..count {
        let offset = reader.f32()?;
        let color = reader.u32()?;
        if !(0.0..=1.0).contains(&offset) {
            report.errors.push(format!(
                "paint {paint_index} stop {stop_index} offset {offset} outside [0, 1]"
            ));
        } else if offset < previous {
            report.errors.push(format!(
                "paint {paint_index} stop {stop_index} offset {offset} decreases below {previous}"
            ));
        } else {
            previous = offset;
        }
        stops.push(GradientStop { offset, color });
    }
    Some(stops)
}

fn parse_paths(payload: &[u8], decoded: &mut Decoded, report: &mut ValidationReport) {
    let mut reader = ByteReader::new(payload);
    let Some(count) = reader.u16() else {
        report.errors.push("Path section truncated".to_owned());
        return;
    };
    decoded.paths = Vec::with_capacity(count as usize);
    for index in 0..count {
        let (Some(verb_count), Some(point_count)) = (reader.u16(), reader.u16()) else {
            report
                .errors
                .push(format!("path {index} truncated before counts"));
            return;
        };
        if reader.remaining() < verb_count as usize + point_count as usize * 4 {
            report.errors.push(format!(
                "path {index} declares {verb_count} verbs and {point_count} points past the section end"
            ));
            return;
        }

        let mut path = PathData {
            verbs: Vec::with_capacity(verb_count as usize),
            points: Vec::with_capacity(point_count as usize),
        };
        for verb_index in 0..verb_count {
            let byte = reader.u8().expect("bounds checked above");
            match PathVerb::from_u8(byte) {
                Some(verb) => path.verbs.push(verb),
                None => report.errors.push(format!(
                    "path {index} verb {verb_index} has unknown code 0x{byte:02x}"
                )),
            }
        }
        for _ in 0..point_count {
            path.points.push(reader.f32().expect("bounds checked above"));
        }

        if point_count % 2 != 0 {
            report.errors.push(format!(
                "path {index} has odd point count {point_count}"
            ));
        } else if path.consumed_points() * 2 != point_count as usize {
            report.errors.push(format!(
                "path {index} verbs consume {} points but {} are stored",
                path.consumed_points(),
                point_count / 2
            ));
        }
        decoded.paths.push(path);
    }
}

fn scan_command_stream(decoded: &Decoded, report: &mut ValidationReport) {
    let stream = &decoded.command_stream;
    let mut reader = ByteReader::new(stream);
    let mut ended = false;

    while let Some(op_byte) = reader.u8() {
        let Some(opcode) = Opcode::from_u8(op_byte) else {
            report.errors.push(format!(
                "unknown opcode 0x{op_byte:02x} at command offset {}",
                reader.position() - 1
            ));
            return;
        };
        match opcode {
            Opcode::End => {
                ended = true;
                if reader.remaining() > 0 {
                    report.errors.push(format!(
                        "{} trailing bytes after End opcode",
                        reader.remaining()
                    ));
                }
                break;
            }
            Opcode::Save | Opcode::Restore => {}
            Opcode::Clear => {
                if reader.u32().is_none() {
                    report.errors.push("Clear payload truncated".to_owned());
                    return;
                }
            }
            Opcode::SetMatrix | Opcode::ConcatMatrix => {
                for _ in 0..6 {
                    if reader.f32().is_none() {
                        report.errors.push("matrix payload truncated".to_owned());
                        return;
                    }
                }
            }
            Opcode::SetFill => {
                let (Some(paint_id), Some(rule)) = (reader.u16(), reader.u8()) else {
                    report.errors.push("SetFill payload truncated".to_owned());
                    return;
                };
                if format::FillRule::from_u8(rule).is_none() {
                    report
                        .errors
                        .push(format!("SetFill has unknown fill rule {rule}"));
                }
                check_paint_index(paint_id, decoded, "SetFill", report);
            }
            Opcode::SetStroke => {
                let (Some(paint_id), Some(_width), Some(opts)) =
                    (reader.u16(), reader.f32(), reader.u8())
                else {
                    report.errors.push("SetStroke payload truncated".to_owned());
                    return;
                };
                if format::unpack_stroke_cap(opts).is_none()
                    || format::unpack_stroke_join(opts).is_none()
                {
                    report
                        .errors
                        .push(format!("SetStroke has invalid cap/join in opts 0x{opts:02x}"));
                }
                if format::stroke_opts_reserved_bits(opts) != 0 {
                    report.warnings.push(format!(
                        "SetStroke opts 0x{opts:02x} has reserved bits set"
                    ));
                }
                check_paint_index(paint_id, decoded, "SetStroke", report);
            }
            Opcode::FillPath | Opcode::StrokePath => {
                let Some(path_id) = reader.u16() else {
                    report.errors.push("path opcode payload truncated".to_owned());
                    return;
                };
                if path_id as usize >= decoded.paths.len() {
                    report.errors.push(format!(
                        "opcode references path {} but table has {} entries",
                        path_id,
                        decoded.paths.len()
                    ));
                }
            }
        }
    }

    if !ended {
        report
            .errors
            .push("command stream has no terminating End opcode".to_owned());
    }
}

fn check_paint_index(
    paint_id: u16,
    decoded: &Decoded,
    opcode_name: &str,
    report: &mut ValidationReport,
) {
    if paint_id as usize >= decoded.paints.len() {
        report.errors.push(format!(
            "{opcode_name} references paint {} but table has {} entries",
            paint_id,
            decoded.paints.len()
        ));
    }
}

/// Bounds-checked little-endian cursor over a byte slice.
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn u8(&mut self) -> Option<u8> {
        let byte = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn u16(&mut self) -> Option<u16> {
        let slice = self.bytes.get(self.pos..self.pos + 2)?;
        self.pos += 2;
        Some(u16::from_le_bytes(slice.try_into().expect("length 2")))
    }

    fn u32(&mut self) -> Option<u32> {
        let slice = self.bytes.get(self.pos..self.pos + 4)?;
        self.pos += 4;
        Some(u32::from_le_bytes(slice.try_into().expect("length 4")))
    }

    fn f32(&mut self) -> Option<f32> {
        self.u32().map(f32::from_bits)
    }

    fn sized_str(&mut self) -> Option<String> {
        let len = self.u16()? as usize;
        let slice = self.bytes.get(self.pos..self.pos + len)?;
        self.pos += len;
        Some(String::from_utf8_lossy(slice).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::simple_rect_scene;

    #[test]
    fn valid_scene_passes() {
        let bytes = simple_rect_scene(800, 600).build();
        let report = validate(&bytes);
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    }

    #[test]
    fn prepare_reads_info_dimensions() {
        let bytes = simple_rect_scene(320, 240).build();
        let scene = prepare(&bytes, "tests/rect").expect("prepare");
        assert_eq!((scene.width, scene.height), (320, 240));
        assert_eq!(scene.scene_id, "tests/rect");
        assert_eq!(scene.scene_hash.len(), 64);
    }

    #[test]
    fn unknown_section_type_is_a_warning() {
        let mut bytes = simple_rect_scene(64, 64).build();
        // Append an unknown section and refresh the size/checksum.
        bytes.extend([0x7E, 0x00, 0x06, 0x00, 0x00, 0x00]);
        let total = bytes.len() as u32;
        bytes[8..12].copy_from_slice(&total.to_le_bytes());
        let crc = format::crc32(&bytes[HEADER_SIZE..]);
        bytes[12..16].copy_from_slice(&crc.to_le_bytes());

        let report = validate(&bytes);
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn hash_is_lowercase_hex() {
        let hash = scene_hash(b"vgbench");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
