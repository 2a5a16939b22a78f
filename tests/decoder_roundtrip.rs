use vgbench::ir::builder::{simple_rect_scene, solid_basic_scene, IrBuilder};
use vgbench::ir::decoder::{prepare, scene_hash, validate};
use vgbench::ir::format::{self, FillRule, StrokeCap, StrokeJoin, HEADER_SIZE};
use vgbench::scene::{GradientStop, Paint, PathData};

fn refresh_header(bytes: &mut [u8]) {
    let total = bytes.len() as u32;
    bytes[8..12].copy_from_slice(&total.to_le_bytes());
    let crc = format::crc32(&bytes[HEADER_SIZE..]);
    bytes[12..16].copy_from_slice(&crc.to_le_bytes());
}

fn full_feature_builder() -> IrBuilder {
    let mut builder = IrBuilder::new(400, 300);
    let white = builder.add_solid(255, 255, 255, 255);
    let gradient = builder.add_paint(Paint::Linear {
        start: (0.0, 0.0),
        end: (400.0, 0.0),
        stops: vec![
            GradientStop {
                offset: 0.0,
                color: format::pack_rgba8(255, 0, 0, 255),
            },
            GradientStop {
                offset: 1.0,
                color: format::pack_rgba8(0, 0, 255, 255),
            },
        ],
    });
    let glow = builder.add_paint(Paint::Radial {
        center: (200.0, 150.0),
        radius: 80.0,
        stops: vec![
            GradientStop {
                offset: 0.0,
                color: format::pack_rgba8(255, 255, 0, 255),
            },
            GradientStop {
                offset: 1.0,
                color: format::pack_rgba8(0, 0, 0, 0),
            },
        ],
    });

    let mut wave = PathData::default();
    wave.move_to(10.0, 10.0)
        .line_to(100.0, 10.0)
        .quad_to(150.0, 60.0, 200.0, 10.0)
        .cubic_to(250.0, -20.0, 300.0, 40.0, 350.0, 10.0);
    let wave = builder.add_path(wave);
    let disc = builder.add_path(PathData::circle(200.0, 150.0, 80.0));

    builder
        .clear(10, 10, 10, 255)
        .save()
        .set_matrix([1.0, 0.0, 0.0, 1.0, 25.0, 10.0])
        .concat_matrix([2.0, 0.0, 0.0, 2.0, 0.0, 0.0])
        .set_fill(gradient, FillRule::EvenOdd)
        .fill_path(disc)
        .restore()
        .set_fill(glow, FillRule::NonZero)
        .fill_path(disc)
        .set_stroke(white, 3.5, StrokeCap::Round, StrokeJoin::Bevel)
        .stroke_path(wave);
    builder
}

#[test]
fn round_trip_preserves_tables_and_stream() {
    let builder = full_feature_builder();
    let bytes = builder.build();
    let scene = prepare(&bytes, "tests/full_feature").expect("scene should decode");

    assert_eq!(scene.width, 400);
    assert_eq!(scene.height, 300);
    assert_eq!(scene.paints.len(), 3);
    assert_eq!(scene.paths.len(), 2);

    // Solid paint survives byte-exact.
    assert_eq!(
        scene.paints[0],
        Paint::Solid {
            color: format::pack_rgba8(255, 255, 255, 255)
        }
    );
    // Gradient endpoints and stops survive.
    let Paint::Linear { start, end, stops } = &scene.paints[1] else {
        panic!("paint 1 should be linear, got {:?}", scene.paints[1]);
    };
    assert_eq!(*start, (0.0, 0.0));
    assert_eq!(*end, (400.0, 0.0));
    assert_eq!(stops.len(), 2);
    assert_eq!(stops[1].offset, 1.0);

    let Paint::Radial { center, radius, .. } = &scene.paints[2] else {
        panic!("paint 2 should be radial, got {:?}", scene.paints[2]);
    };
    assert_eq!(*center, (200.0, 150.0));
    assert_eq!(*radius, 80.0);

    // Path verb/point parity.
    for path in &scene.paths {
        assert_eq!(path.consumed_points() * 2, path.points.len());
    }

    // Re-encoding the decoded tables reproduces equivalent scenes.
    let mut rebuilt = IrBuilder::new(scene.width, scene.height);
    for paint in &scene.paints {
        rebuilt.add_paint(paint.clone());
    }
    for path in &scene.paths {
        rebuilt.add_path(path.clone());
    }
    let reencoded = rebuilt.build();
    let second = prepare(&reencoded, "tests/full_feature").expect("re-encoded scene decodes");
    assert_eq!(second.paints, scene.paints);
    assert_eq!(second.paths, scene.paths);

    assert_eq!(*scene.command_stream.last().expect("stream"), 0x00);
}

#[test]
fn rejects_truncated_header() {
    let bytes = simple_rect_scene(64, 64).build();
    let report = validate(&bytes[..10]);
    assert!(!report.is_valid());
    assert!(report.errors[0].contains("too small"));
}

#[test]
fn rejects_bad_magic() {
    let mut bytes = simple_rect_scene(64, 64).build();
    bytes[0] = b'X';
    let report = validate(&bytes);
    assert!(!report.is_valid());
    assert!(report.errors[0].contains("magic"));
}

#[test]
fn rejects_unsupported_major_version() {
    let mut bytes = simple_rect_scene(64, 64).build();
    bytes[4] = 9;
    refresh_header(&mut bytes);
    let report = validate(&bytes);
    assert!(!report.is_valid());
    assert!(report.errors[0].contains("major version"));
}

#[test]
fn rejects_total_size_mismatch() {
    let mut bytes = simple_rect_scene(64, 64).build();
    let wrong = (bytes.len() as u32) + 8;
    bytes[8..12].copy_from_slice(&wrong.to_le_bytes());
    let report = validate(&bytes);
    assert!(!report.is_valid());
    assert!(report.errors.iter().any(|e| e.contains("size mismatch")));
}

#[test]
fn rejects_checksum_mismatch() {
    let mut bytes = simple_rect_scene(64, 64).build();
    // Corrupt one content byte without touching the header.
    let last = bytes.len() - 2;
    bytes[last] ^= 0xFF;
    let report = validate(&bytes);
    assert!(!report.is_valid());
    assert!(report.errors.iter().any(|e| e.contains("checksum")));
}

#[test]
fn rejects_section_overrun() {
    let mut bytes = simple_rect_scene(64, 64).build();
    // Inflate the first section's declared length past the file end.
    let huge = (bytes.len() as u32) * 2;
    bytes[HEADER_SIZE + 2..HEADER_SIZE + 6].copy_from_slice(&huge.to_le_bytes());
    refresh_header(&mut bytes);
    let report = validate(&bytes);
    assert!(!report.is_valid());
    assert!(report.errors.iter().any(|e| e.contains("overruns")));
}

#[test]
fn rejects_paint_index_out_of_range() {
    let mut builder = IrBuilder::new(64, 64);
    let rect = builder.add_path(PathData::rect(0.0, 0.0, 10.0, 10.0));
    // No paint 7 exists.
    builder.set_fill(7, FillRule::NonZero).fill_path(rect);
    let report = validate(&builder.build());
    assert!(!report.is_valid());
    assert!(report
        .errors
        .iter()
        .any(|e| e.contains("references paint 7")));
}

#[test]
fn rejects_path_index_out_of_range() {
    let mut builder = IrBuilder::new(64, 64);
    let paint = builder.add_solid(255, 0, 0, 255);
    builder.set_fill(paint, FillRule::NonZero).fill_path(3);
    let report = validate(&builder.build());
    assert!(!report.is_valid());
    assert!(report.errors.iter().any(|e| e.contains("references path 3")));
}

#[test]
fn rejects_missing_end_opcode() {
    let mut bytes = simple_rect_scene(64, 64).build();
    // The last byte of the file is the command section's End; drop it and
    // shrink the section header accordingly.
    bytes.pop();
    let mut offset = HEADER_SIZE;
    loop {
        let length = u32::from_le_bytes(bytes[offset + 2..offset + 6].try_into().expect("len"));
        if bytes[offset] == 0x04 {
            let shrunk = length - 1;
            bytes[offset + 2..offset + 6].copy_from_slice(&shrunk.to_le_bytes());
            break;
        }
        offset += length as usize;
    }
    refresh_header(&mut bytes);
    let report = validate(&bytes);
    assert!(!report.is_valid());
    assert!(report
        .errors
        .iter()
        .any(|e| e.contains("terminating End") || e.contains("End opcode")));
}

#[test]
fn rejects_unknown_opcode() {
    let mut bytes = simple_rect_scene(64, 64).build();
    // Overwrite the Clear opcode (first command byte) with an unassigned
    // opcode value.
    let mut offset = HEADER_SIZE;
    loop {
        let length = u32::from_le_bytes(bytes[offset + 2..offset + 6].try_into().expect("len"));
        if bytes[offset] == 0x04 {
            bytes[offset + 6] = 0x7F;
            break;
        }
        offset += length as usize;
    }
    refresh_header(&mut bytes);
    let report = validate(&bytes);
    assert!(!report.is_valid());
    assert!(report.errors.iter().any(|e| e.contains("unknown opcode")));
}

#[test]
fn hash_is_stable_and_collision_averse() {
    let bytes = solid_basic_scene(800, 600).build();
    assert_eq!(scene_hash(&bytes), scene_hash(&bytes));

    let mut mutated = bytes.clone();
    mutated[HEADER_SIZE] ^= 0x01;
    assert_ne!(scene_hash(&bytes), scene_hash(&mutated));
}

#[test]
fn prepare_rejects_invalid_bytes_with_joined_errors() {
    let mut bytes = simple_rect_scene(64, 64).build();
    bytes[0] = b'X';
    let error = prepare(&bytes, "tests/broken").expect_err("prepare should fail");
    assert!(error.to_string().contains("validation failed"));
}
