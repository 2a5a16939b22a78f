//! Artifact pipeline: deterministic file naming plus PNG read/write.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use image::{ImageBuffer, ImageReader, Rgba};

/// Serializes concurrent PNG writes so repeated-run scenarios cannot
/// corrupt partially written files.
static WRITE_LOCK: Mutex<()> = Mutex::new(());

/// Lower-case alphanumerics, keep `-` and `_`, map everything else to `_`.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else if c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Deterministic artifact filename: `{scene}_{backend}{suffix}`, e.g.
/// `tiger_skia.png`.
pub fn artifact_file_name(scene_id: &str, backend_id: &str, suffix: &str) -> String {
    format!("{}_{}{}", sanitize(scene_id), sanitize(backend_id), suffix)
}

/// Write a tightly packed RGBA8 buffer as a lossless 8-bit PNG, creating
/// missing parent directories. Writes are serialized process-wide.
pub fn write_png(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<()> {
    let expected = width as usize * height as usize * 4;
    if width == 0 || height == 0 || rgba.len() != expected {
        return Err(anyhow!(
            "invalid artifact buffer: {}x{} needs {} bytes, got {}",
            width,
            height,
            expected,
            rgba.len()
        ));
    }

    let _guard = WRITE_LOCK.lock().expect("artifact lock poisoned");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create artifact directory {}", parent.display()))?;
    }

    let image: ImageBuffer<Rgba<u8>, _> = ImageBuffer::from_raw(width, height, rgba.to_vec())
        .ok_or_else(|| anyhow!("buffer does not match {}x{}", width, height))?;
    image
        .save(path)
        .with_context(|| format!("failed to write PNG {}", path.display()))?;
    Ok(())
}

/// Read a PNG into a tightly packed RGBA8 buffer.
pub fn read_png(path: &Path) -> Result<(u32, u32, Vec<u8>)> {
    let image = ImageReader::open(path)
        .with_context(|| format!("failed to open PNG {}", path.display()))?
        .decode()
        .with_context(|| format!("failed to decode PNG {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok((width, height, image.into_raw()))
}
