//! Structural similarity over BT.601 luminance.
//!
//! Both inputs are RGBA8 buffers with a tight `width * 4` stride. The
//! metric is computed on the straight RGB channels regardless of
//! premultiplication; reports carry that caveat rather than the metric
//! silently changing.

/// Pass threshold for golden-image comparison.
pub const SSIM_THRESHOLD: f64 = 0.99;

const WINDOW: usize = 8;
const STEP: usize = 4;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

#[derive(Debug, Clone)]
pub struct SsimResult {
    pub score: f64,
    pub passed: bool,
    pub message: String,
}

/// Compute single-channel luminance SSIM over the full frame.
pub fn compare(width: u32, height: u32, a: &[u8], b: &[u8]) -> SsimResult {
    let pixels = width as usize * height as usize;
    if width == 0 || height == 0 || a.len() < pixels * 4 || b.len() < pixels * 4 {
        return SsimResult {
            score: 0.0,
            passed: false,
            message: "Invalid input dimensions or buffers".to_owned(),
        };
    }

    let luma_a = luminance_plane(width, height, a);
    let luma_b = luminance_plane(width, height, b);
    let score = mean_windowed_ssim(width as usize, height as usize, &luma_a, &luma_b);

    let passed = score >= SSIM_THRESHOLD;
    let message = if passed {
        "SSIM passed".to_owned()
    } else {
        format!("SSIM failed (score={score:.6} < {SSIM_THRESHOLD})")
    };

    SsimResult {
        score,
        passed,
        message,
    }
}

/// Normalized [0, 1] BT.601 luminance of the straight RGB channels.
fn luminance_plane(width: u32, height: u32, rgba: &[u8]) -> Vec<f64> {
    let pixels = width as usize * height as usize;
    let mut luma = Vec::with_capacity(pixels);
    for pixel in rgba[..pixels * 4].chunks_exact(4) {
        let r = f64::from(pixel[0]) / 255.0;
        let g = f64::from(pixel[1]) / 255.0;
        let b = f64::from(pixel[2]) / 255.0;
        luma.push(0.299 * r + 0.587 * g + 0.114 * b);
    }
    luma
}

fn mean_windowed_ssim(width: usize, height: usize, a: &[f64], b: &[f64]) -> f64 {
    let c1 = K1 * K1;
    let c2 = K2 * K2;
    let win_w = WINDOW.min(width);
    let win_h = WINDOW.min(height);

    let mut total = 0.0;
    let mut windows = 0usize;

    let mut y = 0;
    loop {
        let mut x = 0;
        loop {
            total += window_ssim(width, a, b, x, y, win_w, win_h, c1, c2);
            windows += 1;

            if x + win_w >= width {
                break;
            }
            x = (x + STEP).min(width - win_w);
        }
        if y + win_h >= height {
            break;
        }
        y = (y + STEP).min(height - win_h);
    }

    total / windows as f64
}

#[allow(clippy::too_many_arguments)]
fn window_ssim(
    width: usize,
    a: &[f64],
    b: &[f64],
    x0: usize,
    y0: usize,
    win_w: usize,
    win_h: usize,
    c1: f64,
    c2: f64,
) -> f64 {
    let n = (win_w * win_h) as f64;

    let mut sum_a = 0.0;
    let mut sum_b = 0.0;
    for y in y0..y0 + win_h {
        for x in x0..x0 + win_w {
            let index = y * width + x;
            sum_a += a[index];
            sum_b += b[index];
        }
    }
    let mean_a = sum_a / n;
    let mean_b = sum_b / n;

    let mut var_a = 0.0;
    let mut var_b = 0.0;
    let mut covar = 0.0;
    for y in y0..y0 + win_h {
        for x in x0..x0 + win_w {
            let index = y * width + x;
            let da = a[index] - mean_a;
            let db = b[index] - mean_b;
            var_a += da * da;
            var_b += db * db;
            covar += da * db;
        }
    }
    var_a /= n;
    var_b /= n;
    covar /= n;

    ((2.0 * mean_a * mean_b + c1) * (2.0 * covar + c2))
        / ((mean_a * mean_a + mean_b * mean_b + c1) * (var_a + var_b + c2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width * height {
            buffer.extend(rgba);
        }
        buffer
    }

    #[test]
    fn identical_images_score_one() {
        let image = solid(32, 32, [40, 90, 200, 255]);
        let result = compare(32, 32, &image, &image);
        assert_eq!(result.score, 1.0);
        assert!(result.passed);
    }

    #[test]
    fn red_versus_blue_scores_low() {
        let red = solid(32, 32, [255, 0, 0, 255]);
        let blue = solid(32, 32, [0, 0, 255, 255]);
        let result = compare(32, 32, &red, &blue);
        assert!(result.score < 0.8, "score {}", result.score);
        assert!(!result.passed);
    }

    #[test]
    fn invalid_dimensions_are_rejected() {
        let result = compare(0, 0, &[], &[]);
        assert_eq!(result.score, 0.0);
        assert!(!result.passed);
    }

    #[test]
    fn small_images_use_clamped_windows() {
        let image = solid(3, 3, [128, 128, 128, 255]);
        let result = compare(3, 3, &image, &image);
        assert_eq!(result.score, 1.0);
    }
}
