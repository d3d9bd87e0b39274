//! Canny edge detection on an already smoothed image
//!
//! Gradients are 3x3 Sobel with L1 magnitude (`|gx| + |gy|`). No further
//! smoothing is applied, so the hysteresis thresholds act directly on the
//! gradient of the caller's blurred image.

use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

// tan(22.5°) and tan(67.5°), the bin boundaries for gradient direction
const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_6;

const EDGE: Luma<u8> = Luma([255]);

/// Binary edge map: 255 on edges, 0 elsewhere.
///
/// A pixel is a candidate when its magnitude exceeds `low` and it is a local
/// maximum across the gradient direction. Candidates above `high` seed
/// edges; weaker candidates are kept only when 8-connected to a seed.
pub fn canny_l1(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let gx = horizontal_sobel(image);
    let gy = vertical_sobel(image);

    let magnitude: Vec<f32> = gx
        .pixels()
        .zip(gy.pixels())
        .map(|(x, y)| x[0].unsigned_abs() as f32 + y[0].unsigned_abs() as f32)
        .collect();

    let (w, h) = (width as i64, height as i64);
    let mag_at = |x: i64, y: i64| -> f32 {
        if x < 0 || y < 0 || x >= w || y >= h {
            0.0
        } else {
            magnitude[(y * w + x) as usize]
        }
    };

    let mut edges = GrayImage::new(width, height);
    let mut weak = vec![false; magnitude.len()];
    let mut seeds: Vec<(i64, i64)> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let m = mag_at(x, y);
            if m <= low {
                continue;
            }

            let dx = gx.get_pixel(x as u32, y as u32)[0] as f32;
            let dy = gy.get_pixel(x as u32, y as u32)[0] as f32;
            let (ax, ay) = (dx.abs(), dy.abs());

            // Ties resolve toward the lower/left neighbour so plateaus stay one pixel wide
            let is_peak = if ay < ax * TAN_22_5 {
                m > mag_at(x - 1, y) && m >= mag_at(x + 1, y)
            } else if ay > ax * TAN_67_5 {
                m > mag_at(x, y - 1) && m >= mag_at(x, y + 1)
            } else {
                let s = if (dx < 0.0) != (dy < 0.0) { -1 } else { 1 };
                m > mag_at(x - s, y - 1) && m > mag_at(x + s, y + 1)
            };
            if !is_peak {
                continue;
            }

            if m > high {
                edges.put_pixel(x as u32, y as u32, EDGE);
                seeds.push((x, y));
            } else {
                weak[(y * w + x) as usize] = true;
            }
        }
    }

    while let Some((x, y)) = seeds.pop() {
        for ny in (y - 1)..=(y + 1) {
            for nx in (x - 1)..=(x + 1) {
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                let idx = (ny * w + nx) as usize;
                if weak[idx] {
                    weak[idx] = false;
                    edges.put_pixel(nx as u32, ny as u32, EDGE);
                    seeds.push((nx, ny));
                }
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(width: u32, height: u32, at: u32, low: u8, high: u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| Luma([if x < at { low } else { high }]))
    }

    fn edge_columns(edges: &GrayImage, row: u32) -> Vec<u32> {
        (0..edges.width())
            .filter(|&x| edges.get_pixel(x, row)[0] == 255)
            .collect()
    }

    #[test]
    fn test_flat_image_has_no_edges() {
        let flat = GrayImage::from_pixel(32, 32, Luma([120]));
        assert!(canny_l1(&flat, 50.0, 150.0).pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_sharp_step_gives_single_pixel_line() {
        // Unblurred step of 40: |gx| = 4 * 40 = 160 on both sides of the boundary
        let img = step(20, 10, 10, 30, 70);
        let edges = canny_l1(&img, 50.0, 150.0);
        assert_eq!(edge_columns(&edges, 5), vec![9]);
    }

    #[test]
    fn test_magnitude_is_l1_sum_of_sobel_responses() {
        // Step of 37: |gx| = 148, below the high threshold, so nothing seeds
        let img = step(20, 10, 10, 30, 67);
        assert!(canny_l1(&img, 50.0, 150.0).pixels().all(|p| p[0] == 0));
        // Lowering the high threshold below 148 turns the same step into an edge
        assert_eq!(edge_columns(&canny_l1(&img, 50.0, 140.0), 5), vec![9]);
    }

    #[test]
    fn test_weak_edges_survive_only_when_connected() {
        // Left half of the boundary is strong, right half weak but connected
        let mut img = GrayImage::from_pixel(40, 20, Luma([30]));
        for y in 10..20 {
            for x in 0..40 {
                let value = if x < 20 { 90 } else { 50 };
                img.put_pixel(x, y, Luma([value]));
            }
        }
        let edges = canny_l1(&img, 50.0, 150.0);
        // Strong part: 4 * 60 = 240; weak part: 4 * 20 = 80, above low
        assert_eq!(edges.get_pixel(5, 9)[0], 255);
        assert_eq!(edges.get_pixel(35, 9)[0], 255);

        // Without a strong neighbour the weak boundary is dropped
        let mut isolated = GrayImage::from_pixel(40, 20, Luma([30]));
        for y in 10..20 {
            for x in 0..40 {
                isolated.put_pixel(x, y, Luma([50]));
            }
        }
        assert!(canny_l1(&isolated, 50.0, 150.0).pixels().all(|p| p[0] == 0));
    }
}
