//! Slot-to-template scoring with normalized cross-correlation

use super::config::{MatchMethod, RecognitionConfig};
use super::types::{BestMatch, SlotMatch, SlotRect, Template};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::template_matching::{MatchTemplateMethod, find_extremes, match_template};

/// Scores slot crops against the template library
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    method: MatchMethod,
    slot_size: u32,
    threshold: f32,
}

impl TemplateMatcher {
    pub fn new(config: &RecognitionConfig) -> Self {
        Self {
            method: config.match_method,
            slot_size: config.slot_size,
            threshold: config.match_threshold,
        }
    }

    /// Best template for a colour slot crop.
    pub fn match_slot(&self, slot: &DynamicImage, templates: &[Template]) -> BestMatch {
        self.match_slot_gray(&slot.to_luma8(), templates)
    }

    /// Best template for an intensity slot crop; ties keep the first template.
    pub fn match_slot_gray(&self, slot: &GrayImage, templates: &[Template]) -> BestMatch {
        let mut best = BestMatch::none();

        for template in templates {
            let Some((score, _location)) = correlation_peak(slot, &template.pixels, self.method)
            else {
                log::debug!(
                    "⚠️ Template '{}' ({}x{}) does not fit slot {}x{}",
                    template.name,
                    template.pixels.width(),
                    template.pixels.height(),
                    slot.width(),
                    slot.height()
                );
                continue;
            };

            if score > best.confidence {
                best = BestMatch {
                    name: Some(template.name.clone()),
                    confidence: score,
                };
            }
        }

        best
    }

    /// Crop, rescale and score every ordered rectangle. Output order follows `rects`.
    pub fn match_all_slots(
        &self,
        image: &DynamicImage,
        rects: &[SlotRect],
        templates: &[Template],
    ) -> Vec<SlotMatch> {
        let gray = image.to_luma8();
        let match_one =
            |(index, rect): (usize, &SlotRect)| self.match_rect(&gray, index, rect, templates);

        #[cfg(feature = "parallel")]
        let matches = {
            use rayon::prelude::*;
            rects.par_iter().enumerate().map(match_one).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let matches = rects.iter().enumerate().map(match_one).collect();

        matches
    }

    fn match_rect(
        &self,
        gray: &GrayImage,
        index: usize,
        rect: &SlotRect,
        templates: &[Template],
    ) -> SlotMatch {
        let crop = imageops::crop_imm(
            gray,
            rect.x.max(0) as u32,
            rect.y.max(0) as u32,
            rect.width.max(0) as u32,
            rect.height.max(0) as u32,
        )
        .to_image();
        let slot = resize_to_canonical(&crop, self.slot_size);
        let best = self.match_slot_gray(&slot, templates);

        log::debug!(
            "🔍 Slot {} at ({},{} {}x{}): best={:?} conf={:.3}",
            index,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            best.name,
            best.confidence
        );

        SlotMatch::from_best(index, best, self.threshold)
    }
}

/// Rescale to `size`x`size` by area averaging when shrinking; enlarging falls
/// back to bilinear sampling since there is nothing to average.
pub fn resize_to_canonical(gray: &GrayImage, size: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == size && height == size {
        return gray.clone();
    }
    if width == 0 || height == 0 {
        return GrayImage::new(size, size);
    }
    if width >= size && height >= size {
        imageops::thumbnail(gray, size, size)
    } else {
        imageops::resize(gray, size, size, FilterType::Triangle)
    }
}

/// Peak correlation of `template` slid over `image`, with its location.
///
/// Returns `None` when the template is empty or larger than the image.
pub fn correlation_peak(
    image: &GrayImage,
    template: &GrayImage,
    method: MatchMethod,
) -> Option<(f32, (u32, u32))> {
    let (iw, ih) = image.dimensions();
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > iw || th > ih {
        return None;
    }

    let scores = match method {
        MatchMethod::ZeroMeanNormalized => zero_mean_correlation(image, template),
        MatchMethod::CrossCorrelationNormalized => match_template(
            image,
            template,
            MatchTemplateMethod::CrossCorrelationNormalized,
        ),
    };

    let extremes = find_extremes(&scores);
    Some((extremes.max_value, extremes.max_value_location))
}

/// Correlation coefficient between the template and every same-sized window
/// of the image. Windows or templates with no variance score 0.0.
fn zero_mean_correlation(image: &GrayImage, template: &GrayImage) -> ImageBuffer<Luma<f32>, Vec<f32>> {
    let (iw, ih) = image.dimensions();
    let (tw, th) = template.dimensions();
    let n = (tw * th) as f64;

    let template_mean = template.pixels().map(|p| p[0] as f64).sum::<f64>() / n;
    let deviations: Vec<f64> = template
        .pixels()
        .map(|p| p[0] as f64 - template_mean)
        .collect();
    let template_norm = deviations.iter().map(|d| d * d).sum::<f64>().sqrt();

    ImageBuffer::from_fn(iw - tw + 1, ih - th + 1, |ox, oy| {
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut cross = 0.0;

        for ty in 0..th {
            for tx in 0..tw {
                let value = image.get_pixel(ox + tx, oy + ty)[0] as f64;
                sum += value;
                sum_sq += value * value;
                // Deviations sum to zero, so the window mean drops out of the cross term
                cross += value * deviations[(ty * tw + tx) as usize];
            }
        }

        let window_var = (sum_sq - sum * sum / n).max(0.0);
        let denom = window_var.sqrt() * template_norm;
        let score = if denom > f64::EPSILON { cross / denom } else { 0.0 };
        Luma([score.clamp(-1.0, 1.0) as f32])
    })
}
