//! Slot candidate detection: blur, Canny edges, outer contours, box filtering

use super::config::RecognitionConfig;
use super::edges::canny_l1;
use super::ordering::dedupe_and_sort;
use super::types::SlotRect;
use image::{DynamicImage, GrayImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::filter::separable_filter_equal;

/// Finds grid-slot shaped regions in an inventory screenshot
#[derive(Debug, Clone)]
pub struct SlotDetector {
    config: RecognitionConfig,
}

impl SlotDetector {
    pub fn new(config: &RecognitionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Ordered, de-duplicated slot rectangles. Empty when nothing slot-shaped is found.
    pub fn detect_slots(&self, image: &DynamicImage) -> Vec<SlotRect> {
        self.detect_slots_gray(&image.to_luma8())
    }

    pub fn detect_slots_gray(&self, gray: &GrayImage) -> Vec<SlotRect> {
        let candidates = self.candidate_rects(gray);
        let ordered = dedupe_and_sort(candidates, self.config.position_eps, self.config.row_band);
        log::debug!("📐 {} slot(s) after de-duplication", ordered.len());
        ordered
    }

    /// Bounding boxes of outermost contours that pass the size/shape filter,
    /// in contour discovery order.
    pub fn candidate_rects(&self, gray: &GrayImage) -> Vec<SlotRect> {
        let blurred = separable_filter_equal(gray, &self.config.blur_kernel);
        let edges = canny_l1(&blurred, self.config.canny_low, self.config.canny_high);
        let contours = find_contours::<i32>(&edges);

        let outer: Vec<SlotRect> = contours
            .iter()
            .filter(|c| c.parent.is_none() && matches!(c.border_type, BorderType::Outer))
            .filter_map(|c| SlotRect::bounding(&c.points))
            .collect();

        let accepted: Vec<SlotRect> = outer.iter().copied().filter(|r| self.accepts(r)).collect();

        log::debug!(
            "🔍 Edge scan {}x{}: {} contours, {} outer, {} slot-shaped",
            gray.width(),
            gray.height(),
            contours.len(),
            outer.len(),
            accepted.len()
        );

        accepted
    }

    /// Size and shape filter applied to every candidate rectangle.
    pub fn accepts(&self, rect: &SlotRect) -> bool {
        let area = rect.area();
        let aspect = rect.aspect();
        area >= self.config.min_area
            && area <= self.config.max_area
            && aspect >= self.config.min_aspect
            && aspect <= self.config.max_aspect
    }
}
