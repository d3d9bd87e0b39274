//! Recognition data types

use image::GrayImage;
use imageproc::point::Point;
use serde::Serialize;

/// Axis-aligned slot candidate in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl SlotRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle containing every point (both edges inclusive).
    pub fn bounding(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Whether the top-left corners are closer than `eps` pixels on both axes.
    pub fn is_near(&self, other: &SlotRect, eps: i32) -> bool {
        (self.x - other.x).abs() < eps && (self.y - other.y).abs() < eps
    }
}

/// A reference icon, stored as intensity pixels at the canonical slot size.
#[derive(Debug, Clone)]
pub struct Template {
    /// Identity key: the asset file's base name
    pub name: String,
    pub pixels: GrayImage,
}

impl Template {
    pub fn new(name: impl Into<String>, pixels: GrayImage) -> Self {
        Self {
            name: name.into(),
            pixels,
        }
    }
}

/// Highest-scoring template for one slot, before thresholding.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
    pub name: Option<String>,
    pub confidence: f32,
}

impl BestMatch {
    pub fn none() -> Self {
        Self {
            name: None,
            confidence: 0.0,
        }
    }
}

/// Outcome for one ordered slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotMatch {
    #[serde(rename = "slot")]
    pub slot_index: usize,
    /// Present only when `confidence` reached the match threshold
    #[serde(rename = "blueprint")]
    pub template_name: Option<String>,
    /// Best score across the template set, rounded to 3 decimals
    pub confidence: f32,
}

impl SlotMatch {
    /// Apply the acceptance threshold to the raw best score.
    pub fn from_best(slot_index: usize, best: BestMatch, threshold: f32) -> Self {
        let template_name = if best.confidence >= threshold {
            best.name
        } else {
            None
        };
        Self {
            slot_index,
            template_name,
            confidence: round_confidence(best.confidence),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.template_name.is_some()
    }
}

fn round_confidence(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

/// Caller-facing summary of one recognition request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<SlotMatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots_detected: Option<usize>,
}

impl RecognitionResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            matches: None,
            slots_detected: None,
        }
    }

    /// Successful run that found no slot-shaped regions.
    pub fn no_slots() -> Self {
        Self {
            success: true,
            message: "No blueprint slots detected in image".to_string(),
            matches: Some(Vec::new()),
            slots_detected: Some(0),
        }
    }

    pub fn found(matches: Vec<SlotMatch>, slots_detected: usize) -> Self {
        Self {
            success: true,
            message: format!(
                "Found {} blueprint(s) from {} detected slot(s)",
                matches.len(),
                slots_detected
            ),
            matches: Some(matches),
            slots_detected: Some(slots_detected),
        }
    }
}

/// Pipeline progress for one request; failures exit from whichever stage was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionStage {
    Idle,
    TemplatesReady,
    SlotsDetected,
    SlotsMatched,
    PersistenceUpdated,
    Done,
}
