//! Configuration for slot detection and template matching

use super::error::{RecognitionError, ScanResult};
use std::time::Duration;

/// Correlation score used to compare a slot crop with a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// Mean-subtracted normalized cross-correlation (correlation coefficient).
    /// Flat images score 0.0, a perfect linear match scores 1.0.
    ZeroMeanNormalized,
    /// `imageproc`'s normalized cross-correlation without mean removal.
    CrossCorrelationNormalized,
}

#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// Smallest accepted slot bounding-box area in pixels
    pub min_area: i64,
    /// Largest accepted slot bounding-box area in pixels
    pub max_area: i64,
    /// Lowest accepted width/height ratio
    pub min_aspect: f32,
    /// Highest accepted width/height ratio
    pub max_aspect: f32,
    /// Rectangles closer than this on both axes are duplicates
    pub position_eps: i32,
    /// Vertical jitter tolerated inside one grid row
    pub row_band: i32,
    /// Canonical side length every slot crop and template is rescaled to
    pub slot_size: u32,
    /// Minimum confidence for a slot to be attributed to a template
    pub match_threshold: f32,
    /// Canny hysteresis low threshold
    pub canny_low: f32,
    /// Canny hysteresis high threshold
    pub canny_high: f32,
    /// Separable smoothing kernel applied before edge detection
    pub blur_kernel: [f32; 5],
    /// How long a caller waits for the template library to become ready
    pub init_timeout: Duration,
    pub match_method: MatchMethod,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            min_area: 2500,
            max_area: 25000,
            min_aspect: 0.8,
            max_aspect: 1.2,
            position_eps: 6,
            row_band: 10,
            slot_size: 64,
            match_threshold: 0.75,
            canny_low: 50.0,
            canny_high: 150.0,
            // 5x5 Gaussian with automatic sigma, as binomial weights
            blur_kernel: [0.0625, 0.25, 0.375, 0.25, 0.0625],
            init_timeout: Duration::from_secs(10),
            match_method: MatchMethod::ZeroMeanNormalized,
        }
    }
}

impl RecognitionConfig {
    /// Reject settings that would make the pipeline silently detect nothing.
    pub fn validate(&self) -> ScanResult<()> {
        let invalid = |description: String| Err(RecognitionError::InvalidConfig { description });

        if self.min_area <= 0 || self.min_area > self.max_area {
            return invalid(format!(
                "area range [{}, {}] is empty",
                self.min_area, self.max_area
            ));
        }
        if self.min_aspect <= 0.0 || self.min_aspect > self.max_aspect {
            return invalid(format!(
                "aspect range [{}, {}] is empty",
                self.min_aspect, self.max_aspect
            ));
        }
        if self.slot_size == 0 {
            return invalid("slot size must be non-zero".to_string());
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return invalid(format!(
                "match threshold {} is outside [0, 1]",
                self.match_threshold
            ));
        }
        if self.canny_low > self.canny_high {
            return invalid(format!(
                "canny low threshold {} exceeds high threshold {}",
                self.canny_low, self.canny_high
            ));
        }
        if self.position_eps < 0 || self.row_band < 0 {
            return invalid("position tolerances must be non-negative".to_string());
        }
        Ok(())
    }
}

/// Configuration preset that only attributes near-exact icon matches
pub fn create_strict_config() -> RecognitionConfig {
    RecognitionConfig {
        match_threshold: 0.9,
        ..RecognitionConfig::default()
    }
}
