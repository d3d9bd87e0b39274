//! Inventory screenshot recognition
//!
//! Finds grid slots in a screenshot, scores each slot against a library of
//! known blueprint icons and reports which blueprints were found.

pub mod config;
pub mod detector;
pub mod edges;
pub mod error;
pub mod matcher;
pub mod ordering;
pub mod recognizer;
pub mod template;
pub mod types;


// Re-export main types and functions
pub use config::{MatchMethod, RecognitionConfig, create_strict_config};
pub use detector::SlotDetector;
pub use edges::canny_l1;
pub use error::{RecognitionError, ScanResult};
pub use matcher::{TemplateMatcher, correlation_peak, resize_to_canonical};
pub use ordering::dedupe_and_sort;
pub use recognizer::Recognizer;
pub use template::{TEMPLATES_ENV_VAR, TemplateLibrary, TemplateSource, load_templates};
pub use types::{BestMatch, RecognitionResult, RecognitionStage, SlotMatch, SlotRect, Template};
