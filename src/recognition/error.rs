use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for recognition operations.
pub type ScanResult<T> = Result<T, RecognitionError>;

/// The error type for every stage of the recognition pipeline.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("No image file provided")]
    MissingImage,

    #[error("User ID is required")]
    MissingUser,

    #[error("Failed to decode image: {source}")]
    Decode {
        #[source]
        source: image::ImageError,
    },

    #[error("Templates directory not found (searched: {searched:?})")]
    TemplateDirNotFound { searched: Vec<PathBuf> },

    #[error("Failed to read templates directory {path:?}: {source}")]
    TemplateDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No template images found in {path:?}")]
    NoTemplates { path: PathBuf },

    #[error("Failed to load template {path:?}: {source}")]
    TemplateDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Template initialization timed out after {duration:?}")]
    TemplateTimeout { duration: Duration },

    #[error("Recognition task failed to complete: {source}")]
    Join {
        #[from]
        source: tokio::task::JoinError,
    },

    #[error("Invalid recognition config: {description}")]
    InvalidConfig { description: String },
}

impl RecognitionError {
    /// Errors the caller can fix by resubmitting the request; reported verbatim.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            RecognitionError::MissingImage | RecognitionError::MissingUser
        )
    }

    /// Whether the template library failed to load (configuration problem).
    pub fn is_asset_error(&self) -> bool {
        matches!(
            self,
            RecognitionError::TemplateDirNotFound { .. }
                | RecognitionError::TemplateDirUnreadable { .. }
                | RecognitionError::NoTemplates { .. }
                | RecognitionError::TemplateDecode { .. }
        )
    }

    /// Transient failures where an identical retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RecognitionError::TemplateTimeout { .. } | RecognitionError::Join { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_render_verbatim() {
        assert_eq!(
            RecognitionError::MissingImage.to_string(),
            "No image file provided"
        );
        assert_eq!(RecognitionError::MissingUser.to_string(), "User ID is required");
        assert!(RecognitionError::MissingImage.is_input_error());
        assert!(!RecognitionError::MissingImage.is_retryable());
    }

    #[test]
    fn test_error_classification() {
        let timeout = RecognitionError::TemplateTimeout {
            duration: Duration::from_secs(10),
        };
        assert!(timeout.is_retryable());
        assert!(!timeout.is_asset_error());

        let missing = RecognitionError::NoTemplates {
            path: PathBuf::from("templates"),
        };
        assert!(missing.is_asset_error());
        assert!(!missing.is_input_error());
    }
}
