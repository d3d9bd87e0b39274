mod args;

use args::Args;
use blueprint_scan::{JsonFileStore, RecognitionConfig, Recognizer};
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let Some(args) = Args::parse() else {
        return ExitCode::SUCCESS;
    };

    let default_level = if args.debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut config = RecognitionConfig::default();
    if let Some(threshold) = args.threshold {
        config.match_threshold = threshold;
    }

    let store = Arc::new(JsonFileStore::new(&args.store_path));
    let recognizer = match Recognizer::with_shared_templates(config, args.templates, store) {
        Ok(recognizer) => recognizer,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match read_image(args.image.as_deref()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = recognizer
        .recognize(&args.user_id, image_bytes.as_deref())
        .await;

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("❌ Failed to serialize result: {e}");
            return ExitCode::FAILURE;
        }
    }

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Screenshot bytes for `--image`. No path at all is passed on as `None` so
/// the recognizer reports it like an empty upload; an unreadable path is an error.
async fn read_image(path: Option<&Path>) -> io::Result<Option<Vec<u8>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    tokio::fs::read(path)
        .await
        .map(Some)
        .map_err(|e| io::Error::new(e.kind(), format!("Failed to read image {:?}: {e}", path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreadable_image_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");

        let err = read_image(Some(missing.as_path())).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("missing.png"), "{err}");
    }

    #[tokio::test]
    async fn test_image_bytes_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::write(&path, b"bytes").unwrap();

        assert_eq!(read_image(Some(path.as_path())).await.unwrap(), Some(b"bytes".to_vec()));
        assert_eq!(read_image(None).await.unwrap(), None);
    }
}
