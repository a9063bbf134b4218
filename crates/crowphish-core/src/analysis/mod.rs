//! Screenshot analysis.
//!
//! Reads the image, picks its media type and hands it to the Gemini client.

pub mod gemini;
pub mod mime;
pub mod model;
pub mod prompt;

use std::path::Path;

use tracing::debug;

use crate::error::{TriageError, TriageResult};
use gemini::GeminiClient;
use model::AnalysisResult;

/// Read an image file, mapping a missing file to `TriageError::FileNotFound`.
pub fn read_image(path: &Path) -> TriageResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TriageError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => TriageError::Io(e),
    })
}

/// Analyze one email screenshot for phishing.
pub async fn analyze_screenshot(client: &GeminiClient, path: &Path) -> TriageResult<AnalysisResult> {
    let image = read_image(path)?;
    let mime_type = mime::detect_media_type(path);
    debug!(path = %path.display(), mime_type, size = image.len(), "Loaded screenshot");

    client.analyze(&image, mime_type).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriageConfig;
    use std::path::PathBuf;

    fn offline_client() -> GeminiClient {
        // Port 9 (discard) on loopback; nothing should ever be sent there.
        let mut config = TriageConfig::new("test-key");
        config.base_url = "http://127.0.0.1:9".to_string();
        GeminiClient::new(&config).unwrap()
    }

    #[test]
    fn test_read_image_missing() {
        let path = PathBuf::from("/definitely/not/here/mail.png");
        let err = read_image(&path).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("/definitely/not/here/mail.png"));
    }

    #[test]
    fn test_read_image_directory_is_io_error() {
        let err = read_image(&std::env::temp_dir()).unwrap_err();
        assert!(matches!(err, TriageError::Io(_)));
    }

    #[test]
    fn test_read_image_ok() {
        let path = std::env::temp_dir().join(format!("crowphish-read-{}.png", std::process::id()));
        std::fs::write(&path, b"pixels").unwrap();
        let bytes = read_image(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(bytes, b"pixels");
    }

    #[tokio::test]
    async fn test_missing_file_reported_before_network() {
        let path = PathBuf::from("no-such-screenshot.jpg");
        let err = analyze_screenshot(&offline_client(), &path).await.unwrap_err();
        match err {
            TriageError::FileNotFound { path } => {
                assert_eq!(path, PathBuf::from("no-such-screenshot.jpg"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
