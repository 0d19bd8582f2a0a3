use serde::{Deserialize, Serialize};

pub const PROCESS_ROUTE: &str = "/process";
pub const DOWNLOAD_ROUTE_PREFIX: &str = "/download/";

/// Multipart field carrying the uploaded video.
pub const VIDEO_FIELD: &str = "video";
pub const FORMAT_FIELD: &str = "format";
pub const MODEL_FIELD: &str = "model";

pub const DEFAULT_WHISPER_MODEL: &str = "base";

/// Route the file server exposes for a produced file.
pub fn download_route(filename: &str) -> String {
    format!("{DOWNLOAD_ROUTE_PREFIX}{filename}")
}

/// Body of a `/process` response. Success and failure share one shape on the
/// wire; which fields are set depends on `success`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u8>,
}

impl ProcessResponse {
    pub fn processed(files: &ProcessedFiles) -> Self {
        Self {
            success: true,
            message: Some("Video processed successfully".to_string()),
            subtitle_file: Some(files.subtitle_file.clone()),
            output_video: Some(files.output_video.clone()),
            ..Self::default()
        }
    }

    /// The produced files, if this response reports a success carrying both.
    pub fn processed_files(&self) -> Option<ProcessedFiles> {
        if !self.success {
            return None;
        }
        Some(ProcessedFiles {
            subtitle_file: self.subtitle_file.clone()?,
            output_video: self.output_video.clone()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedFiles {
    pub subtitle_file: String,
    pub output_video: String,
}

impl ProcessedFiles {
    pub fn subtitle_href(&self) -> String {
        download_route(&self.subtitle_file)
    }

    pub fn video_href(&self) -> String {
        download_route(&self.output_video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_links_use_fixed_route_template() {
        let files = ProcessedFiles {
            subtitle_file: "a.srt".to_string(),
            output_video: "b.mp4".to_string(),
        };
        assert_eq!(files.subtitle_href(), "/download/a.srt");
        assert_eq!(files.video_href(), "/download/b.mp4");
    }

    #[test]
    fn failure_body_without_error_field_parses() {
        let body: ProcessResponse = serde_json::from_str(r#"{"success": false}"#).expect("json");
        assert!(!body.success);
        assert!(body.error.is_none());
        assert!(body.processed_files().is_none());
    }

    #[test]
    fn success_body_yields_processed_files() {
        let body: ProcessResponse = serde_json::from_value(serde_json::json!({
            "success": true,
            "subtitle_file": "a.srt",
            "output_video": "b.mp4"
        }))
        .expect("json");
        assert_eq!(
            body.processed_files(),
            Some(ProcessedFiles {
                subtitle_file: "a.srt".to_string(),
                output_video: "b.mp4".to_string(),
            })
        );
    }
}
