//! External tools behind the pipeline: ffmpeg for audio and burn-in, the
//! Whisper CLI for transcription.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use super::subtitles::Transcript;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },
    #[error("{stderr}")]
    Failed { stderr: String },
    #[error("{0}")]
    Output(String),
}

#[async_trait]
pub trait MediaToolchain: Send + Sync {
    /// Extracts a 16 kHz mono PCM wav track from the video.
    async fn extract_audio(&self, video: &Path, wav: &Path) -> Result<(), ToolError>;

    async fn transcribe(&self, wav: &Path, model: &str) -> Result<Transcript, ToolError>;

    /// Renders the subtitle file into the video frames.
    async fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        output: &Path,
    ) -> Result<(), ToolError>;
}

#[derive(Debug, Clone)]
pub struct CommandToolchain {
    pub ffmpeg_bin: String,
    pub whisper_bin: String,
}

#[async_trait]
impl MediaToolchain for CommandToolchain {
    async fn extract_audio(&self, video: &Path, wav: &Path) -> Result<(), ToolError> {
        run(&self.ffmpeg_bin, extract_audio_args(video, wav)).await
    }

    async fn transcribe(&self, wav: &Path, model: &str) -> Result<Transcript, ToolError> {
        let output_dir = wav
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        run(&self.whisper_bin, whisper_args(wav, model, output_dir)).await?;

        let json_path = whisper_json_path(wav);
        let raw = tokio::fs::read(&json_path).await.map_err(|error| {
            ToolError::Output(format!(
                "missing transcript '{}': {error}",
                json_path.display()
            ))
        })?;
        let _ = tokio::fs::remove_file(&json_path).await;

        serde_json::from_slice(&raw)
            .map_err(|error| ToolError::Output(format!("invalid transcript JSON: {error}")))
    }

    async fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        output: &Path,
    ) -> Result<(), ToolError> {
        run(&self.ffmpeg_bin, burn_subtitles_args(video, subtitles, output)).await
    }
}

async fn run(program: &str, args: Vec<OsString>) -> Result<(), ToolError> {
    debug!(program, ?args, "running external tool");
    let output = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| ToolError::Launch {
            program: program.to_string(),
            source,
        })?;

    if output.status.success() {
        return Ok(());
    }
    Err(ToolError::Failed {
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

pub(crate) fn extract_audio_args(video: &Path, wav: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), video.into()];
    args.extend(
        ["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1", "-y"]
            .into_iter()
            .map(OsString::from),
    );
    args.push(wav.into());
    args
}

pub(crate) fn whisper_args(wav: &Path, model: &str, output_dir: &Path) -> Vec<OsString> {
    vec![
        wav.into(),
        "--model".into(),
        model.into(),
        "--output_format".into(),
        "json".into(),
        "--output_dir".into(),
        output_dir.into(),
    ]
}

/// Whisper names its output after the input file's stem.
pub(crate) fn whisper_json_path(wav: &Path) -> PathBuf {
    wav.with_extension("json")
}

pub(crate) fn burn_subtitles_args(video: &Path, subtitles: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "-i".into(),
        video.into(),
        "-vf".into(),
        subtitles_filter(subtitles).into(),
        "-c:a".into(),
        "copy".into(),
        "-y".into(),
        output.into(),
    ]
}

/// ffmpeg's `subtitles` filter needs forward slashes and escaped colons
/// (drive letters on Windows).
pub(crate) fn subtitles_filter(subtitles: &Path) -> String {
    let path = subtitles
        .to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\\\:");
    format!("subtitles='{path}'")
}
