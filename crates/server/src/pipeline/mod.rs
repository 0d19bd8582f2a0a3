//! The four processing steps behind `POST /process`.

use std::path::{Path, PathBuf};

use shared::{
    domain::{ProcessingStep, SubtitleFormat},
    protocol::ProcessedFiles,
};
use thiserror::Error;
use tracing::{info, warn};

pub mod subtitles;
pub mod toolchain;

use toolchain::{MediaToolchain, ToolError};

#[derive(Debug, Clone)]
pub struct WorkDirs {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// One uploaded video, already saved under the upload directory.
#[derive(Debug, Clone)]
pub struct ProcessJob {
    pub video_path: PathBuf,
    pub base_name: String,
    pub format: SubtitleFormat,
    pub model: String,
}

impl ProcessJob {
    pub fn subtitle_file(&self) -> String {
        format!("{}.{}", self.base_name, self.format.extension())
    }

    pub fn output_video(&self) -> String {
        format!("{}_subtitled.mp4", self.base_name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("FFmpeg error: {0}")]
    ExtractAudio(#[source] ToolError),
    #[error("Whisper error: {0}")]
    Transcribe(#[source] ToolError),
    #[error("Subtitle generation error: {0}")]
    GenerateSubtitles(#[source] std::io::Error),
    #[error("FFmpeg burn error: {0}")]
    BurnSubtitles(#[source] ToolError),
}

impl PipelineError {
    pub fn step(&self) -> ProcessingStep {
        match self {
            PipelineError::ExtractAudio(_) => ProcessingStep::ExtractAudio,
            PipelineError::Transcribe(_) => ProcessingStep::Transcribe,
            PipelineError::GenerateSubtitles(_) => ProcessingStep::GenerateSubtitles,
            PipelineError::BurnSubtitles(_) => ProcessingStep::BurnSubtitles,
        }
    }
}

/// Runs extraction, transcription, subtitle generation and burn-in in order,
/// stopping at the first failure. The uploaded video and intermediate wav are
/// removed afterwards whatever the outcome.
pub async fn run_pipeline(
    toolchain: &dyn MediaToolchain,
    dirs: &WorkDirs,
    job: &ProcessJob,
) -> Result<ProcessedFiles, PipelineError> {
    let wav_path = dirs.upload_dir.join(format!("{}.wav", job.base_name));
    let result = run_steps(toolchain, dirs, job, &wav_path).await;

    remove_if_present(&wav_path).await;
    remove_if_present(&job.video_path).await;

    if let Err(error) = &result {
        warn!(
            base_name = %job.base_name,
            step = error.step().number(),
            %error,
            "pipeline failed"
        );
    }
    result
}

async fn run_steps(
    toolchain: &dyn MediaToolchain,
    dirs: &WorkDirs,
    job: &ProcessJob,
    wav_path: &Path,
) -> Result<ProcessedFiles, PipelineError> {
    let subtitle_file = job.subtitle_file();
    let output_video = job.output_video();
    let subtitle_path = dirs.output_dir.join(&subtitle_file);
    let output_video_path = dirs.output_dir.join(&output_video);

    info!(base_name = %job.base_name, "extracting audio");
    toolchain
        .extract_audio(&job.video_path, wav_path)
        .await
        .map_err(PipelineError::ExtractAudio)?;

    info!(base_name = %job.base_name, model = %job.model, "transcribing");
    let transcript = toolchain
        .transcribe(wav_path, &job.model)
        .await
        .map_err(PipelineError::Transcribe)?;

    info!(
        base_name = %job.base_name,
        segments = transcript.segments.len(),
        format = job.format.extension(),
        "generating subtitles"
    );
    let rendered = subtitles::render(&transcript, job.format);
    tokio::fs::write(&subtitle_path, rendered)
        .await
        .map_err(PipelineError::GenerateSubtitles)?;

    info!(base_name = %job.base_name, "burning subtitles");
    toolchain
        .burn_subtitles(&job.video_path, &subtitle_path, &output_video_path)
        .await
        .map_err(PipelineError::BurnSubtitles)?;

    Ok(ProcessedFiles {
        subtitle_file,
        output_video,
    })
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => warn!(path = %path.display(), %error, "failed to remove work file"),
    }
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
