use std::{path::Path, sync::Mutex};

use async_trait::async_trait;
use shared::domain::ProcessingStep;

use crate::pipeline::{
    subtitles::{Segment, Transcript},
    toolchain::{MediaToolchain, ToolError},
};

/// Toolchain that writes placeholder files instead of running ffmpeg/whisper.
pub(crate) struct FakeToolchain {
    fail_at: Option<ProcessingStep>,
    pub(crate) models: Mutex<Vec<String>>,
}

impl FakeToolchain {
    pub(crate) fn ok() -> Self {
        Self {
            fail_at: None,
            models: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_at(step: ProcessingStep) -> Self {
        Self {
            fail_at: Some(step),
            ..Self::ok()
        }
    }

    fn check(&self, step: ProcessingStep, stderr: &str) -> Result<(), ToolError> {
        if self.fail_at == Some(step) {
            return Err(ToolError::Failed {
                stderr: stderr.to_string(),
            });
        }
        Ok(())
    }
}

pub(crate) fn sample_transcript() -> Transcript {
    Transcript {
        segments: vec![
            Segment {
                start: 0.0,
                end: 1.5,
                text: " Hola".to_string(),
            },
            Segment {
                start: 1.5,
                end: 3.0,
                text: " mundo".to_string(),
            },
        ],
    }
}

#[async_trait]
impl MediaToolchain for FakeToolchain {
    async fn extract_audio(&self, video: &Path, wav: &Path) -> Result<(), ToolError> {
        self.check(ProcessingStep::ExtractAudio, "no audio stream")?;
        assert!(video.exists(), "video must be saved before extraction");
        tokio::fs::write(wav, b"RIFF")
            .await
            .map_err(|e| ToolError::Output(e.to_string()))
    }

    async fn transcribe(&self, wav: &Path, model: &str) -> Result<Transcript, ToolError> {
        self.check(ProcessingStep::Transcribe, "model not found")?;
        assert!(wav.exists(), "wav must exist before transcription");
        self.models
            .lock()
            .expect("models lock")
            .push(model.to_string());
        Ok(sample_transcript())
    }

    async fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        output: &Path,
    ) -> Result<(), ToolError> {
        self.check(ProcessingStep::BurnSubtitles, "invalid filter")?;
        assert!(subtitles.exists(), "subtitles must exist before burn-in");
        tokio::fs::copy(video, output)
            .await
            .map(|_| ())
            .map_err(|e| ToolError::Output(e.to_string()))
    }
}
