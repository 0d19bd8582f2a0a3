use serde::{Deserialize, Serialize};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// A file picked in the upload form, as far as the form needs to know it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub name: String,
    pub size_bytes: u64,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
        }
    }

    pub fn size_mib(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_MIB
    }

    /// Label shown next to the file picker, e.g. `clip.mp4 (1.50 MB)`.
    /// Exact halves round up, so 0.125 MiB shows as `0.13`.
    pub fn display_label(&self) -> String {
        let rounded = (self.size_mib() * 100.0).round() / 100.0;
        format!("{} ({:.2} MB)", self.name, rounded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStep {
    ExtractAudio,
    Transcribe,
    GenerateSubtitles,
    BurnSubtitles,
}

impl ProcessingStep {
    pub const ALL: [ProcessingStep; 4] = [
        ProcessingStep::ExtractAudio,
        ProcessingStep::Transcribe,
        ProcessingStep::GenerateSubtitles,
        ProcessingStep::BurnSubtitles,
    ];

    /// 1-based step number, as reported by the server on failure.
    pub fn number(self) -> u8 {
        match self {
            ProcessingStep::ExtractAudio => 1,
            ProcessingStep::Transcribe => 2,
            ProcessingStep::GenerateSubtitles => 3,
            ProcessingStep::BurnSubtitles => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProcessingStep::ExtractAudio => "Extrayendo audio",
            ProcessingStep::Transcribe => "Transcribiendo con Whisper",
            ProcessingStep::GenerateSubtitles => "Generando subtítulos",
            ProcessingStep::BurnSubtitles => "Incrustando subtítulos",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
}

/// Cosmetic progress over the four processing steps.
///
/// `current_step` runs from 0 to `ProcessingStep::ALL.len()`. The timer-driven
/// [`ProgressState::advance`] stops at the last step; only
/// [`ProgressState::complete`] reaches the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressState {
    current_step: usize,
}

impl ProgressState {
    pub const STEP_COUNT: usize = ProcessingStep::ALL.len();

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Moves one step forward. Returns whether anything changed.
    pub fn advance(&mut self) -> bool {
        if self.current_step < Self::STEP_COUNT - 1 {
            self.current_step += 1;
            true
        } else {
            false
        }
    }

    pub fn complete(&mut self) {
        self.current_step = Self::STEP_COUNT;
    }

    pub fn reset(&mut self) {
        self.current_step = 0;
    }

    pub fn is_complete(&self) -> bool {
        self.current_step == Self::STEP_COUNT
    }

    pub fn status_of(&self, index: usize) -> StepStatus {
        if index < self.current_step {
            StepStatus::Completed
        } else if index == self.current_step {
            StepStatus::Active
        } else {
            StepStatus::Pending
        }
    }

    pub fn statuses(&self) -> [(ProcessingStep, StepStatus); 4] {
        ProcessingStep::ALL.map(|step| (step, self.status_of(step.number() as usize - 1)))
    }

    pub fn fill_percent(&self) -> f64 {
        self.current_step as f64 / Self::STEP_COUNT as f64 * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    #[default]
    Srt,
    Vtt,
}

impl SubtitleFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
        }
    }

    /// Parses a form value, falling back to SRT for anything unknown.
    pub fn from_form_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "vtt" => SubtitleFormat::Vtt,
            _ => SubtitleFormat::Srt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_label_uses_binary_megabytes_with_two_decimals() {
        assert_eq!(
            SelectedFile::new("clip.mp4", 1_572_864).display_label(),
            "clip.mp4 (1.50 MB)"
        );
        assert_eq!(
            SelectedFile::new("tiny.webm", 5_000).display_label(),
            "tiny.webm (0.00 MB)"
        );
        assert_eq!(
            SelectedFile::new("big.mkv", 10_490_000).display_label(),
            "big.mkv (10.00 MB)"
        );
        assert_eq!(
            SelectedFile::new("a.mp4", 131_072).display_label(),
            "a.mp4 (0.13 MB)"
        );
        assert_eq!(
            SelectedFile::new("b.mp4", 655_360).display_label(),
            "b.mp4 (0.63 MB)"
        );
    }

    #[test]
    fn advance_stops_at_last_step() {
        let mut progress = ProgressState::default();
        for _ in 0..10 {
            progress.advance();
        }
        assert_eq!(progress.current_step(), ProgressState::STEP_COUNT - 1);
        assert_eq!(progress.fill_percent(), 75.0);
        assert!(!progress.is_complete());
        assert!(!progress.advance());
    }

    #[test]
    fn step_statuses_follow_current_step() {
        let mut progress = ProgressState::default();
        progress.advance();
        let statuses: Vec<StepStatus> = progress.statuses().iter().map(|(_, s)| *s).collect();
        assert_eq!(
            statuses,
            vec![
                StepStatus::Completed,
                StepStatus::Active,
                StepStatus::Pending,
                StepStatus::Pending
            ]
        );

        progress.complete();
        assert!(progress
            .statuses()
            .iter()
            .all(|(_, status)| *status == StepStatus::Completed));
        assert_eq!(progress.fill_percent(), 100.0);

        progress.reset();
        assert_eq!(progress.status_of(0), StepStatus::Active);
        assert_eq!(progress.fill_percent(), 0.0);
    }

    #[test]
    fn unknown_subtitle_format_falls_back_to_srt() {
        assert_eq!(SubtitleFormat::from_form_value("VTT"), SubtitleFormat::Vtt);
        assert_eq!(SubtitleFormat::from_form_value("ass"), SubtitleFormat::Srt);
        assert_eq!(SubtitleFormat::from_form_value(""), SubtitleFormat::Srt);
    }
}
