//! Subtitle rendering from a Whisper transcript.

use std::fmt::Write as _;

use serde::Deserialize;
use shared::domain::SubtitleFormat;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// The part of Whisper's JSON output the renderer needs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// `HH:MM:SS,mmm` for SRT, `HH:MM:SS.mmm` for VTT. Fractional milliseconds
/// are truncated.
pub fn format_timestamp(seconds: f64, format: SubtitleFormat) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    let millis = ((seconds % 1.0) * 1000.0).floor() as u64;
    let separator = match format {
        SubtitleFormat::Srt => ',',
        SubtitleFormat::Vtt => '.',
    };
    format!("{hours:02}:{minutes:02}:{secs:02}{separator}{millis:03}")
}

pub fn render(transcript: &Transcript, format: SubtitleFormat) -> String {
    let mut out = String::new();
    if format == SubtitleFormat::Vtt {
        out.push_str("WEBVTT\n\n");
    }

    for (index, segment) in transcript.segments.iter().enumerate() {
        let start = format_timestamp(segment.start, format);
        let end = format_timestamp(segment.end, format);
        let text = segment.text.trim();
        if format == SubtitleFormat::Srt {
            let _ = writeln!(out, "{}", index + 1);
        }
        let _ = write!(out, "{start} --> {end}\n{text}\n\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript() -> Transcript {
        Transcript {
            segments: vec![
                Segment {
                    start: 0.0,
                    end: 2.5,
                    text: " Hola a todos.".to_string(),
                },
                Segment {
                    start: 3_725.25,
                    end: 3_727.0,
                    text: "Segunda línea ".to_string(),
                },
            ],
        }
    }

    #[test]
    fn timestamps_use_format_specific_separator() {
        assert_eq!(format_timestamp(0.0, SubtitleFormat::Srt), "00:00:00,000");
        assert_eq!(
            format_timestamp(3_725.25, SubtitleFormat::Srt),
            "01:02:05,250"
        );
        assert_eq!(
            format_timestamp(3_725.25, SubtitleFormat::Vtt),
            "01:02:05.250"
        );
    }

    #[test]
    fn timestamps_truncate_fractional_milliseconds() {
        assert_eq!(format_timestamp(1.9999, SubtitleFormat::Srt), "00:00:01,999");
    }

    #[test]
    fn srt_numbers_cues_from_one() {
        assert_eq!(
            render(&transcript(), SubtitleFormat::Srt),
            "1\n00:00:00,000 --> 00:00:02,500\nHola a todos.\n\n\
             2\n01:02:05,250 --> 01:02:07,000\nSegunda línea\n\n"
        );
    }

    #[test]
    fn vtt_has_header_and_no_cue_numbers() {
        assert_eq!(
            render(&transcript(), SubtitleFormat::Vtt),
            "WEBVTT\n\n\
             00:00:00.000 --> 00:00:02.500\nHola a todos.\n\n\
             01:02:05.250 --> 01:02:07.000\nSegunda línea\n\n"
        );
    }

    #[test]
    fn transcript_parses_whisper_json() {
        let transcript: Transcript = serde_json::from_str(
            r#"{"text": "hi", "language": "en",
                "segments": [{"id": 0, "seek": 0, "start": 0.0, "end": 1.0, "text": " hi"}]}"#,
        )
        .expect("json");
        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(transcript.segments[0].text, " hi");
    }
}
