use super::*;
use crate::test_support::FakeToolchain;

struct Fixture {
    _root: tempfile::TempDir,
    dirs: WorkDirs,
    job: ProcessJob,
}

async fn fixture(format: SubtitleFormat) -> Fixture {
    let root = tempfile::tempdir().expect("tempdir");
    let dirs = WorkDirs {
        upload_dir: root.path().join("uploads"),
        output_dir: root.path().join("outputs"),
    };
    tokio::fs::create_dir_all(&dirs.upload_dir).await.expect("uploads");
    tokio::fs::create_dir_all(&dirs.output_dir).await.expect("outputs");

    let video_path = dirs.upload_dir.join("clip.mp4");
    tokio::fs::write(&video_path, b"video-bytes").await.expect("video");

    Fixture {
        _root: root,
        dirs,
        job: ProcessJob {
            video_path,
            base_name: "clip".to_string(),
            format,
            model: "small".to_string(),
        },
    }
}

#[tokio::test]
async fn successful_run_produces_both_files_and_cleans_up() {
    let fx = fixture(SubtitleFormat::Srt).await;
    let toolchain = FakeToolchain::ok();

    let files = run_pipeline(&toolchain, &fx.dirs, &fx.job)
        .await
        .expect("pipeline");

    assert_eq!(
        files,
        ProcessedFiles {
            subtitle_file: "clip.srt".to_string(),
            output_video: "clip_subtitled.mp4".to_string(),
        }
    );
    let srt = tokio::fs::read_to_string(fx.dirs.output_dir.join("clip.srt"))
        .await
        .expect("srt");
    assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,500\nHola\n\n"));
    assert!(fx.dirs.output_dir.join("clip_subtitled.mp4").exists());
    assert!(!fx.job.video_path.exists());
    assert!(!fx.dirs.upload_dir.join("clip.wav").exists());
    assert_eq!(*toolchain.models.lock().expect("lock"), vec!["small"]);
}

#[tokio::test]
async fn vtt_job_writes_vtt_file() {
    let fx = fixture(SubtitleFormat::Vtt).await;

    let files = run_pipeline(&FakeToolchain::ok(), &fx.dirs, &fx.job)
        .await
        .expect("pipeline");

    assert_eq!(files.subtitle_file, "clip.vtt");
    let vtt = tokio::fs::read_to_string(fx.dirs.output_dir.join("clip.vtt"))
        .await
        .expect("vtt");
    assert!(vtt.starts_with("WEBVTT\n\n00:00:00.000 --> 00:00:01.500\nHola\n\n"));
}

#[tokio::test]
async fn failures_report_their_step_and_tool_output() {
    let cases = [
        (ProcessingStep::ExtractAudio, "FFmpeg error: no audio stream"),
        (ProcessingStep::Transcribe, "Whisper error: model not found"),
        (ProcessingStep::BurnSubtitles, "FFmpeg burn error: invalid filter"),
    ];

    for (step, message) in cases {
        let fx = fixture(SubtitleFormat::Srt).await;
        let err = run_pipeline(&FakeToolchain::failing_at(step), &fx.dirs, &fx.job)
            .await
            .expect_err("must fail");
        assert_eq!(err.step(), step);
        assert_eq!(err.to_string(), message);
        assert!(!fx.job.video_path.exists());
    }
}

#[tokio::test]
async fn unwritable_output_dir_fails_subtitle_step() {
    let fx = fixture(SubtitleFormat::Srt).await;
    let dirs = WorkDirs {
        output_dir: fx.dirs.output_dir.join("missing"),
        ..fx.dirs.clone()
    };

    let err = run_pipeline(&FakeToolchain::ok(), &dirs, &fx.job)
        .await
        .expect_err("must fail");
    assert_eq!(err.step(), ProcessingStep::GenerateSubtitles);
    assert!(err.to_string().starts_with("Subtitle generation error:"));
}
