use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    CycleOutcome, FormFile, PageState, Panel, UploadClient, UploadController, UploadForm,
};
use shared::{
    domain::StepStatus,
    protocol::{ProcessedFiles, FORMAT_FIELD, MODEL_FIELD},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Upload a video, follow its processing and fetch the subtitled result")]
struct Args {
    /// Video file to upload.
    video: PathBuf,
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server_url: String,
    /// Subtitle format requested from the server (srt or vtt).
    #[arg(long, default_value = "srt")]
    format: String,
    /// Whisper model name.
    #[arg(long, default_value = "base")]
    model: String,
    /// Save both produced files here instead of only printing their links.
    #[arg(long)]
    download_dir: Option<PathBuf>,
    /// Extra form field sent along with the video, as NAME=VALUE.
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

fn step_marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "[ ]",
        StepStatus::Active => "[>]",
        StepStatus::Completed => "[x]",
    }
}

/// One line describing what the page currently shows.
fn render(page: &PageState) -> String {
    match page.visible_panel {
        None if page.file_info.is_empty() => String::new(),
        None => format!("Archivo: {}", page.file_info),
        Some(Panel::Progress) => {
            let steps = page
                .progress
                .statuses()
                .iter()
                .map(|(step, status)| format!("{} {}", step_marker(*status), step.label()))
                .collect::<Vec<_>>()
                .join("  ");
            format!("{:>3.0}% {steps}", page.progress.fill_percent())
        }
        Some(Panel::Result) => format!(
            "Listo: {} | {}",
            page.subtitle_href.as_deref().unwrap_or_default(),
            page.video_href.as_deref().unwrap_or_default()
        ),
        Some(Panel::Error) => format!("Error: {}", page.error_message),
    }
}

async fn save_results(client: &UploadClient, files: &ProcessedFiles, dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create '{}'", dir.display()))?;
    for (name, href) in [
        (&files.subtitle_file, files.subtitle_href()),
        (&files.output_video, files.video_href()),
    ] {
        let path = dir.join(name);
        let written = client.download_to(&href, &path).await?;
        println!("Guardado: {} ({written} bytes)", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let client = Arc::new(UploadClient::new(args.server_url));
    let controller = UploadController::new(Arc::clone(&client), UploadForm::subtitler());
    controller.set_field(FORMAT_FIELD, args.format).await;
    controller.set_field(MODEL_FIELD, args.model).await;
    for (name, value) in args.fields {
        controller.set_field(name, value).await;
    }
    controller
        .select_files([FormFile::from_path(&args.video).await?])
        .await;

    let mut page = controller.subscribe();
    let renderer = tokio::spawn(async move {
        let mut last = String::new();
        loop {
            let line = render(&page.borrow_and_update());
            if !line.is_empty() && line != last {
                println!("{line}");
                last = line;
            }
            if page.changed().await.is_err() {
                break;
            }
        }
    });

    let outcome = controller.submit().await?;
    drop(controller);
    let _ = renderer.await;

    match outcome {
        CycleOutcome::Succeeded(files) => {
            match &args.download_dir {
                Some(dir) => save_results(&client, &files, dir).await?,
                None => {
                    println!("{}", client.endpoint(&files.subtitle_href())?);
                    println!("{}", client.endpoint(&files.video_href())?);
                }
            }
            Ok(())
        }
        CycleOutcome::Failed(error) => bail!(error),
    }
}
