use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 500 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub ffmpeg_bin: String,
    pub whisper_bin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "0.0.0.0:5000".into(),
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ffmpeg_bin: "ffmpeg".into(),
            whisper_bin: "whisper".into(),
        }
    }
}

/// Keys accepted in `server.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind_addr: Option<String>,
    upload_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    max_upload_bytes: Option<usize>,
    ffmpeg_bin: Option<String>,
    whisper_bin: Option<String>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file_config(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

pub(crate) fn apply_file_config(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<FileConfig>(raw) else {
        tracing::warn!("ignoring unparsable server.toml");
        return;
    };

    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.upload_dir {
        settings.upload_dir = v;
    }
    if let Some(v) = file_cfg.output_dir {
        settings.output_dir = v;
    }
    if let Some(v) = file_cfg.max_upload_bytes {
        settings.max_upload_bytes = v;
    }
    if let Some(v) = file_cfg.ffmpeg_bin {
        settings.ffmpeg_bin = v;
    }
    if let Some(v) = file_cfg.whisper_bin {
        settings.whisper_bin = v;
    }
}

pub(crate) fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = var("APP__UPLOAD_DIR") {
        settings.upload_dir = PathBuf::from(v);
    }
    if let Some(v) = var("APP__OUTPUT_DIR") {
        settings.output_dir = PathBuf::from(v);
    }

    if let Some(v) = var("APP__MAX_UPLOAD_BYTES") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_upload_bytes = parsed;
        }
    }

    if let Some(v) = var("FFMPEG_BIN") {
        settings.ffmpeg_bin = v;
    }
    if let Some(v) = var("APP__FFMPEG_BIN") {
        settings.ffmpeg_bin = v;
    }
    if let Some(v) = var("WHISPER_BIN") {
        settings.whisper_bin = v;
    }
    if let Some(v) = var("APP__WHISPER_BIN") {
        settings.whisper_bin = v;
    }
}

/// Creates the upload and output directories if they are missing.
pub fn prepare_dirs(settings: &Settings) -> anyhow::Result<()> {
    ensure_dir(&settings.upload_dir)?;
    ensure_dir(&settings.output_dir)?;
    Ok(())
}

fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory '{}'", path.display()))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
