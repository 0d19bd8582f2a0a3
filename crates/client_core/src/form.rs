//! Upload form contents: the picked video plus any extra fields.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use shared::{
    domain::{SelectedFile, SubtitleFormat},
    protocol::{DEFAULT_WHISPER_MODEL, FORMAT_FIELD, MODEL_FIELD, VIDEO_FIELD},
};

#[derive(Debug, Clone)]
enum FileContent {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// A file chosen in the picker. Content on disk is read only when the form is
/// submitted.
#[derive(Debug, Clone)]
pub struct FormFile {
    info: SelectedFile,
    content: FileContent,
}

impl FormFile {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            info: SelectedFile::new(name, bytes.len() as u64),
            content: FileContent::Bytes(bytes),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("failed to stat '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("'{}' does not name a file", path.display()))?;

        Ok(Self {
            info: SelectedFile::new(name, metadata.len()),
            content: FileContent::Path(path.to_path_buf()),
        })
    }

    pub fn info(&self) -> &SelectedFile {
        &self.info
    }

    async fn into_part(self) -> Result<Part> {
        let bytes = match self.content {
            FileContent::Bytes(bytes) => bytes,
            FileContent::Path(path) => tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read '{}'", path.display()))?,
        };
        let mime = mime_guess::from_path(&self.info.name).first_or_octet_stream();
        let part = Part::bytes(bytes)
            .file_name(self.info.name)
            .mime_str(mime.essence_str())?;
        Ok(part)
    }
}

/// Field values of the upload form. `reset` restores the defaults the form
/// was created with and forgets the picked file.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    file: Option<FormFile>,
    fields: BTreeMap<String, String>,
    defaults: BTreeMap<String, String>,
}

impl UploadForm {
    pub fn with_defaults<K, V>(defaults: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let defaults: BTreeMap<String, String> = defaults
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        Self {
            file: None,
            fields: defaults.clone(),
            defaults,
        }
    }

    /// The subtitler page's form: subtitle format and Whisper model selects.
    pub fn subtitler() -> Self {
        Self::with_defaults([
            (FORMAT_FIELD, SubtitleFormat::default().extension()),
            (MODEL_FIELD, DEFAULT_WHISPER_MODEL),
        ])
    }

    pub fn set_file(&mut self, file: FormFile) {
        self.file = Some(file);
    }

    pub fn file(&self) -> Option<&FormFile> {
        self.file.as_ref()
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn reset(&mut self) {
        self.file = None;
        self.fields = self.defaults.clone();
    }

    /// Serializes the form as multipart data: the file under `video`, every
    /// other field as a text part.
    pub async fn into_multipart(self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        if let Some(file) = self.file {
            form = form.part(VIDEO_FIELD, file.into_part().await?);
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_defaults_and_drops_file() {
        let mut form = UploadForm::subtitler();
        form.set_field(FORMAT_FIELD, "vtt");
        form.set_field("language", "es");
        form.set_file(FormFile::from_bytes("clip.mp4", vec![0; 16]));

        form.reset();

        assert!(form.file().is_none());
        assert_eq!(form.field(FORMAT_FIELD), Some("srt"));
        assert_eq!(form.field(MODEL_FIELD), Some("base"));
        assert_eq!(form.field("language"), None);
    }

    #[tokio::test]
    async fn from_path_reports_name_and_size() {
        let path = std::env::temp_dir().join(format!(
            "client_core_form_{}.mp4",
            std::process::id()
        ));
        tokio::fs::write(&path, vec![7u8; 2048]).await.expect("write");

        let file = FormFile::from_path(&path).await.expect("form file");
        assert_eq!(file.info().size_bytes, 2048);
        assert!(file.info().name.ends_with(".mp4"));

        tokio::fs::remove_file(&path).await.expect("cleanup");
    }
}
