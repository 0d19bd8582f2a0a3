use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use shared::protocol::{ProcessResponse, ProcessedFiles, PROCESS_ROUTE};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use url::Url;

pub mod controller;
pub mod error;
pub mod form;
pub mod page;
pub mod progress;

pub use controller::{ControllerTimings, CycleOutcome, UploadController};
pub use error::{ControllerError, SubmissionError};
pub use form::{FormFile, UploadForm};
pub use page::{PageState, Panel, SubmitControl};

/// Whatever turns a submitted form into produced files. The HTTP client is the
/// real implementation; tests substitute their own.
#[async_trait]
pub trait ProcessingBackend: Send + Sync {
    async fn process(&self, form: UploadForm) -> Result<ProcessedFiles, SubmissionError>;
}

#[async_trait]
impl<T: ProcessingBackend + ?Sized> ProcessingBackend for std::sync::Arc<T> {
    async fn process(&self, form: UploadForm) -> Result<ProcessedFiles, SubmissionError> {
        (**self).process(form).await
    }
}

pub struct UploadClient {
    http: Client,
    server_url: String,
}

impl UploadClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Resolves a server-relative route (such as a download href) the way a
    /// page served from `server_url` would.
    pub fn endpoint(&self, route: &str) -> Result<Url> {
        let base = Url::parse(&self.server_url)
            .with_context(|| format!("invalid server url '{}'", self.server_url))?;
        base.join(route).with_context(|| format!("invalid route '{route}'"))
    }

    /// Posts the form to `/process`.
    ///
    /// Succeeds only for a 2xx status whose body has a true `success` flag.
    /// Every other outcome becomes a [`SubmissionError`] carrying the body's
    /// `error` text, or the generic message when there is none.
    pub async fn process_video(&self, form: UploadForm) -> Result<ProcessedFiles, SubmissionError> {
        let url = self.endpoint(PROCESS_ROUTE).map_err(|error| {
            warn!(%error, "cannot build processing endpoint");
            SubmissionError::generic()
        })?;
        let multipart = form.into_multipart().await.map_err(|error| {
            warn!(%error, "failed to prepare upload form");
            SubmissionError::generic()
        })?;

        let response = self
            .http
            .post(url)
            .multipart(multipart)
            .send()
            .await
            .map_err(|error| {
                warn!(%error, "processing request failed");
                SubmissionError::generic()
            })?;

        let status = response.status();
        let raw = response.bytes().await.map_err(|error| {
            warn!(%error, %status, "failed to read processing response");
            SubmissionError::generic()
        })?;
        let body: ProcessResponse = serde_json::from_slice(&raw).map_err(|error| {
            warn!(%error, %status, "processing response is not valid JSON");
            SubmissionError::generic()
        })?;

        if status.is_success() {
            if let Some(files) = body.processed_files() {
                return Ok(files);
            }
        }

        warn!(%status, success = body.success, "server rejected processing request");
        Err(SubmissionError::from_server_message(body.error))
    }

    /// Fetches a produced file through its download href and writes it to
    /// `dest` chunk by chunk. Returns the number of bytes written.
    pub async fn download_to(&self, href: &str, dest: &Path) -> Result<u64> {
        let url = self.endpoint(href)?;
        info!(%url, dest = %dest.display(), "downloading processed file");
        let response = self.http.get(url).send().await?.error_for_status()?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("failed to create '{}'", dest.display()))?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("failed to write '{}'", dest.display()))?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl ProcessingBackend for UploadClient {
    async fn process(&self, form: UploadForm) -> Result<ProcessedFiles, SubmissionError> {
        self.process_video(form).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
