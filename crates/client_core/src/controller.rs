//! Upload page controller: file selection feedback, the submit cycle, and the
//! terminal success/error views.

use std::{sync::Arc, time::Duration};

use shared::protocol::ProcessedFiles;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::{
    error::{ControllerError, SubmissionError},
    form::{FormFile, UploadForm},
    page::{PageState, Panel, SubmitControl},
    progress::ProgressAnimator,
    ProcessingBackend,
};

const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(2_000);
const DEFAULT_RESULT_DELAY: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerTimings {
    /// Period of the cosmetic progress timer.
    pub progress_interval: Duration,
    /// Pause at 100% before the result panel replaces the progress panel.
    pub result_delay: Duration,
}

impl Default for ControllerTimings {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            result_delay: DEFAULT_RESULT_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Succeeded(ProcessedFiles),
    Failed(SubmissionError),
}

pub struct UploadController<B> {
    backend: B,
    page: Arc<watch::Sender<PageState>>,
    form: Mutex<UploadForm>,
    timings: ControllerTimings,
}

impl<B: ProcessingBackend> UploadController<B> {
    pub fn new(backend: B, form: UploadForm) -> Self {
        Self {
            backend,
            page: Arc::new(watch::Sender::new(PageState::default())),
            form: Mutex::new(form),
            timings: ControllerTimings::default(),
        }
    }

    pub fn with_timings(mut self, timings: ControllerTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<PageState> {
        self.page.subscribe()
    }

    pub fn page(&self) -> PageState {
        self.page.borrow().clone()
    }

    pub async fn form(&self) -> UploadForm {
        self.form.lock().await.clone()
    }

    /// File-picker change: keeps the first file and shows its name and size.
    pub async fn select_files(&self, files: impl IntoIterator<Item = FormFile>) {
        let Some(file) = files.into_iter().next() else {
            return;
        };
        let label = file.info().display_label();
        self.form.lock().await.set_file(file);
        self.page.send_modify(|page| page.file_info = label);
    }

    pub async fn set_field(&self, name: impl Into<String>, value: impl Into<String>) {
        self.form.lock().await.set_field(name, value);
    }

    /// Runs one submission cycle to its terminal outcome.
    ///
    /// Rejected with [`ControllerError::SubmissionInFlight`] while the submit
    /// control is disabled by another cycle.
    pub async fn submit(&self) -> Result<CycleOutcome, ControllerError> {
        let acquired = self.page.send_if_modified(|page| {
            if !page.submit.enabled {
                return false;
            }
            page.submit = SubmitControl::busy();
            page.visible_panel = None;
            true
        });
        if !acquired {
            warn!("submit ignored: a submission is already in progress");
            return Err(ControllerError::SubmissionInFlight);
        }
        let mut guard = CycleGuard::new(&self.page);
        // Subscribers get to draw the cleared page before progress appears.
        tokio::task::yield_now().await;

        self.page.send_modify(|page| {
            page.progress.reset();
            page.visible_panel = Some(Panel::Progress);
        });

        let form = self.form.lock().await.clone();
        info!(
            file = form.file().map(|file| file.info().name.as_str()).unwrap_or(""),
            "submitting video for processing"
        );

        let animator =
            ProgressAnimator::start(Arc::clone(&self.page), self.timings.progress_interval);
        let result = self.backend.process(form).await;
        animator.stop().await;

        let outcome = match result {
            Ok(files) => {
                self.page.send_modify(|page| page.progress.complete());
                tokio::time::sleep(self.timings.result_delay).await;

                self.form.lock().await.reset();
                self.page.send_modify(|page| {
                    page.visible_panel = Some(Panel::Result);
                    page.subtitle_href = Some(files.subtitle_href());
                    page.video_href = Some(files.video_href());
                    page.file_info.clear();
                    page.submit = SubmitControl::idle();
                });
                info!(
                    subtitle_file = %files.subtitle_file,
                    output_video = %files.output_video,
                    "video processed"
                );
                CycleOutcome::Succeeded(files)
            }
            Err(error) => {
                self.page.send_modify(|page| {
                    page.visible_panel = Some(Panel::Error);
                    page.error_message = error.message().to_string();
                    page.submit = SubmitControl::idle();
                });
                warn!(%error, "video processing failed");
                CycleOutcome::Failed(error)
            }
        };

        guard.disarm();
        Ok(outcome)
    }
}

/// Restores an idle page if a cycle is dropped before reaching a terminal
/// outcome, so the submit control is never left disabled.
struct CycleGuard<'a> {
    page: &'a watch::Sender<PageState>,
    armed: bool,
}

impl<'a> CycleGuard<'a> {
    fn new(page: &'a watch::Sender<PageState>) -> Self {
        Self { page, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.page.send_modify(|page| {
                page.visible_panel = None;
                page.submit = SubmitControl::idle();
            });
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
