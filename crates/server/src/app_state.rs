use std::sync::Arc;

use crate::pipeline::{toolchain::MediaToolchain, WorkDirs};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) dirs: WorkDirs,
    pub(crate) toolchain: Arc<dyn MediaToolchain>,
    pub(crate) max_upload_bytes: usize,
}
