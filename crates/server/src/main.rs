use std::{net::SocketAddr, sync::Arc};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
mod pipeline;

use app_state::AppState;
use config::{load_settings, prepare_dirs};
use pipeline::{toolchain::CommandToolchain, WorkDirs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    prepare_dirs(&settings).map_err(|error| {
        error!(%error, "failed to prepare work directories; verify permissions");
        error
    })?;

    let state = AppState {
        dirs: WorkDirs {
            upload_dir: settings.upload_dir.clone(),
            output_dir: settings.output_dir.clone(),
        },
        toolchain: Arc::new(CommandToolchain {
            ffmpeg_bin: settings.ffmpeg_bin.clone(),
            whisper_bin: settings.whisper_bin.clone(),
        }),
        max_upload_bytes: settings.max_upload_bytes,
    };
    let app = api::build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        upload_dir = %settings.upload_dir.display(),
        output_dir = %settings.output_dir.display(),
        "server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
