use cam_viewer_client::{DecodedFrame, DeviceSession, SessionSnapshot};
use cam_viewer_common::config::{Config, ConfigError};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Frames between progress lines at info level.
const PROGRESS_EVERY: u64 = 30;

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let explicit_path = args.next().map(PathBuf::from);
    let address = args.next();

    let config = match load_config(explicit_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    info!(
        settings = %config.settings.path.display(),
        read_timeout_ms = config.stream.read_timeout_ms,
        max_frame_bytes = config.stream.max_frame_bytes,
        "starting cam-viewer"
    );

    let session = match DeviceSession::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to set up device transport");
            std::process::exit(1);
        }
    };

    // An address on the command line wins over the saved auto-connect setting.
    let started = match address {
        Some(address) => session.connect(&address).await.map(|()| true),
        None => session.start().await,
    };
    match started {
        Ok(true) => {}
        Ok(false) => {
            error!("no device address given and auto-connect is off");
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "failed to connect");
            std::process::exit(1);
        }
    }

    let snapshot_path = config.viewer.snapshot_path.clone();
    let mut updates = session.subscribe();
    let mut last_status = None;
    let mut last_seq = None;

    loop {
        let snapshot: SessionSnapshot = updates.borrow_and_update().clone();

        if last_status.as_ref() != Some(&snapshot.status) {
            info!(status = %snapshot.status, "connection status changed");
            last_status = Some(snapshot.status.clone());
        }
        if let Some(frame) = &snapshot.frame {
            if last_seq != Some(frame.seq()) {
                last_seq = Some(frame.seq());
                report_frame(frame);
                if let Some(path) = &snapshot_path {
                    write_snapshot(path, frame).await;
                }
            }
        }
        if snapshot.status.is_disconnected() {
            break;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, disconnecting");
                session.disconnect().await;
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(status = %session.status(), "cam-viewer stopped");
}

/// An explicitly given path must load. Without one, `config.toml` is used
/// when present and built-in defaults otherwise.
fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match explicit {
        Some(path) => Config::load(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                Config::load(path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn report_frame(frame: &DecodedFrame) {
    if frame.seq() % PROGRESS_EVERY == 0 {
        info!(
            seq = frame.seq(),
            width = frame.width(),
            height = frame.height(),
            bytes = frame.jpeg().len(),
            "frame received"
        );
    } else {
        debug!(seq = frame.seq(), bytes = frame.jpeg().len(), "frame received");
    }
}

async fn write_snapshot(path: &Path, frame: &DecodedFrame) {
    if let Err(e) = tokio::fs::write(path, frame.jpeg()).await {
        warn!(path = %path.display(), error = %e, "failed to write snapshot");
    }
}
