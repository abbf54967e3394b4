//! `camgate`
//!
//! Bootstrap entry point: gates the native camera session on the camera
//! capability, starts the session once granted, and exits.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use camgate_bootstrap::gate::{self, Gate};
use camgate_bootstrap::host::{ShutdownContext, SystemHost};
use camgate_bootstrap::launcher::SessionLauncher;
use camgate_core::Capability;
use camgate_core::config::{Config, load_config};

/// Exit code when interrupted while awaiting a grant.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "camgate")]
#[command(version, about = "Start a native camera session once camera access is granted")]
struct Args {
    /// Project directory searched for `.camgate/settings.json`
    #[arg(long, env = "CAMGATE_PROJECT_DIR")]
    project_dir: Option<PathBuf>,

    /// Capability required by the session
    #[arg(long)]
    capability: Option<Capability>,

    /// Camera device node
    #[arg(long)]
    camera_device: Option<PathBuf>,

    /// File remembering granted consent between runs
    #[arg(long)]
    consent_file: Option<PathBuf>,

    /// Native session executable
    #[arg(long)]
    session_bin: Option<PathBuf>,

    /// Working directory for the native session
    #[arg(long)]
    session_dir: Option<PathBuf>,

    /// Deny instead of prompting for consent
    #[arg(long)]
    non_interactive: bool,

    /// Log level filter (e.g. "info", "debug", "warn").
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,

    /// Arguments passed through to the native session
    #[arg(last = true)]
    session_args: Vec<String>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(capability) = self.capability {
            config.gate.capability = capability;
        }
        if let Some(device) = self.camera_device {
            config.gate.camera_device = device;
        }
        if let Some(path) = self.consent_file {
            config.gate.consent_file = Some(path);
        }
        if self.non_interactive {
            config.gate.non_interactive = true;
        }
        if let Some(bin) = self.session_bin {
            config.session.binary = bin;
        }
        if let Some(dir) = self.session_dir {
            config.session.working_directory = Some(dir);
        }
        if !self.session_args.is_empty() {
            config.session.args = self.session_args;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if self.log_json {
            config.logging.json = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let mut config = load_config(args.project_dir.as_deref())?;
    args.apply(&mut config);

    let log_filter = format!("camgate_bootstrap={}", config.logging.level);
    camgate_core::tracing_init::init_tracing(&log_filter, config.logging.json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        capability = %config.gate.capability,
        camera_device = %config.gate.camera_device.display(),
        session = %config.session.binary.display(),
        "Starting camgate"
    );

    let (results_tx, results_rx) = mpsc::channel(4);
    let (lifecycle, finished) = ShutdownContext::channel();
    let host = Arc::new(SystemHost::new(&config.gate, results_tx, lifecycle));
    let launcher = SessionLauncher::new(&config.session, &config.gate.camera_device);
    let gate = Gate::new(host, config.gate.capability.clone(), launcher);

    tokio::select! {
        phase = gate::drive(gate, results_rx) => {
            let phase = phase?;
            info!(%phase, "Gate settled");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted while awaiting capability grant");
            // A consent prompt may still hold a blocking thread; don't wait for it.
            std::process::exit(EXIT_INTERRUPTED);
        }
    }

    let code = finished
        .borrow()
        .as_ref()
        .map_or(1, camgate_bootstrap::host::FinishReason::exit_code);
    Ok(ExitCode::from(code))
}
