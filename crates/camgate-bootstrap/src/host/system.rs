//! System host wiring for the `camgate` binary.

use std::io::Write;

use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use camgate_core::config::GateConfig;
use camgate_core::{Capability, CapabilityResult, CapabilityStatus, RequestId};

use super::{
    CapabilityHost, DeviceCapabilityHost, FinishReason, HostingContext, Notice,
    ProcessSessionHost, SessionHost, UserNotifier,
};
use crate::launcher::{SessionDescriptor, SessionHandle, SessionStartFailure};

/// Shows notices on the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl UserNotifier for TerminalNotifier {
    fn notify(&self, notice: &Notice) {
        warn!(%notice, "User notice");
        show_notice(std::io::stderr().lock(), notice);
    }
}

fn show_notice(mut out: impl Write, notice: &Notice) {
    if let Err(e) = writeln!(out, "{notice}") {
        warn!(%notice, error = %e, "Failed to show notice on terminal");
    }
}

/// Hosting lifecycle backed by a watch channel.
///
/// The receiver observes `Some(reason)` once the gate has finished.
#[derive(Debug)]
pub struct ShutdownContext {
    tx: watch::Sender<Option<FinishReason>>,
}

impl ShutdownContext {
    pub fn channel() -> (Self, watch::Receiver<Option<FinishReason>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, rx)
    }
}

impl HostingContext for ShutdownContext {
    fn finish(&self, reason: FinishReason) {
        info!(?reason, "Hosting lifecycle finished");
        if let Some(previous) = self.tx.send_replace(Some(reason)) {
            warn!(?previous, "Hosting lifecycle finished more than once");
        }
    }
}

/// Host composed of the camera device, child processes and the terminal.
pub struct SystemHost {
    capabilities: DeviceCapabilityHost,
    sessions: ProcessSessionHost,
    notifier: TerminalNotifier,
    lifecycle: ShutdownContext,
}

impl SystemHost {
    pub fn new(
        gate: &GateConfig,
        results: mpsc::Sender<CapabilityResult>,
        lifecycle: ShutdownContext,
    ) -> Self {
        Self {
            capabilities: DeviceCapabilityHost::new(
                gate.camera_device.clone(),
                gate.non_interactive,
                gate.consent_file.clone(),
                results,
            ),
            sessions: ProcessSessionHost::new(),
            notifier: TerminalNotifier,
            lifecycle,
        }
    }
}

impl CapabilityHost for SystemHost {
    fn query_status(&self, capability: &Capability) -> CapabilityStatus {
        self.capabilities.query_status(capability)
    }

    fn request_capabilities(&self, capabilities: &[Capability]) -> RequestId {
        self.capabilities.request_capabilities(capabilities)
    }
}

impl SessionHost for SystemHost {
    fn start_session(
        &self,
        descriptor: SessionDescriptor,
    ) -> Result<SessionHandle, SessionStartFailure> {
        self.sessions.start_session(descriptor)
    }
}

impl UserNotifier for SystemHost {
    fn notify(&self, notice: &Notice) {
        self.notifier.notify(notice);
    }
}

impl HostingContext for SystemHost {
    fn finish(&self, reason: FinishReason) {
        self.lifecycle.finish(reason);
    }
}
