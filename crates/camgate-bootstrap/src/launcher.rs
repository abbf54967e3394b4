//! Native session launcher.
//!
//! Hands control to the native processing session once the gate has proven
//! the capability is granted. The launch is terminal: nothing is returned and
//! no reference to the session is kept.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use camgate_core::config::SessionConfig;
use camgate_core::{Capability, RequestId};

use crate::host::{FinishReason, Host, Notice};

/// Environment variable carrying the camera device to the session.
pub const CAMERA_DEVICE_ENV: &str = "CAMGATE_CAMERA_DEVICE";

/// Environment variable listing the granted capabilities.
pub const GRANTED_CAPABILITIES_ENV: &str = "CAMGATE_GRANTED_CAPABILITIES";

/// Witness that a capability was granted at the time the gate decided.
///
/// Only the gate can mint one; the launcher trusts it without re-checking.
#[derive(Debug)]
pub struct CapabilityProof {
    capability: Capability,
    request_id: Option<RequestId>,
}

impl CapabilityProof {
    pub(crate) const fn granted(capability: Capability, request_id: Option<RequestId>) -> Self {
        Self {
            capability,
            request_id,
        }
    }

    pub const fn capability(&self) -> &Capability {
        &self.capability
    }

    /// The request that produced the grant, if one was needed.
    pub const fn request_id(&self) -> Option<RequestId> {
        self.request_id
    }
}

/// What the host needs to start a native session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescriptor {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_directory: Option<PathBuf>,
    pub capabilities: Vec<Capability>,
    pub env: Vec<(String, String)>,
}

/// Opaque handle for a started native session.
#[derive(Debug)]
pub struct SessionHandle {
    id: String,
    pid: Option<u32>,
}

impl SessionHandle {
    /// Handle for a freshly started session.
    pub fn new(pid: Option<u32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pid,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }
}

/// Why the host could not start the native session.
#[derive(Debug, thiserror::Error)]
pub enum SessionStartFailure {
    #[error("Native session module not found: {program}")]
    MissingNativeModule { program: PathBuf },

    #[error("Insufficient resources to start native session: {reason}")]
    ResourceExhausted { reason: String },

    #[error("Failed to start native session: {reason}")]
    Spawn { reason: String },
}

/// One-shot launcher for the native session.
#[derive(Debug, Clone)]
pub struct SessionLauncher {
    program: PathBuf,
    args: Vec<String>,
    working_directory: Option<PathBuf>,
    camera_device: PathBuf,
}

impl SessionLauncher {
    pub fn new(config: &SessionConfig, camera_device: &Path) -> Self {
        Self {
            program: config.binary.clone(),
            args: config.args.clone(),
            working_directory: config.working_directory.clone(),
            camera_device: camera_device.to_path_buf(),
        }
    }

    /// Descriptor for a session backed by `proof`.
    pub fn descriptor(&self, proof: &CapabilityProof) -> SessionDescriptor {
        SessionDescriptor {
            program: self.program.clone(),
            args: self.args.clone(),
            working_directory: self.working_directory.clone(),
            capabilities: vec![proof.capability().clone()],
            env: vec![
                (
                    CAMERA_DEVICE_ENV.to_string(),
                    self.camera_device.display().to_string(),
                ),
                (
                    GRANTED_CAPABILITIES_ENV.to_string(),
                    proof.capability().to_string(),
                ),
            ],
        }
    }

    /// Start the native session and end the hosting lifecycle.
    ///
    /// Consumes the proof so a single grant starts at most one session.
    pub fn launch<H: Host + ?Sized>(&self, host: &H, proof: CapabilityProof) {
        let descriptor = self.descriptor(&proof);
        let program = descriptor.program.clone();

        match host.start_session(descriptor) {
            Ok(handle) => {
                info!(
                    session_id = handle.id(),
                    pid = ?handle.pid(),
                    program = %program.display(),
                    capability = %proof.capability(),
                    request_id = ?proof.request_id(),
                    "Native session started"
                );
                let session_id = handle.id().to_string();
                // The host owns the session from here on.
                drop(handle);
                host.finish(FinishReason::SessionLaunched { session_id });
            }
            Err(e) => {
                error!(program = %program.display(), error = %e, "Native session failed to start");
                host.notify(&Notice::SessionStartFailed {
                    reason: e.to_string(),
                });
                host.finish(FinishReason::SessionStartFailed);
            }
        }
    }
}
