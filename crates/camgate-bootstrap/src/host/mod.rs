//! Host environment seams.
//!
//! The gate never reaches into ambient state: everything it needs from the
//! environment goes through these traits, passed in explicitly.

mod device;
mod process;
mod system;

use std::fmt;

use camgate_core::{Capability, CapabilityStatus, RequestId};

use crate::launcher::{SessionDescriptor, SessionHandle, SessionStartFailure};

pub use device::DeviceCapabilityHost;
pub use process::ProcessSessionHost;
pub use system::{ShutdownContext, SystemHost, TerminalNotifier};

/// Host capability API.
pub trait CapabilityHost: Send + Sync {
    /// Current status of `capability`. Never suspends.
    fn query_status(&self, capability: &Capability) -> CapabilityStatus;

    /// Start an asynchronous request for `capabilities`.
    ///
    /// Exactly one `CapabilityResult` carrying the returned id is delivered
    /// later on the host's result channel.
    fn request_capabilities(&self, capabilities: &[Capability]) -> RequestId;
}

/// Host session-start API.
pub trait SessionHost: Send + Sync {
    fn start_session(
        &self,
        descriptor: SessionDescriptor,
    ) -> Result<SessionHandle, SessionStartFailure>;
}

/// User-visible surface.
pub trait UserNotifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Lifecycle of the hosting context the gate lives in.
pub trait HostingContext: Send + Sync {
    /// End the hosting lifecycle. Called once per gate.
    fn finish(&self, reason: FinishReason);
}

/// Everything a gate needs from its host.
pub trait Host: CapabilityHost + SessionHost + UserNotifier + HostingContext {}

impl<T> Host for T where T: CapabilityHost + SessionHost + UserNotifier + HostingContext + ?Sized {}

/// A message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The required capability is unavailable.
    CapabilityDenied { capability: Capability },
    /// The native session could not be started.
    SessionStartFailed { reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapabilityDenied { capability } => {
                let name = capability.name();
                let mut chars = name.chars();
                if let Some(first) = chars.next() {
                    write!(f, "{}{} permission denied", first.to_uppercase(), chars.as_str())
                } else {
                    f.write_str("Permission denied")
                }
            }
            Self::SessionStartFailed { reason } => {
                write!(f, "Unable to start camera session: {reason}")
            }
        }
    }
}

/// Why the hosting lifecycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Control was handed to the native session.
    SessionLaunched { session_id: String },
    /// The capability was refused.
    CapabilityDenied,
    /// The native session failed to start.
    SessionStartFailed,
}

impl FinishReason {
    /// Process exit code for this outcome.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::SessionLaunched { .. } => 0,
            Self::CapabilityDenied => 1,
            Self::SessionStartFailed => 2,
        }
    }
}
