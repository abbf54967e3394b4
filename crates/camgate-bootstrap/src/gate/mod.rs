//! Capability gate.
//!
//! Decides, once per activation attempt, whether the native session may
//! start. The gate checks the current status, requests the capability when
//! it is not already granted, and is re-entered through [`Gate::on_result`]
//! when the host answers. Results that do not answer the outstanding request
//! are discarded.

mod driver;
mod state;
mod types;

use std::sync::Arc;

use tracing::{debug, info, warn};

use camgate_core::{Capability, CapabilityRequest, CapabilityResult, RequestId};

use crate::host::{FinishReason, Host, Notice};
use crate::launcher::{CapabilityProof, SessionLauncher};

pub use driver::drive;
pub use state::{GatePhase, GateState};
pub use types::{DiscardReason, GateError, ResultDisposition};

/// Capability gate for a single activation attempt.
pub struct Gate<H: Host + ?Sized> {
    host: Arc<H>,
    capability: Capability,
    launcher: SessionLauncher,
    state: GateState,
}

impl<H: Host + ?Sized> Gate<H> {
    /// Create a gate bound to its hosting context.
    pub const fn new(host: Arc<H>, capability: Capability, launcher: SessionLauncher) -> Self {
        Self {
            host,
            capability,
            launcher,
            state: GateState::Init,
        }
    }

    pub const fn state(&self) -> &GateState {
        &self.state
    }

    pub const fn phase(&self) -> GatePhase {
        self.state.phase()
    }

    pub const fn capability(&self) -> &Capability {
        &self.capability
    }

    /// Run the status check and either proceed or request the capability.
    ///
    /// Valid once per gate; later calls are rejected.
    pub fn activate(&mut self) -> Result<(), GateError> {
        if self.state != GateState::Init {
            return Err(GateError::AlreadyActivated {
                phase: self.phase(),
            });
        }

        self.transition(GateState::CheckingStatus);
        let status = self.host.query_status(&self.capability);
        debug!(capability = %self.capability, ?status, "Capability status queried");

        if status.is_granted() {
            self.proceed(None);
        } else {
            let capabilities = vec![self.capability.clone()];
            let id = self.host.request_capabilities(&capabilities);
            info!(
                capability = %self.capability,
                request_id = %id,
                ?status,
                "Capability request issued"
            );
            self.transition(GateState::AwaitingGrant {
                request: CapabilityRequest { id, capabilities },
            });
        }
        Ok(())
    }

    /// Deliver a capability result from the host.
    pub fn on_result(&mut self, result: CapabilityResult) -> ResultDisposition {
        let Some(request) = self.state.outstanding() else {
            let phase = self.phase();
            debug!(
                request_id = %result.request_id,
                %phase,
                "Discarding capability result: no request outstanding"
            );
            return ResultDisposition::Discarded(DiscardReason::NotAwaiting { phase });
        };

        if !request.matches(&result) {
            let expected = request.id;
            debug!(
                expected = %expected,
                received = %result.request_id,
                "Discarding capability result for another request"
            );
            return ResultDisposition::Discarded(DiscardReason::Mismatched {
                expected,
                received: result.request_id,
            });
        }

        let request_id = request.id;
        if result.is_granted(&self.capability) {
            self.proceed(Some(request_id));
        } else {
            warn!(
                capability = %self.capability,
                request_id = %request_id,
                outcome = ?result.outcome_for(&self.capability),
                "Capability denied"
            );
            self.abort();
        }
        ResultDisposition::Applied {
            phase: self.phase(),
        }
    }

    fn proceed(&mut self, request_id: Option<RequestId>) {
        self.transition(GateState::Proceeding);
        let proof = CapabilityProof::granted(self.capability.clone(), request_id);
        self.launcher.launch(self.host.as_ref(), proof);
    }

    fn abort(&mut self) {
        self.transition(GateState::Aborted);
        self.host.notify(&Notice::CapabilityDenied {
            capability: self.capability.clone(),
        });
        self.host.finish(FinishReason::CapabilityDenied);
    }

    fn transition(&mut self, next: GateState) {
        info!(from = %self.phase(), to = %next.phase(), "Gate transition");
        self.state = next;
    }
}

impl<H: Host + ?Sized> Drop for Gate<H> {
    fn drop(&mut self) {
        if let Some(request) = self.state.outstanding() {
            debug!(
                request_id = %request.id,
                "Gate destroyed while awaiting grant; late result will be discarded"
            );
        }
    }
}
