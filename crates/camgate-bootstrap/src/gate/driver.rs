//! Async driver feeding host results into a gate.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use camgate_core::CapabilityResult;

use super::{Gate, GateError, GatePhase};
use crate::host::Host;

/// Activate `gate` and feed it results until it reaches a terminal phase.
///
/// The gate suspends only while awaiting a grant. Dropping the returned
/// future drops the gate and the receiver, so any later result is discarded
/// by the host's failed send.
pub async fn drive<H: Host + ?Sized>(
    mut gate: Gate<H>,
    mut results: mpsc::Receiver<CapabilityResult>,
) -> Result<GatePhase, GateError> {
    gate.activate()?;

    while !gate.phase().is_terminal() {
        let Some(result) = results.recv().await else {
            let request_id = gate
                .state()
                .outstanding()
                .map(|r| r.id)
                .unwrap_or_default();
            warn!(%request_id, "Host closed the capability result channel");
            return Err(GateError::ResultChannelClosed { request_id });
        };
        let disposition = gate.on_result(result);
        debug!(?disposition, "Capability result handled");
    }

    Ok(gate.phase())
}
