//! Gate result and error types.

use camgate_core::RequestId;

use super::state::GatePhase;

/// What the gate did with a delivered capability result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultDisposition {
    /// The result answered the outstanding request and drove a transition.
    Applied { phase: GatePhase },
    /// The result was stale or a duplicate and had no effect.
    Discarded(DiscardReason),
}

/// Why a capability result was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// No request is outstanding in this phase.
    NotAwaiting { phase: GatePhase },
    /// The result belongs to a different request.
    Mismatched {
        expected: RequestId,
        received: RequestId,
    },
}

/// Gate errors.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Gate already activated (phase: {phase})")]
    AlreadyActivated { phase: GatePhase },

    #[error("Capability result channel closed while awaiting {request_id}")]
    ResultChannelClosed { request_id: RequestId },
}
