//! Gate state machine states.

use std::fmt;

use camgate_core::CapabilityRequest;

/// Where a gate is in its activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// Constructed, not yet activated.
    Init,
    /// Querying the host for the current status.
    CheckingStatus,
    /// Suspended until the result for `request` arrives.
    AwaitingGrant { request: CapabilityRequest },
    /// Granted; the launcher has been invoked.
    Proceeding,
    /// Refused; the denial notice has been shown.
    Aborted,
}

impl GateState {
    pub const fn phase(&self) -> GatePhase {
        match self {
            Self::Init => GatePhase::Init,
            Self::CheckingStatus => GatePhase::CheckingStatus,
            Self::AwaitingGrant { .. } => GatePhase::AwaitingGrant,
            Self::Proceeding => GatePhase::Proceeding,
            Self::Aborted => GatePhase::Aborted,
        }
    }

    /// The outstanding request, while awaiting a grant.
    pub const fn outstanding(&self) -> Option<&CapabilityRequest> {
        match self {
            Self::AwaitingGrant { request } => Some(request),
            _ => None,
        }
    }
}

/// Data-free view of [`GateState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    Init,
    CheckingStatus,
    AwaitingGrant,
    Proceeding,
    Aborted,
}

impl GatePhase {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Proceeding | Self::Aborted)
    }
}

impl fmt::Display for GatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::CheckingStatus => "checking_status",
            Self::AwaitingGrant => "awaiting_grant",
            Self::Proceeding => "proceeding",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}
