//! Capability model.
//!
//! A capability is a host-mediated permission (the camera) that must be
//! granted before privileged work may start. Requests for capabilities are
//! answered asynchronously; each answer carries the [`RequestId`] of the
//! request it belongs to so stale or duplicate answers can be told apart.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Name of the camera capability.
pub const CAMERA: &str = "camera";

/// A named, host-mediated capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Capability(String);

impl Capability {
    /// The camera capability.
    pub fn camera() -> Self {
        Self(CAMERA.to_string())
    }

    /// Capability name as known to the host.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for Capability {
    fn default() -> Self {
        Self::camera()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if valid {
            Ok(Self(name.to_ascii_lowercase()))
        } else {
            Err(Error::InvalidCapability(s.to_string()))
        }
    }
}

impl TryFrom<String> for Capability {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Capability> for String {
    fn from(value: Capability) -> Self {
        value.0
    }
}

/// Host's current answer for a capability.
///
/// Only authoritative at query time; the user may change it at any moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityStatus {
    Granted,
    Denied,
    Unknown,
}

impl CapabilityStatus {
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Per-capability outcome carried by a [`CapabilityResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Granted,
    Denied,
}

impl From<bool> for Outcome {
    fn from(granted: bool) -> Self {
        if granted { Self::Granted } else { Self::Denied }
    }
}

/// Correlation token binding a capability request to its result.
///
/// Hosts hand out ids from [`RequestId::FIRST`]; the zero default is never issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    /// First id a host hands out.
    pub const FIRST: Self = Self(1);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// An in-flight request for one or more capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRequest {
    pub id: RequestId,
    pub capabilities: Vec<Capability>,
}

impl CapabilityRequest {
    /// Whether a result answers this request.
    pub fn matches(&self, result: &CapabilityResult) -> bool {
        self.id == result.request_id
    }
}

/// The single answer a host delivers for a [`CapabilityRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityResult {
    pub request_id: RequestId,
    pub outcomes: HashMap<Capability, Outcome>,
}

impl CapabilityResult {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            outcomes: HashMap::new(),
        }
    }

    /// Builder-style helper to record an outcome.
    #[must_use]
    pub fn with_outcome(mut self, capability: Capability, outcome: Outcome) -> Self {
        self.outcomes.insert(capability, outcome);
        self
    }

    /// Outcome for `capability`, if the host reported one.
    pub fn outcome_for(&self, capability: &Capability) -> Option<Outcome> {
        self.outcomes.get(capability).copied()
    }

    /// Whether `capability` was granted. A missing entry counts as denied.
    pub fn is_granted(&self, capability: &Capability) -> bool {
        self.outcome_for(capability) == Some(Outcome::Granted)
    }
}
