//! `camgate` Core Library
//!
//! Shared functionality for `camgate` components:
//! - Capability model (status, requests, correlated results)
//! - Stored consent from earlier runs
//! - Configuration resolution and hierarchy
//! - Tracing setup
//! - Common error types

pub mod capability;
pub mod config;
pub mod consent;
pub mod error;
pub mod tracing_init;

pub use capability::{
    Capability, CapabilityRequest, CapabilityResult, CapabilityStatus, Outcome, RequestId,
};
pub use config::Config;
pub use consent::ConsentStore;
pub use error::{Error, Result};
