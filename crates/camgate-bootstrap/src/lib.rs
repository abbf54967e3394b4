//! camgate Bootstrap Library
//!
//! Gates the start of a native camera session on a host-granted capability:
//! - Capability gate state machine with correlated, single-shot results
//! - Session launcher taking a typed proof of grant
//! - Host seams (capability queries, session start, notices, lifecycle)
//! - System host backed by the camera device node and `tokio::process`

pub mod gate;
pub mod host;
pub mod launcher;

#[cfg(test)]
mod testing;
