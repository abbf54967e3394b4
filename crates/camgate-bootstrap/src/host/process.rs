//! Session host that starts the native session as a child process.

use std::io;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use super::SessionHost;
use crate::launcher::{SessionDescriptor, SessionHandle, SessionStartFailure};

/// Starts native sessions with `tokio::process`.
///
/// The child inherits stdio and is not killed when its handle is dropped, so
/// it outlives the bootstrap.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessSessionHost;

impl ProcessSessionHost {
    pub const fn new() -> Self {
        Self
    }
}

impl SessionHost for ProcessSessionHost {
    /// Must be called from within a tokio runtime.
    fn start_session(
        &self,
        descriptor: SessionDescriptor,
    ) -> Result<SessionHandle, SessionStartFailure> {
        let mut cmd = Command::new(&descriptor.program);
        cmd.args(&descriptor.args)
            .envs(descriptor.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(false);
        if let Some(dir) = &descriptor.working_directory {
            cmd.current_dir(dir);
        }

        debug!(
            program = %descriptor.program.display(),
            args = ?descriptor.args,
            "Spawning native session"
        );
        let child = cmd
            .spawn()
            .map_err(|e| classify_spawn_error(&descriptor, &e))?;

        let handle = SessionHandle::new(child.id());
        info!(session_id = handle.id(), pid = ?handle.pid(), "Native session process spawned");
        Ok(handle)
    }
}

fn classify_spawn_error(descriptor: &SessionDescriptor, e: &io::Error) -> SessionStartFailure {
    if e.kind() == io::ErrorKind::NotFound {
        return SessionStartFailure::MissingNativeModule {
            program: descriptor.program.clone(),
        };
    }
    if e.kind() == io::ErrorKind::OutOfMemory || is_resource_errno(e.raw_os_error()) {
        return SessionStartFailure::ResourceExhausted {
            reason: e.to_string(),
        };
    }
    SessionStartFailure::Spawn {
        reason: e.to_string(),
    }
}

#[cfg(unix)]
fn is_resource_errno(code: Option<i32>) -> bool {
    matches!(
        code,
        Some(libc::EAGAIN | libc::ENOMEM | libc::EMFILE | libc::ENFILE)
    )
}

#[cfg(not(unix))]
const fn is_resource_errno(_code: Option<i32>) -> bool {
    false
}
