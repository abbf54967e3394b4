//! Recording host used by unit tests.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use camgate_core::config::SessionConfig;
use camgate_core::{Capability, CapabilityStatus, RequestId};

use crate::host::{CapabilityHost, FinishReason, HostingContext, Notice, SessionHost, UserNotifier};
use crate::launcher::{SessionDescriptor, SessionHandle, SessionLauncher, SessionStartFailure};

pub fn test_launcher() -> SessionLauncher {
    let config = SessionConfig {
        binary: PathBuf::from("camgate-test-session"),
        ..SessionConfig::default()
    };
    SessionLauncher::new(&config, Path::new("/dev/video0"))
}

pub struct RecordingHost {
    status: CapabilityStatus,
    fail_start: AtomicBool,
    next_id: AtomicU64,
    requests: Mutex<Vec<(RequestId, Vec<Capability>)>>,
    sessions: Mutex<Vec<SessionDescriptor>>,
    notices: Mutex<Vec<Notice>>,
    finishes: Mutex<Vec<FinishReason>>,
}

impl RecordingHost {
    pub fn new(status: CapabilityStatus) -> Self {
        Self {
            status,
            fail_start: AtomicBool::new(false),
            next_id: AtomicU64::new(RequestId::FIRST.get()),
            requests: Mutex::default(),
            sessions: Mutex::default(),
            notices: Mutex::default(),
            finishes: Mutex::default(),
        }
    }

    pub fn requests(&self) -> Vec<(RequestId, Vec<Capability>)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn sessions(&self) -> Vec<SessionDescriptor> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn finishes(&self) -> Vec<FinishReason> {
        self.finishes.lock().unwrap().clone()
    }

    pub fn fail_session_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }
}

impl CapabilityHost for RecordingHost {
    fn query_status(&self, _capability: &Capability) -> CapabilityStatus {
        self.status
    }

    fn request_capabilities(&self, capabilities: &[Capability]) -> RequestId {
        let id = RequestId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.requests
            .lock()
            .unwrap()
            .push((id, capabilities.to_vec()));
        id
    }
}

impl SessionHost for RecordingHost {
    fn start_session(
        &self,
        descriptor: SessionDescriptor,
    ) -> Result<SessionHandle, SessionStartFailure> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(SessionStartFailure::MissingNativeModule {
                program: descriptor.program,
            });
        }
        self.sessions.lock().unwrap().push(descriptor);
        Ok(SessionHandle::new(None))
    }
}

impl UserNotifier for RecordingHost {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

impl HostingContext for RecordingHost {
    fn finish(&self, reason: FinishReason) {
        self.finishes.lock().unwrap().push(reason);
    }
}
