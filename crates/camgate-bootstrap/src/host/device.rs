//! Capability host backed by the camera device node and interactive consent.
//!
//! Status is `Granted` once the user has consented (in this run or, through
//! the consent file, an earlier one) and the device is readable, `Denied` when
//! the OS refuses access to the device, `Unknown` otherwise. Requests run a
//! consent prompt on a blocking task and deliver a single result on the result
//! channel.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dialoguer::Confirm;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use camgate_core::{
    Capability, CapabilityResult, CapabilityStatus, ConsentStore, Outcome, RequestId,
};

use super::CapabilityHost;

/// Camera device access as seen by this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceAccess {
    Readable,
    Refused,
    Missing,
}

fn check_device(path: &Path) -> DeviceAccess {
    match File::open(path) {
        Ok(_) => DeviceAccess::Readable,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => DeviceAccess::Refused,
        Err(e) => {
            debug!(device = %path.display(), error = %e, "Camera device unavailable");
            DeviceAccess::Missing
        }
    }
}

/// Granted consent, written through to the consent file when one is set.
#[derive(Debug)]
struct ConsentLedger {
    path: Option<PathBuf>,
    store: Mutex<ConsentStore>,
}

impl ConsentLedger {
    fn open(path: Option<PathBuf>) -> Self {
        let store = match path.as_deref().map(ConsentStore::load).transpose() {
            Ok(store) => store.unwrap_or_default(),
            Err(e) => {
                warn!(
                    ?path,
                    error = %e,
                    "Ignoring unreadable consent file; consent will be asked again"
                );
                ConsentStore::default()
            }
        };
        Self {
            path,
            store: Mutex::new(store),
        }
    }

    fn contains(&self, capability: &Capability) -> bool {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_granted(capability)
    }

    fn grant(&self, capability: Capability) {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        if !store.grant(capability) {
            return;
        }
        if let Some(path) = &self.path
            && let Err(e) = store.save(path)
        {
            warn!(path = %path.display(), error = %e, "Failed to save consent file");
        }
    }
}

/// Capability host for the local camera.
pub struct DeviceCapabilityHost {
    camera_device: PathBuf,
    non_interactive: bool,
    consent: Arc<ConsentLedger>,
    next_id: AtomicU64,
    results: mpsc::Sender<CapabilityResult>,
}

impl DeviceCapabilityHost {
    /// Create a host delivering results on `results`.
    ///
    /// Consent recorded in `consent_file` by earlier runs counts as granted.
    pub fn new(
        camera_device: PathBuf,
        non_interactive: bool,
        consent_file: Option<PathBuf>,
        results: mpsc::Sender<CapabilityResult>,
    ) -> Self {
        Self {
            camera_device,
            non_interactive,
            consent: Arc::new(ConsentLedger::open(consent_file)),
            next_id: AtomicU64::new(RequestId::FIRST.get()),
            results,
        }
    }
}

impl CapabilityHost for DeviceCapabilityHost {
    fn query_status(&self, capability: &Capability) -> CapabilityStatus {
        if capability != &Capability::camera() {
            return if self.consent.contains(capability) {
                CapabilityStatus::Granted
            } else {
                CapabilityStatus::Unknown
            };
        }
        match check_device(&self.camera_device) {
            DeviceAccess::Refused => CapabilityStatus::Denied,
            DeviceAccess::Readable if self.consent.contains(capability) => {
                CapabilityStatus::Granted
            }
            DeviceAccess::Readable | DeviceAccess::Missing => CapabilityStatus::Unknown,
        }
    }

    /// Must be called from within a tokio runtime.
    fn request_capabilities(&self, capabilities: &[Capability]) -> RequestId {
        let request_id = RequestId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let capabilities = capabilities.to_vec();
        let device = self.camera_device.clone();
        let non_interactive = self.non_interactive;
        let consent = Arc::clone(&self.consent);
        let results = self.results.clone();

        tokio::spawn(async move {
            let decided = tokio::task::spawn_blocking(move || {
                let outcomes = decide(&capabilities, &device, non_interactive);
                for (capability, outcome) in &outcomes {
                    if *outcome == Outcome::Granted {
                        consent.grant(capability.clone());
                    }
                }
                outcomes
            })
            .await;

            let mut result = CapabilityResult::new(request_id);
            match decided {
                Ok(outcomes) => {
                    for (capability, outcome) in outcomes {
                        result = result.with_outcome(capability, outcome);
                    }
                }
                // Leaving the outcomes empty reads as a denial.
                Err(e) => warn!(%request_id, error = %e, "Consent prompt task failed"),
            }

            if results.send(result).await.is_err() {
                debug!(%request_id, "Capability result discarded; gate no longer listening");
            }
        });

        request_id
    }
}

fn decide(
    capabilities: &[Capability],
    device: &Path,
    non_interactive: bool,
) -> Vec<(Capability, Outcome)> {
    capabilities
        .iter()
        .map(|capability| {
            let outcome = decide_one(capability, device, non_interactive);
            info!(%capability, ?outcome, "Capability decided");
            (capability.clone(), outcome)
        })
        .collect()
}

fn decide_one(capability: &Capability, device: &Path, non_interactive: bool) -> Outcome {
    let is_camera = capability == &Capability::camera();
    if is_camera && check_device(device) != DeviceAccess::Readable {
        warn!(device = %device.display(), "Camera device not accessible");
        return Outcome::Denied;
    }
    if non_interactive {
        debug!(%capability, "Non-interactive mode; not prompting");
        return Outcome::Denied;
    }

    let prompt = if is_camera {
        format!("Allow access to the camera ({})?", device.display())
    } else {
        format!("Allow access to {capability}?")
    };
    match Confirm::new().with_prompt(prompt).default(false).interact() {
        Ok(granted) => Outcome::from(granted),
        Err(e) => {
            warn!(%capability, error = %e, "Consent prompt failed");
            Outcome::Denied
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel(1);
        let host = DeviceCapabilityHost::new(dir.path().join("video9"), true, None, tx);

        assert_eq!(
            host.query_status(&Capability::camera()),
            CapabilityStatus::Unknown
        );
    }

    #[test]
    fn readable_device_without_consent_is_unknown() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let (tx, _rx) = mpsc::channel(1);
        let host = DeviceCapabilityHost::new(file.path().to_path_buf(), true, None, tx);

        assert_eq!(
            host.query_status(&Capability::camera()),
            CapabilityStatus::Unknown
        );
    }

    #[test]
    fn consent_survives_host_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let device = tempfile::NamedTempFile::new().unwrap();
        let consent_file = dir.path().join("consent.json");

        let (tx, _rx) = mpsc::channel(1);
        let first = DeviceCapabilityHost::new(
            device.path().to_path_buf(),
            true,
            Some(consent_file.clone()),
            tx,
        );
        assert_eq!(
            first.query_status(&Capability::camera()),
            CapabilityStatus::Unknown
        );
        first.consent.grant(Capability::camera());
        drop(first);

        let (tx, _rx) = mpsc::channel(1);
        let rebuilt =
            DeviceCapabilityHost::new(device.path().to_path_buf(), true, Some(consent_file), tx);
        assert_eq!(
            rebuilt.query_status(&Capability::camera()),
            CapabilityStatus::Granted
        );
    }

    #[test]
    fn stored_consent_needs_a_readable_device() {
        let dir = tempfile::tempdir().unwrap();
        let consent_file = dir.path().join("consent.json");
        ConsentStore::default()
            .with_grant(Capability::camera())
            .save(&consent_file)
            .unwrap();

        let (tx, _rx) = mpsc::channel(1);
        let host =
            DeviceCapabilityHost::new(dir.path().join("video9"), true, Some(consent_file), tx);
        assert_eq!(
            host.query_status(&Capability::camera()),
            CapabilityStatus::Unknown
        );
    }

    #[test]
    fn corrupt_consent_file_falls_back_to_asking() {
        let dir = tempfile::tempdir().unwrap();
        let device = tempfile::NamedTempFile::new().unwrap();
        let consent_file = dir.path().join("consent.json");
        std::fs::write(&consent_file, "{broken").unwrap();

        let (tx, _rx) = mpsc::channel(1);
        let host =
            DeviceCapabilityHost::new(device.path().to_path_buf(), true, Some(consent_file), tx);
        assert_eq!(
            host.query_status(&Capability::camera()),
            CapabilityStatus::Unknown
        );
    }

    #[tokio::test]
    async fn missing_device_request_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(1);
        let host = DeviceCapabilityHost::new(dir.path().join("video9"), false, None, tx);

        let id = host.request_capabilities(&[Capability::camera()]);
        let result = rx.recv().await.unwrap();

        assert_eq!(id, RequestId::FIRST);
        assert_eq!(result.request_id, id);
        assert_eq!(
            result.outcome_for(&Capability::camera()),
            Some(Outcome::Denied)
        );
    }

    #[tokio::test]
    async fn non_interactive_request_is_denied_and_ids_advance() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let (tx, mut rx) = mpsc::channel(2);
        let host = DeviceCapabilityHost::new(file.path().to_path_buf(), true, None, tx);

        let first = host.request_capabilities(&[Capability::camera()]);
        let second = host.request_capabilities(&[Capability::camera()]);
        assert_eq!(second, first.next());

        let mut seen = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        seen.sort_by_key(|r| r.request_id);
        assert_eq!(seen[0].request_id, first);
        assert!(seen.iter().all(|r| !r.is_granted(&Capability::camera())));
        assert_eq!(
            host.query_status(&Capability::camera()),
            CapabilityStatus::Unknown
        );
    }

    #[tokio::test]
    async fn result_after_receiver_dropped_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel(1);
        let host = DeviceCapabilityHost::new(dir.path().join("video9"), true, None, tx);
        drop(rx);

        host.request_capabilities(&[Capability::camera()]);
        tokio::task::yield_now().await;
    }
}
