//! Mock host backends for testing.
//!
//! Every backend records the calls it receives so tests can assert on
//! them; the media engine additionally hands out a sender for emitting
//! local candidates, mirroring how a real engine trickles them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use vphone_types::{
    AppEntry, DisplayInfo, IceCandidate, KeyEvent, LocationUpdate, ProviderEnabled, ProviderInfo,
    ProviderStatus, SensorSample, TouchEvent, VideoParams,
};

use crate::error::HostError;
use crate::{
    AppCatalog, DisplayQuery, HostCapabilities, InputInjector, LocationSpoofer, MediaEngine,
    MediaSession, SensorRelay, SystemConfigurator,
};

// ---------------------------------------------------------------------------
// MockInput
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockInput {
    touches: Mutex<Vec<TouchEvent>>,
    keys: Mutex<Vec<KeyEvent>>,
}

impl MockInput {
    pub fn touches(&self) -> Vec<TouchEvent> {
        self.touches.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<KeyEvent> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl InputInjector for MockInput {
    async fn inject_touch(&self, event: &TouchEvent) -> Result<(), HostError> {
        self.touches.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn inject_key(&self, event: &KeyEvent) -> Result<(), HostError> {
        self.keys.lock().unwrap().push(event.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockDisplay
// ---------------------------------------------------------------------------

pub struct MockDisplay {
    info: DisplayInfo,
    rotations: Mutex<Vec<i32>>,
}

impl MockDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            info: DisplayInfo::new(width, height),
            rotations: Mutex::new(Vec::new()),
        }
    }

    pub fn announced_rotations(&self) -> Vec<i32> {
        self.rotations.lock().unwrap().clone()
    }
}

#[async_trait]
impl DisplayQuery for MockDisplay {
    async fn info(&self) -> Result<DisplayInfo, HostError> {
        Ok(self.info)
    }

    async fn announce_rotation(&self, rotation: i32) -> Result<(), HostError> {
        self.rotations.lock().unwrap().push(rotation);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockSensorRelay
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockSensorRelay {
    samples: Mutex<Vec<SensorSample>>,
}

impl MockSensorRelay {
    pub fn samples(&self) -> Vec<SensorSample> {
        self.samples.lock().unwrap().clone()
    }
}

#[async_trait]
impl SensorRelay for MockSensorRelay {
    async fn relay(&self, sample: &SensorSample) -> Result<(), HostError> {
        self.samples.lock().unwrap().push(sample.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockLocationSpoofer
// ---------------------------------------------------------------------------

/// Records every spoofing call, verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum SpooferCall {
    AddProvider(ProviderInfo),
    SetStatus(ProviderStatus),
    SetEnabled(ProviderEnabled),
    PushLocation(LocationUpdate),
    Reset,
}

#[derive(Default)]
pub struct MockLocationSpoofer {
    calls: Mutex<Vec<SpooferCall>>,
}

impl MockLocationSpoofer {
    pub fn calls(&self) -> Vec<SpooferCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocationSpoofer for MockLocationSpoofer {
    async fn add_test_provider(&self, info: &ProviderInfo) -> Result<(), HostError> {
        self.calls
            .lock()
            .unwrap()
            .push(SpooferCall::AddProvider(info.clone()));
        Ok(())
    }

    async fn set_status(&self, status: &ProviderStatus) -> Result<(), HostError> {
        self.calls
            .lock()
            .unwrap()
            .push(SpooferCall::SetStatus(status.clone()));
        Ok(())
    }

    async fn set_enabled(&self, enabled: &ProviderEnabled) -> Result<(), HostError> {
        self.calls
            .lock()
            .unwrap()
            .push(SpooferCall::SetEnabled(enabled.clone()));
        Ok(())
    }

    async fn push_location(&self, update: &LocationUpdate) -> Result<(), HostError> {
        self.calls
            .lock()
            .unwrap()
            .push(SpooferCall::PushLocation(update.clone()));
        Ok(())
    }

    async fn reset(&self) -> Result<(), HostError> {
        self.calls.lock().unwrap().push(SpooferCall::Reset);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockAppCatalog
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockAppCatalog {
    entries: Mutex<Vec<AppEntry>>,
    launched: Mutex<Vec<String>>,
    opened_urls: Mutex<Vec<String>>,
    home_count: AtomicUsize,
}

impl MockAppCatalog {
    pub fn with_entries(entries: Vec<AppEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    pub fn set_entries(&self, entries: Vec<AppEntry>) {
        *self.entries.lock().unwrap() = entries;
    }

    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().unwrap().clone()
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened_urls.lock().unwrap().clone()
    }

    pub fn home_count(&self) -> usize {
        self.home_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AppCatalog for MockAppCatalog {
    async fn installed(&self, _screen_density: u32) -> Result<Vec<AppEntry>, HostError> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn launch(&self, package: &str) -> Result<(), HostError> {
        let known = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.package == package);
        if !known {
            return Err(HostError::UnknownPackage(package.to_string()));
        }
        self.launched.lock().unwrap().push(package.to_string());
        Ok(())
    }

    async fn show_home(&self) -> Result<(), HostError> {
        self.home_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn open_url(&self, data: &str) -> Result<(), HostError> {
        self.opened_urls.lock().unwrap().push(data.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockSystemConfigurator
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockSystemConfigurator {
    timezones: Mutex<Vec<String>>,
    keyboard_states: Mutex<Vec<bool>>,
}

impl MockSystemConfigurator {
    pub fn timezones(&self) -> Vec<String> {
        self.timezones.lock().unwrap().clone()
    }

    pub fn keyboard_states(&self) -> Vec<bool> {
        self.keyboard_states.lock().unwrap().clone()
    }
}

#[async_trait]
impl SystemConfigurator for MockSystemConfigurator {
    async fn set_timezone(&self, id: &str) -> Result<(), HostError> {
        self.timezones.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn set_hard_keyboard(&self, attached: bool) -> Result<(), HostError> {
        self.keyboard_states.lock().unwrap().push(attached);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockMediaEngine / MockMediaSession
// ---------------------------------------------------------------------------

pub struct MockMediaEngine {
    answer_sdp: String,
    sessions: Mutex<Vec<Arc<MockMediaSession>>>,
}

impl Default for MockMediaEngine {
    fn default() -> Self {
        Self {
            answer_sdp: "v=0\r\ns=mock-answer\r\n".to_string(),
            sessions: Mutex::new(Vec::new()),
        }
    }
}

impl MockMediaEngine {
    pub fn sessions(&self) -> Vec<Arc<MockMediaSession>> {
        self.sessions.lock().unwrap().clone()
    }

    /// The most recently opened session, if any.
    pub fn last_session(&self) -> Option<Arc<MockMediaSession>> {
        self.sessions.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl MediaEngine for MockMediaEngine {
    async fn open(
        &self,
        params: &VideoParams,
        candidates: mpsc::Sender<IceCandidate>,
    ) -> Result<Arc<dyn MediaSession>, HostError> {
        let session = Arc::new(MockMediaSession {
            params: params.clone(),
            answer_sdp: self.answer_sdp.clone(),
            candidate_tx: candidates,
            remote_offer: Mutex::new(None),
            remote_candidates: Mutex::new(Vec::new()),
            close_count: AtomicUsize::new(0),
        });
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }
}

pub struct MockMediaSession {
    pub params: VideoParams,
    answer_sdp: String,
    candidate_tx: mpsc::Sender<IceCandidate>,
    remote_offer: Mutex<Option<String>>,
    remote_candidates: Mutex<Vec<IceCandidate>>,
    close_count: AtomicUsize,
}

impl MockMediaSession {
    /// Emit a locally discovered candidate, as a real engine would.
    pub async fn emit_candidate(&self, candidate: IceCandidate) {
        let _ = self.candidate_tx.send(candidate).await;
    }

    pub fn remote_offer(&self) -> Option<String> {
        self.remote_offer.lock().unwrap().clone()
    }

    pub fn remote_candidates(&self) -> Vec<IceCandidate> {
        self.remote_candidates.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaSession for MockMediaSession {
    async fn set_remote_offer(&self, sdp: &str) -> Result<(), HostError> {
        *self.remote_offer.lock().unwrap() = Some(sdp.to_string());
        Ok(())
    }

    async fn create_answer(&self) -> Result<String, HostError> {
        if self.remote_offer.lock().unwrap().is_none() {
            return Err(HostError::Media("no remote offer set".to_string()));
        }
        Ok(self.answer_sdp.clone())
    }

    async fn add_remote_candidate(&self, candidate: &IceCandidate) -> Result<(), HostError> {
        self.remote_candidates.lock().unwrap().push(candidate.clone());
        Ok(())
    }

    async fn close(&self) {
        self.close_count.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// MockHost
// ---------------------------------------------------------------------------

/// A full mock capability set, with handles kept for inspection.
pub struct MockHost {
    pub input: Arc<MockInput>,
    pub display: Arc<MockDisplay>,
    pub sensors: Arc<MockSensorRelay>,
    pub location: Arc<MockLocationSpoofer>,
    pub apps: Arc<MockAppCatalog>,
    pub system: Arc<MockSystemConfigurator>,
    pub media: Arc<MockMediaEngine>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            input: Arc::new(MockInput::default()),
            display: Arc::new(MockDisplay::new(1080, 1920)),
            sensors: Arc::new(MockSensorRelay::default()),
            location: Arc::new(MockLocationSpoofer::default()),
            apps: Arc::new(MockAppCatalog::default()),
            system: Arc::new(MockSystemConfigurator::default()),
            media: Arc::new(MockMediaEngine::default()),
        }
    }

    /// The capability set backed by these mocks.
    pub fn capabilities(&self) -> HostCapabilities {
        HostCapabilities {
            input: self.input.clone(),
            display: self.display.clone(),
            sensors: self.sensors.clone(),
            location: self.location.clone(),
            apps: self.apps.clone(),
            system: self.system.clone(),
            media: self.media.clone(),
        }
    }
}
