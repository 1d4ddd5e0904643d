//! Platform-abstracted host actions for vphone.
//!
//! This crate defines the capability traits the agent calls into: input
//! injection, display queries, sensor relay, location spoofing, the app
//! directory, system configuration, and the media transport engine.
//! Platform backends implement these against the real device; the `mock`
//! feature provides recording backends for tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use vphone_types::{
    AppEntry, DisplayInfo, IceCandidate, KeyEvent, LocationUpdate, ProviderEnabled, ProviderInfo,
    ProviderStatus, SensorSample, TouchEvent, VideoParams,
};

pub mod error;
pub mod event;
#[cfg(feature = "mock")]
pub mod mock;

pub use error::HostError;
pub use event::HostEvent;

/// Injects pointer and key events into the host input pipeline.
///
/// Implementations are responsible for rotation-aware coordinate mapping
/// of touch events; the protocol carries portrait-origin coordinates.
#[async_trait]
pub trait InputInjector: Send + Sync {
    async fn inject_touch(&self, event: &TouchEvent) -> Result<(), HostError>;

    async fn inject_key(&self, event: &KeyEvent) -> Result<(), HostError>;
}

/// Reads display geometry and relays rotation changes to the host.
#[async_trait]
pub trait DisplayQuery: Send + Sync {
    /// Physical display size, portrait orientation.
    async fn info(&self) -> Result<DisplayInfo, HostError>;

    /// Broadcast a client-side rotation change to interested host services.
    async fn announce_rotation(&self, rotation: i32) -> Result<(), HostError>;
}

/// Delivers one sensor sample to the host sensor pipeline.
///
/// Callers guarantee samples arrive in receipt order; implementations must
/// not reorder them.
#[async_trait]
pub trait SensorRelay: Send + Sync {
    async fn relay(&self, sample: &SensorSample) -> Result<(), HostError>;
}

/// Controls the host's test location providers.
#[async_trait]
pub trait LocationSpoofer: Send + Sync {
    /// Register a test provider, overwriting any legitimate provider with
    /// the same name. Registering an existing test provider is not an error.
    async fn add_test_provider(&self, info: &ProviderInfo) -> Result<(), HostError>;

    async fn set_status(&self, status: &ProviderStatus) -> Result<(), HostError>;

    async fn set_enabled(&self, enabled: &ProviderEnabled) -> Result<(), HostError>;

    /// Push one spoofed fix to the named test provider.
    async fn push_location(&self, update: &LocationUpdate) -> Result<(), HostError>;

    /// Remove all test providers (fresh-start reset).
    async fn reset(&self) -> Result<(), HostError>;
}

/// Enumerates and launches installed applications.
#[async_trait]
pub trait AppCatalog: Send + Sync {
    /// All launchable apps, with icons rendered for the requested density.
    async fn installed(&self, screen_density: u32) -> Result<Vec<AppEntry>, HostError>;

    async fn launch(&self, package: &str) -> Result<(), HostError>;

    /// Return to the host home screen.
    async fn show_home(&self) -> Result<(), HostError>;

    /// Start a view activity for the given data string (e.g. a URL).
    async fn open_url(&self, data: &str) -> Result<(), HostError>;
}

/// Miscellaneous host configuration.
#[async_trait]
pub trait SystemConfigurator: Send + Sync {
    async fn set_timezone(&self, id: &str) -> Result<(), HostError>;

    /// Attach or detach the virtual hardware keyboard.
    async fn set_hard_keyboard(&self, attached: bool) -> Result<(), HostError>;
}

/// Creates media transport sessions (one per client connection).
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Open a transport with the given parameters. Locally discovered
    /// candidates are pushed through `candidates` as they appear.
    async fn open(
        &self,
        params: &VideoParams,
        candidates: mpsc::Sender<IceCandidate>,
    ) -> Result<Arc<dyn MediaSession>, HostError>;
}

/// One live media transport, always in the answerer role.
#[async_trait]
pub trait MediaSession: Send + Sync {
    async fn set_remote_offer(&self, sdp: &str) -> Result<(), HostError>;

    /// Synthesize the local answer; only valid after the remote offer is set.
    async fn create_answer(&self) -> Result<String, HostError>;

    async fn add_remote_candidate(&self, candidate: &IceCandidate) -> Result<(), HostError>;

    /// Dispose transport resources. Must be idempotent-safe to call once;
    /// callers guarantee exactly-once invocation.
    async fn close(&self);
}

/// The capability set the agent runs against, selected at startup.
#[derive(Clone)]
pub struct HostCapabilities {
    pub input: Arc<dyn InputInjector>,
    pub display: Arc<dyn DisplayQuery>,
    pub sensors: Arc<dyn SensorRelay>,
    pub location: Arc<dyn LocationSpoofer>,
    pub apps: Arc<dyn AppCatalog>,
    pub system: Arc<dyn SystemConfigurator>,
    pub media: Arc<dyn MediaEngine>,
}
