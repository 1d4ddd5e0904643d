//! Shared types for vphone: protocol envelopes and the payload types they
//! carry (input events, sensor samples, location requests, media signaling,
//! app directory entries, notifications).

pub mod apps;
pub mod display;
pub mod envelope;
pub mod input;
pub mod location;
pub mod notification;
pub mod sensor;
pub mod signaling;

pub use apps::{AppEntry, AppSummary, AppsRequest, AppsResponse};
pub use display::DisplayInfo;
pub use envelope::{ConfigUpdate, IntentAction, IntentKind, Ping, Request, Response};
pub use input::{KeyEvent, PointerCoord, TouchEvent};
pub use location::{
    valid_provider, LocationEvent, LocationRequest, LocationSubscription, LocationUpdate,
    ProviderEnabled, ProviderInfo, ProviderStatus, PASSIVE_PROVIDER,
};
pub use notification::Notification;
pub use sensor::SensorSample;
pub use signaling::{IceCandidate, SignalingMessage, VideoParams};
