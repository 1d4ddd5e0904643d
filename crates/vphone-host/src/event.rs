//! Host-to-agent callback events.
//!
//! Host adapters (location manager broadcasts, intent intercepts,
//! notification intercepts, launcher hooks) run independently of the
//! client connection and push events through an mpsc channel owned by the
//! agent. Events arriving with no active session are dropped; subscription
//! events are always reconciled against the ledger first.

use vphone_types::{IntentAction, LocationSubscription, Notification};

/// One event pushed by a host adapter.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A host component requested location updates for a provider.
    LocationSubscribe {
        subscription: LocationSubscription,
        single_shot: bool,
    },

    /// A host component released a location request. The subscription
    /// carries the values of the row to remove.
    LocationUnsubscribe { subscription: LocationSubscription },

    /// An intent was intercepted on the host (e.g. an outbound URL view).
    Intent(IntentAction),

    /// A notification was captured on the host.
    Notification(Notification),

    /// The host launcher took over the foreground.
    LauncherStarted,
}
