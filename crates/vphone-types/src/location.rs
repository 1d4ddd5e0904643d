//! Location provider control and subscription types.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// The passive provider never reaches the host subscription services.
pub const PASSIVE_PROVIDER: &str = "passive";

/// Whether a provider name may be subscribed at the host level.
pub fn valid_provider(provider: &str) -> bool {
    !provider.is_empty() && provider != PASSIVE_PROVIDER
}

/// Client-to-agent location operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub enum LocationRequest {
    /// Register (spoof) a test provider with these characteristics.
    ProviderInfo(ProviderInfo),
    /// Spoof the provider's status.
    ProviderStatus(ProviderStatus),
    /// Spoof the provider's enabled/disabled state.
    ProviderEnabled(ProviderEnabled),
    /// Push one spoofed location fix.
    Update(LocationUpdate),
}

/// Characteristics of a location provider mirrored from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct ProviderInfo {
    pub provider: String,
    pub requires_network: bool,
    pub requires_satellite: bool,
    pub requires_cell: bool,
    pub has_monetary_cost: bool,
    pub supports_altitude: bool,
    pub supports_speed: bool,
    pub supports_bearing: bool,
    pub power_requirement: i32,
    pub accuracy: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct ProviderStatus {
    pub provider: String,
    pub status: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct ProviderEnabled {
    pub provider: String,
    pub enabled: bool,
}

/// One location fix from the client, forwarded to the test provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct LocationUpdate {
    pub provider: String,
    pub latitude: f64,
    pub longitude: f64,
    pub time_ms: u64,
    pub accuracy: Option<f32>,
    pub altitude: Option<f64>,
    pub bearing: Option<f32>,
    pub speed: Option<f32>,
}

/// Agent-to-client subscription changes produced by reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub enum LocationEvent {
    /// (Re)subscribe the client's provider with the given constraints.
    Subscribe {
        subscription: LocationSubscription,
        single_shot: bool,
    },
    /// No active requests remain; fully unsubscribe the provider.
    Unsubscribe { provider: String },
}

/// An active location update request for one provider.
///
/// Both constraints are lower bounds: smaller values mean a more eager
/// subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct LocationSubscription {
    pub provider: String,
    pub min_interval_ms: u64,
    pub min_distance_m: f32,
}

impl LocationSubscription {
    pub fn new(provider: impl Into<String>, min_interval_ms: u64, min_distance_m: f32) -> Self {
        Self {
            provider: provider.into(),
            min_interval_ms,
            min_distance_m: min_distance_m.max(0.0),
        }
    }

    /// Whether updates delivered under `self` also satisfy `other`.
    ///
    /// True iff `self` is at least as eager in both dimensions.
    pub fn satisfies(&self, other: &Self) -> bool {
        self.min_interval_ms <= other.min_interval_ms
            && self.min_distance_m <= other.min_distance_m
    }

    /// Componentwise minimum of the two requests' constraints.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            provider: self.provider.clone(),
            min_interval_ms: self.min_interval_ms.min(other.min_interval_ms),
            min_distance_m: self.min_distance_m.min(other.min_distance_m),
        }
    }
}
