//! App directory payloads.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Client-to-agent app directory operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum AppsRequest {
    /// Ask for a diff between the client's cached app list and what is
    /// actually installed on the host.
    Refresh {
        /// The client's current view of installed apps.
        current: Vec<AppSummary>,
        /// Target density for icon rendering.
        screen_density: u32,
    },
    /// Launch the app with this package name.
    Launch { package: String },
    /// Return to the home screen.
    Home,
}

/// Agent-to-client app directory replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum AppsResponse {
    /// Diff against the client's cached list.
    Refresh {
        added: Vec<AppEntry>,
        updated: Vec<AppEntry>,
        removed: Vec<String>,
    },
    /// The host launcher took over; the client should leave the app view.
    Exit,
}

/// The client's cached record of one app: label plus an icon digest, so
/// refresh requests stay small.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct AppSummary {
    pub package: String,
    pub label: String,
    /// SHA-256 of the icon bytes, if the client has one cached.
    pub icon_hash: Option<Vec<u8>>,
}

/// A launchable app installed on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct AppEntry {
    pub package: String,
    pub label: String,
    /// Encoded icon image, if one could be rendered.
    pub icon: Option<Vec<u8>>,
}
