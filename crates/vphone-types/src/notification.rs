//! Captured host notifications.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A notification captured on the host, already reduced to structured
/// fields by the host adapter. Extraction strategy is the adapter's
/// problem; the protocol only carries the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub small_icon: Option<Vec<u8>>,
    pub large_icon: Option<Vec<u8>>,
}
