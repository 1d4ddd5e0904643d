//! Display geometry.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Physical display size in pixels, portrait orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct DisplayInfo {
    pub width: u32,
    pub height: u32,
}

impl DisplayInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}
