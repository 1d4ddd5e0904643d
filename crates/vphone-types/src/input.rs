//! Pointer and key event payloads.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// One pointer in a multi-touch event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct PointerCoord {
    pub id: i32,
    pub x: f32,
    pub y: f32,
}

/// A motion event as reported by the client, in client screen coordinates.
///
/// The host injector is responsible for rotation-aware coordinate mapping;
/// the protocol always carries portrait-origin coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct TouchEvent {
    /// Host motion action code (down, up, move, pointer down/up).
    pub action: i32,
    /// All active pointers, in client order.
    pub pointers: Vec<PointerCoord>,
}

/// A key event to inject into the host input pipeline.
///
/// Either a single keycode event or, when `characters` is set, a
/// committed-text event; the remaining fields mirror the host's key event
/// model and are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct KeyEvent {
    pub down_time_ms: u64,
    pub action: i32,
    pub code: i32,
    pub repeat: i32,
    pub meta_state: i32,
    pub device_id: i32,
    pub scan_code: i32,
    pub flags: i32,
    pub source: i32,
    pub characters: Option<String>,
}
