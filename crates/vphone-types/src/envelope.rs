//! Protocol envelopes.
//!
//! Each message on the wire is one `Request` (client to agent) or one
//! `Response` (agent to client). The dispatcher routes by variant; payload
//! layouts live in the sibling modules.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::apps::{AppsRequest, AppsResponse};
use crate::display::DisplayInfo;
use crate::input::{KeyEvent, TouchEvent};
use crate::location::{LocationEvent, LocationRequest};
use crate::notification::Notification;
use crate::sensor::SensorSample;
use crate::signaling::{SignalingMessage, VideoParams};

/// Client-to-agent envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub enum Request {
    /// Ask for the display geometry.
    ScreenInfo,

    /// Inject one pointer event (possibly multi-touch).
    Touch(TouchEvent),

    /// A batch of sensor samples; applied strictly in array order.
    SensorBatch(Vec<SensorSample>),

    /// Start a host-side activity (e.g. open a URL).
    Intent(IntentAction),

    /// Location provider control and spoofed updates.
    Location(LocationRequest),

    /// Media transport parameters; sent once, before any signaling.
    VideoParams(VideoParams),

    /// Media transport signaling (offer/candidate/bye).
    Signaling(SignalingMessage),

    /// The client's display rotated.
    Rotation { rotation: i32 },

    /// Keepalive; echoed back verbatim.
    Ping(Ping),

    /// Set the device timezone.
    Timezone { id: String },

    /// App directory operations: refresh, launch, or go home.
    Apps(AppsRequest),

    /// Inject one key event.
    Key(KeyEvent),

    /// Runtime configuration changes (hardware keyboard, ...).
    Config(ConfigUpdate),
}

/// Agent-to-client envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub enum Response {
    /// The agent is ready to negotiate the media transport.
    VmReady,

    /// Display geometry reply to [`Request::ScreenInfo`].
    ScreenInfo(DisplayInfo),

    /// An intent intercepted on the host, relayed to the client.
    Intent(IntentAction),

    /// Location subscription changes the client must apply.
    Location(LocationEvent),

    /// Media transport signaling (answer/candidate).
    Signaling(SignalingMessage),

    /// Keepalive echo.
    Ping(Ping),

    /// App directory reply or an instruction to exit the app view.
    Apps(AppsResponse),

    /// A notification captured on the host.
    Notification(Notification),
}

/// Keepalive payload; the timestamp is opaque to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Ping {
    pub timestamp_ms: u64,
}

/// What an intent should do with its data string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum IntentKind {
    /// Display the data to the user (e.g. open a URL).
    View,
    /// Dial the number carried in the data.
    Dial,
}

/// A host activity request, or an intercepted host intent on the way out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct IntentAction {
    pub kind: IntentKind,
    pub data: String,
}

/// Runtime configuration pushed by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct ConfigUpdate {
    /// Attach or detach the virtual hardware keyboard.
    pub hard_keyboard: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorSample;

    fn bincode_roundtrip<T: Encode + Decode<()> + std::fmt::Debug>(value: &T) -> T {
        let config = bincode::config::standard();
        let bytes = bincode::encode_to_vec(value, config).unwrap();
        let (decoded, _): (T, _) = bincode::decode_from_slice(&bytes, config).unwrap();
        decoded
    }

    #[test]
    fn ping_roundtrip() {
        let msg = Request::Ping(Ping { timestamp_ms: 42 });
        match bincode_roundtrip(&msg) {
            Request::Ping(ping) => assert_eq!(ping.timestamp_ms, 42),
            other => panic!("unexpected envelope {other:?}"),
        }
    }

    #[test]
    fn sensor_batch_preserves_order() {
        let samples: Vec<SensorSample> = (0..4)
            .map(|i| SensorSample {
                sensor_type: 1,
                accuracy: 3,
                timestamp_ns: i,
                values: vec![i as f32],
            })
            .collect();
        let msg = Request::SensorBatch(samples);
        match bincode_roundtrip(&msg) {
            Request::SensorBatch(decoded) => {
                let stamps: Vec<i64> = decoded.iter().map(|s| s.timestamp_ns).collect();
                assert_eq!(stamps, vec![0, 1, 2, 3]);
            }
            other => panic!("unexpected envelope {other:?}"),
        }
    }

    #[test]
    fn intent_roundtrip() {
        let msg = Response::Intent(IntentAction {
            kind: IntentKind::View,
            data: "https://example.com".to_string(),
        });
        match bincode_roundtrip(&msg) {
            Response::Intent(intent) => assert_eq!(intent.data, "https://example.com"),
            other => panic!("unexpected envelope {other:?}"),
        }
    }
}
