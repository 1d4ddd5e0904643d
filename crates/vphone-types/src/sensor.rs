//! Sensor sample payloads.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// One sensor reading from the client.
///
/// Samples are ordered work items: the agent must relay them to the host
/// sensor pipeline in exactly the order they were received, across batch
/// boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct SensorSample {
    /// Host sensor type code (accelerometer, gyroscope, ...).
    pub sensor_type: i32,
    pub accuracy: i32,
    pub timestamp_ns: i64,
    pub values: Vec<f32>,
}
