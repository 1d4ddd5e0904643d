//! Media transport signaling payloads.
//!
//! The agent is always the answerer: the client sends the offer, the agent
//! replies with an answer and both sides trickle candidates.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Parameters for the media transport, sent once per connection.
///
/// The strings are opaque JSON blobs consumed by the media engine; the
/// agent does not interpret them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct VideoParams {
    pub ice_servers: String,
    pub pc_constraints: String,
    pub video_constraints: String,
}

/// One signaling exchange message, either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum SignalingMessage {
    /// Remote session description from the client.
    Offer { sdp: String },
    /// Local session description synthesized by the agent.
    Answer { sdp: String },
    /// A trickled transport candidate.
    Candidate(IceCandidate),
    /// The remote end hung up.
    Bye,
}

/// A single transport candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct IceCandidate {
    pub sdp_mid: String,
    pub sdp_mline_index: u32,
    pub candidate: String,
}
