//! Wire format: length-prefixed bincode v2 frames.
//!
//! Each message on the wire is:
//!   [4 bytes big-endian length][bincode v2 payload]

use bincode::{Decode, Encode};

use crate::error::ProtocolError;

/// Maximum message size (1 MiB). Prevents allocation bombs.
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;

/// Encode a message to a length-prefixed byte vector.
pub fn encode_message<T: Encode>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let config = bincode::config::standard();
    let payload = bincode::encode_to_vec(msg, config)
        .map_err(|e| ProtocolError::Serialization(e.to_string()))?;

    let len = u32::try_from(payload.len())
        .map_err(|_| ProtocolError::Serialization("message too large".to_string()))?;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode a message from a bincode v2 payload (without the length prefix).
pub fn decode_message<T: Decode<()>>(payload: &[u8]) -> Result<T, ProtocolError> {
    let config = bincode::config::standard();
    let (msg, _) = bincode::decode_from_slice(payload, config)
        .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vphone_types::envelope::Ping;
    use vphone_types::{Request, Response};

    #[test]
    fn encode_decode_roundtrip() {
        let msg = Request::Timezone {
            id: "America/New_York".to_string(),
        };

        let bytes = encode_message(&msg).unwrap();
        // First 4 bytes are length
        let len = u32::from_be_bytes(bytes[..4].try_into().unwrap());
        assert_eq!(len as usize, bytes.len() - 4);

        let decoded: Request = decode_message(&bytes[4..]).unwrap();
        match decoded {
            Request::Timezone { id } => assert_eq!(id, "America/New_York"),
            other => panic!("unexpected envelope {other:?}"),
        }
    }

    #[test]
    fn ping_echo_wire_roundtrip() {
        let msg = Response::Ping(Ping { timestamp_ms: 12345 });
        let bytes = encode_message(&msg).unwrap();
        let decoded: Response = decode_message(&bytes[4..]).unwrap();
        match decoded {
            Response::Ping(ping) => assert_eq!(ping.timestamp_ms, 12345),
            other => panic!("unexpected envelope {other:?}"),
        }
    }

    #[test]
    fn garbage_payload_is_a_decode_error() {
        let err = decode_message::<Request>(&[0xff; 16]).unwrap_err();
        assert!(matches!(err, ProtocolError::Deserialization(_)));
    }
}
