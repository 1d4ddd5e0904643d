//! TCP stream framing.

use bincode::{Decode, Encode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::trace;

use crate::error::ProtocolError;
use crate::wire::MAX_MESSAGE_SIZE;

/// Split a connected socket into framed sender and receiver halves.
pub fn split(stream: TcpStream) -> (MessageSender, MessageReceiver) {
    let (read, write) = stream.into_split();
    (MessageSender::new(write), MessageReceiver::new(read))
}

/// Sends length-prefixed bincode messages over a TCP write half.
pub struct MessageSender {
    stream: OwnedWriteHalf,
}

impl MessageSender {
    fn new(stream: OwnedWriteHalf) -> Self {
        Self { stream }
    }

    /// Send a message, encoding it as length-prefixed bincode.
    pub async fn send<T: Encode>(&mut self, msg: &T) -> Result<(), ProtocolError> {
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

        self.stream.write_all(&len.to_be_bytes()).await?;
        self.stream.write_all(&payload).await?;

        trace!(len, "sent message");
        Ok(())
    }

    /// Shut down the write half (signal no more data to the peer).
    pub async fn shutdown(&mut self) -> Result<(), ProtocolError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Receives length-prefixed bincode messages from a TCP read half.
pub struct MessageReceiver {
    stream: OwnedReadHalf,
}

impl MessageReceiver {
    fn new(stream: OwnedReadHalf) -> Self {
        Self { stream }
    }

    /// Receive and decode a message.
    ///
    /// Returns `None` if the peer closed the connection at a frame
    /// boundary. EOF in the middle of a frame is an error.
    pub async fn recv<T: Decode<()>>(&mut self) -> Result<Option<T>, ProtocolError> {
        // Read 4-byte length prefix
        let mut len_buf = [0u8; 4];
        match self.stream.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(ProtocolError::Io(e)),
        }

        let len = u32::from_be_bytes(len_buf);
        if len > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: len,
                max: MAX_MESSAGE_SIZE,
            });
        }

        let mut payload = vec![0u8; len as usize];
        match self.stream.read_exact(&mut payload).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(ProtocolError::StreamClosed);
            }
            Err(e) => return Err(ProtocolError::Io(e)),
        }

        let config = bincode::config::standard();
        let (msg, _) = bincode::decode_from_slice(&payload, config)
            .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;

        trace!(len, "received message");
        Ok(Some(msg))
    }
}
