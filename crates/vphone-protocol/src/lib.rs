//! TCP transport and wire protocol for vphone.
//!
//! This crate handles message framing (length-prefixed bincode v2) and the
//! sender/receiver halves of a client connection. Envelope schemas live in
//! `vphone-types`; this layer treats a message as an opaque encodable value.

pub mod connection;
pub mod error;
pub mod wire;

pub use connection::{split, MessageReceiver, MessageSender};
pub use error::ProtocolError;
