//! Core agent for vphone.
//!
//! Implements the exclusive-session engine, per-tag dispatch, the media
//! signaling state machine, and the location-subscription ledger. Host
//! actions go through the capability traits in `vphone-host`; the wire
//! protocol lives in `vphone-protocol`.

pub mod agent;
pub mod apps;
pub mod config;
pub mod error;
pub mod ledger;
pub mod session;
pub mod signaling;

pub use agent::Agent;
pub use config::Config;
pub use error::AgentError;
pub use ledger::{MemoryStore, SubscriptionLedger, SubscriptionStore};
