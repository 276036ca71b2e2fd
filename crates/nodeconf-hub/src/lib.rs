//! Hub push-message schema.
//!
//! The hub talks to node agents over a persistent connection using JSON
//! envelopes of the form `{type, node_id, timestamp, data}`. This crate
//! defines the envelope and its payloads; the transport is out of scope.

pub mod error;
pub mod message;

pub use error::HubError;
pub use message::{
    CommandData, ConfigAck, ConfigSyncData, ErrorData, HeartbeatData, HubMessage, MessageType,
    NodeState, StatusData, SyncOptions, unix_now,
};
