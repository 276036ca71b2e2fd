//! Envelope and payloads exchanged between the hub and node agents.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use nodeconf_core::defaults::{DEFAULT_FULL_SYNC, DEFAULT_SYNC_VERSION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HubError;

/// Envelope `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Status,
    Heartbeat,
    ConfigSync,
    ConfigAck,
    Command,
    Error,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Status => "status",
            MessageType::Heartbeat => "heartbeat",
            MessageType::ConfigSync => "config_sync",
            MessageType::ConfigAck => "config_ack",
            MessageType::Command => "command",
            MessageType::Error => "error",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{type, node_id, timestamp, data}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubMessage<T = Value> {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub node_id: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub data: T,
}

impl<T> HubMessage<T> {
    pub fn new(kind: MessageType, node_id: impl Into<String>, timestamp: i64, data: T) -> Self {
        Self {
            kind,
            node_id: node_id.into(),
            timestamp,
            data,
        }
    }
}

impl<C> HubMessage<ConfigSyncData<C>> {
    /// Config push. The envelope and payload share `timestamp`.
    pub fn config_sync(node_id: impl Into<String>, sync: SyncOptions, config: C) -> Self {
        Self::new(
            MessageType::ConfigSync,
            node_id,
            sync.timestamp,
            ConfigSyncData {
                version: sync.version,
                full_sync: sync.full_sync,
                config,
                timestamp: sync.timestamp,
            },
        )
    }
}

impl<T: Serialize> HubMessage<T> {
    pub fn to_json(&self) -> Result<String, HubError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, HubError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl HubMessage<Value> {
    /// Parse an envelope, leaving `data` untyped.
    pub fn parse(raw: &str) -> Result<Self, HubError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Type the payload, checking the envelope type first.
    pub fn into_typed<T: DeserializeOwned>(
        self,
        expected: MessageType,
    ) -> Result<HubMessage<T>, HubError> {
        if self.kind != expected {
            return Err(HubError::TypeMismatch {
                expected,
                got: self.kind,
            });
        }
        Ok(HubMessage {
            kind: self.kind,
            node_id: self.node_id,
            timestamp: self.timestamp,
            data: serde_json::from_value(self.data)?,
        })
    }

    /// Reject messages addressed to another node.
    pub fn ensure_node(&self, node_id: &str) -> Result<(), HubError> {
        if self.node_id != node_id {
            return Err(HubError::NodeMismatch {
                expected: node_id.to_string(),
                got: self.node_id.clone(),
            });
        }
        Ok(())
    }
}

/// Version and timing of a config push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    pub version: u64,
    pub full_sync: bool,
    /// Unix seconds.
    pub timestamp: i64,
}

impl SyncOptions {
    /// Defaults stamped with the current time.
    pub fn now() -> Self {
        Self {
            version: DEFAULT_SYNC_VERSION,
            full_sync: DEFAULT_FULL_SYNC,
            timestamp: unix_now(),
        }
    }
}

/// `config_sync` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSyncData<C = Value> {
    pub version: u64,
    pub full_sync: bool,
    pub config: C,
    pub timestamp: i64,
}

/// `config_ack` payload sent back by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigAck {
    pub version: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConfigAck {
    pub fn ok(version: u64) -> Self {
        Self {
            version,
            success: true,
            error: None,
        }
    }

    pub fn failed(version: u64, error: impl Into<String>) -> Self {
        Self {
            version,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Node run state reported in `status` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Online,
    Offline,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusData {
    pub state: NodeState,
    /// Version of the config currently running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatData {
    pub uptime_secs: u64,
    #[serde(default)]
    pub connections: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandData {
    pub command: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    pub code: String,
    pub message: String,
}

/// Current Unix time in seconds; 0 if the clock is before the epoch.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sync() -> SyncOptions {
        SyncOptions {
            version: 7,
            full_sync: true,
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn config_sync_shape() {
        let msg = HubMessage::config_sync("node_a", sync(), json!({"protocol": "trojan"}));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "config_sync",
                "node_id": "node_a",
                "timestamp": 1_700_000_000,
                "data": {
                    "version": 7,
                    "full_sync": true,
                    "config": {"protocol": "trojan"},
                    "timestamp": 1_700_000_000
                }
            })
        );
    }

    #[test]
    fn parse_and_type_ack() {
        let raw = r#"{"type":"config_ack","node_id":"node_a","timestamp":1,"data":{"version":7,"success":false,"error":"bad"}}"#;
        let msg = HubMessage::parse(raw).unwrap();
        msg.ensure_node("node_a").unwrap();
        let ack: HubMessage<ConfigAck> = msg.into_typed(MessageType::ConfigAck).unwrap();
        assert_eq!(ack.data, ConfigAck::failed(7, "bad"));
    }

    #[test]
    fn type_mismatch() {
        let msg = HubMessage::new(MessageType::Heartbeat, "node_a", 1, json!({"uptime_secs": 5}));
        let err = msg.into_typed::<ConfigAck>(MessageType::ConfigAck).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected message type: expected config_ack, got heartbeat"
        );
    }

    #[test]
    fn node_mismatch() {
        let msg = HubMessage::new(MessageType::Command, "node_b", 1, Value::Null);
        assert!(matches!(msg.ensure_node("node_a"), Err(HubError::NodeMismatch { .. })));
    }

    #[test]
    fn ack_omits_empty_error() {
        let value = serde_json::to_value(ConfigAck::ok(3)).unwrap();
        assert_eq!(value, json!({"version": 3, "success": true}));
    }

    #[test]
    fn other_payloads_round_trip() {
        let status = HubMessage::new(
            MessageType::Status,
            "node_a",
            2,
            StatusData {
                state: NodeState::Degraded,
                config_version: Some(7),
                message: None,
            },
        );
        let raw = status.to_json().unwrap();
        let back: HubMessage<StatusData> = HubMessage::parse(&raw)
            .unwrap()
            .into_typed(MessageType::Status)
            .unwrap();
        assert_eq!(back, status);

        let cmd: CommandData = serde_json::from_value(json!({"command": "reload"})).unwrap();
        assert!(cmd.args.is_null());
    }

    #[test]
    fn now_is_after_2020() {
        assert!(unix_now() > 1_577_836_800);
        assert_eq!(SyncOptions::now().version, DEFAULT_SYNC_VERSION);
    }
}
