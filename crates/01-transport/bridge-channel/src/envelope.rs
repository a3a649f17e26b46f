use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ChannelResult, ProtocolError};
use crate::schema::{CallBatch, ModuleConfig};
use crate::topic;

/// The only record exchanged over the channel, in either direction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Serialises the envelope to the single string that crosses the channel.
    pub fn encode(&self) -> ChannelResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(frame: &str) -> ChannelResult<Self> {
        Ok(serde_json::from_str(frame)?)
    }
}

/// Handshake payload for `loadBridgeConfig`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadBridgeConfig {
    pub config: Vec<ModuleConfig>,
    pub bundle: String,
}

/// Messages sent by the host bridge to the worker.
#[derive(Clone, Debug, PartialEq)]
pub enum HostMessage {
    LoadBridgeConfig(LoadBridgeConfig),
    CallFunction {
        module: String,
        method: String,
        args: Vec<Value>,
    },
    InvokeCallback {
        callback_id: u64,
        args: Vec<Value>,
    },
    Flush,
}

impl HostMessage {
    pub fn topic(&self) -> &'static str {
        match self {
            HostMessage::LoadBridgeConfig(_) => topic::LOAD_BRIDGE_CONFIG,
            HostMessage::CallFunction { .. } => topic::CALL_FUNCTION_RETURN_FLUSHED_QUEUE,
            HostMessage::InvokeCallback { .. } => topic::INVOKE_CALLBACK_AND_RETURN_FLUSHED_QUEUE,
            HostMessage::Flush => topic::FLUSH,
        }
    }

    pub fn to_envelope(&self) -> ChannelResult<Envelope> {
        let payload = match self {
            HostMessage::LoadBridgeConfig(config) => serde_json::to_value(config)?,
            HostMessage::CallFunction {
                module,
                method,
                args,
            } => json!([module, method, args]),
            HostMessage::InvokeCallback { callback_id, args } => json!([callback_id, args]),
            HostMessage::Flush => Value::Null,
        };
        Ok(Envelope::new(self.topic(), payload))
    }

    pub fn from_envelope(envelope: Envelope) -> Result<Self, ProtocolError> {
        match envelope.topic.as_str() {
            topic::LOAD_BRIDGE_CONFIG => serde_json::from_value(envelope.payload)
                .map(HostMessage::LoadBridgeConfig)
                .map_err(|err| ProtocolError::malformed(topic::LOAD_BRIDGE_CONFIG, err.to_string())),
            topic::CALL_FUNCTION_RETURN_FLUSHED_QUEUE => {
                serde_json::from_value::<(String, String, Vec<Value>)>(envelope.payload)
                    .map(|(module, method, args)| HostMessage::CallFunction {
                        module,
                        method,
                        args,
                    })
                    .map_err(|err| {
                        ProtocolError::malformed(
                            topic::CALL_FUNCTION_RETURN_FLUSHED_QUEUE,
                            err.to_string(),
                        )
                    })
            }
            topic::INVOKE_CALLBACK_AND_RETURN_FLUSHED_QUEUE => {
                serde_json::from_value::<(u64, Vec<Value>)>(envelope.payload)
                    .map(|(callback_id, args)| HostMessage::InvokeCallback { callback_id, args })
                    .map_err(|err| {
                        ProtocolError::malformed(
                            topic::INVOKE_CALLBACK_AND_RETURN_FLUSHED_QUEUE,
                            err.to_string(),
                        )
                    })
            }
            topic::FLUSH => Ok(HostMessage::Flush),
            _ => Err(ProtocolError::UnknownTopic(envelope.topic)),
        }
    }
}

/// Messages sent by the worker to the host bridge.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkerMessage {
    BundleFinishedLoading,
    FlushedQueue(CallBatch),
    UpdateProgress(Value),
}

impl WorkerMessage {
    pub fn topic(&self) -> &'static str {
        match self {
            WorkerMessage::BundleFinishedLoading => topic::BUNDLE_FINISHED_LOADING,
            WorkerMessage::FlushedQueue(_) => topic::FLUSHED_QUEUE,
            WorkerMessage::UpdateProgress(_) => topic::UPDATE_PROGRESS,
        }
    }

    pub fn to_envelope(&self) -> Envelope {
        let payload = match self {
            WorkerMessage::BundleFinishedLoading => Value::Null,
            WorkerMessage::FlushedQueue(batch) => batch.to_payload(),
            WorkerMessage::UpdateProgress(progress) => progress.clone(),
        };
        Envelope::new(self.topic(), payload)
    }

    pub fn from_envelope(envelope: Envelope) -> Result<Self, ProtocolError> {
        match envelope.topic.as_str() {
            topic::BUNDLE_FINISHED_LOADING => Ok(WorkerMessage::BundleFinishedLoading),
            topic::FLUSHED_QUEUE => {
                CallBatch::from_payload(&envelope.payload).map(WorkerMessage::FlushedQueue)
            }
            topic::UPDATE_PROGRESS => Ok(WorkerMessage::UpdateProgress(envelope.payload)),
            _ => Err(ProtocolError::UnknownTopic(envelope.topic)),
        }
    }
}
