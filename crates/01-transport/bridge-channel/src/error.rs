use thiserror::Error;

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Failures raised while moving frames across the channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel peer disconnected")]
    Closed,

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Inbound input that is well-formed JSON but not a message the receiver
/// understands. Receivers log and drop these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("malformed {topic} payload: {reason}")]
    MalformedPayload { topic: &'static str, reason: String },

    #[error("malformed call batch: {0}")]
    MalformedBatch(String),
}

impl ProtocolError {
    pub fn malformed(topic: &'static str, reason: impl Into<String>) -> Self {
        ProtocolError::MalformedPayload {
            topic,
            reason: reason.into(),
        }
    }
}
