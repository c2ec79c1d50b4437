//! Top-level classification of raw feed messages.
//!
//! The feed wraps everything in a small envelope: `{"type": ..., "payload":
//! {...}}`. Payload contents are untrusted and stay as raw JSON here; the
//! per-event decoders in [`super::decoder`] pull typed fields out of them.

use serde_json::Value;

use super::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Service,
    Connection,
}

/// One classified feed message.
#[derive(Debug)]
pub enum FeedMessage {
    /// A game event, routed by `event_name`
    Service { event_name: String, payload: Value },
    Heartbeat,
    StateChange(StateChange),
    /// Response to a subscription request; carries no `type` field
    SubscriptionAck,
    /// Operator-injected marker, only seen during replay
    Marker { payload: Value },
    /// Envelope type the tracker does not know about
    Unknown { message_type: String },
}

pub fn classify(raw: &str) -> Result<FeedMessage, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;

    let Some(message_type) = value.get("type").and_then(Value::as_str) else {
        return Ok(FeedMessage::SubscriptionAck);
    };

    match message_type {
        "serviceMessage" => {
            let payload = value
                .get("payload")
                .filter(|p| p.is_object())
                .cloned()
                .ok_or(DecodeError::MissingPayload)?;
            let event_name = payload
                .get("event_name")
                .and_then(Value::as_str)
                .ok_or(DecodeError::MissingField {
                    field: "event_name",
                })?
                .to_string();
            Ok(FeedMessage::Service {
                event_name,
                payload,
            })
        }
        "heartbeat" => Ok(FeedMessage::Heartbeat),
        "serviceStateChanged" => Ok(FeedMessage::StateChange(StateChange::Service)),
        "connectionStateChanged" => Ok(FeedMessage::StateChange(StateChange::Connection)),
        "toptMarker" => {
            let payload = value
                .get("payload")
                .filter(|p| p.is_object())
                .cloned()
                .ok_or(DecodeError::MissingPayload)?;
            Ok(FeedMessage::Marker { payload })
        }
        other => Ok(FeedMessage::Unknown {
            message_type: other.to_string(),
        }),
    }
}
