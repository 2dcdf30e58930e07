//! # Input message module
//!
//! Messages delivered to the drive-by-wire executable by its collaborators. Each kind of message
//! may arrive independently of the others and at its own rate.
//!
//! Messages are exchanged as JSON packets of the form
//! `{"type": "<TYPE>", "payload": { ... }}`, where `<TYPE>` is one of `CURRENT_VEL`,
//! `TWIST_CMD` or `DBW_ENABLED`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use serde_json::{self, Value};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An inbound message.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputMsg {
    /// The measured linear velocity of the vehicle.
    CurrentVelocity {
        /// Forward speed in meters/second
        linear_ms: f64,
    },

    /// The commanded motion of the vehicle.
    TwistCmd {
        /// Target forward speed in meters/second
        linear_ms: f64,

        /// Target yaw rate in radians/second, positive to the left
        angular_rads: f64,
    },

    /// Whether autonomous control currently has authority over the vehicle.
    DbwEnabled { enabled: bool },
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum MsgParseError {
    #[error("Message contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Message has an invalid type ({0})")]
    InvalidType(String),

    #[error("Message of type {0} is expected to have a payload but it doesn't")]
    MissingPayload(&'static str),

    #[error("Message of type {0} has an invalid payload: {1}")]
    InvalidPayload(&'static str, serde_json::Error),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct VelocityPayload {
    linear_ms: f64,
}

#[derive(Deserialize)]
struct TwistPayload {
    linear_ms: f64,
    angular_rads: f64,
}

#[derive(Deserialize)]
struct EnabledPayload {
    enabled: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl InputMsg {
    /// Parse a new message from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, MsgParseError> {
        // Parse the JSON string into a value
        let val: Value = match serde_json::from_str(json_str) {
            Ok(v) => v,
            Err(e) => return Err(MsgParseError::InvalidJson(e)),
        };

        let msg_type = match val["type"].as_str() {
            Some(s) => s,
            None => {
                return Err(MsgParseError::InvalidType(String::from(
                    "Expected \"type\" to be a string",
                )))
            }
        };

        let payload = val["payload"].clone();

        match msg_type {
            "CURRENT_VEL" => {
                let p: VelocityPayload = parse_payload("CURRENT_VEL", payload)?;
                Ok(InputMsg::CurrentVelocity {
                    linear_ms: p.linear_ms,
                })
            }
            "TWIST_CMD" => {
                let p: TwistPayload = parse_payload("TWIST_CMD", payload)?;
                Ok(InputMsg::TwistCmd {
                    linear_ms: p.linear_ms,
                    angular_rads: p.angular_rads,
                })
            }
            "DBW_ENABLED" => {
                let p: EnabledPayload = parse_payload("DBW_ENABLED", payload)?;
                Ok(InputMsg::DbwEnabled { enabled: p.enabled })
            }
            t => Err(MsgParseError::InvalidType(format!(
                "{} is not a recognised message type",
                t
            ))),
        }
    }

    /// Serialise the message into the JSON packet format accepted by `from_json`.
    pub fn to_json(&self) -> String {
        let (msg_type, payload) = match self {
            InputMsg::CurrentVelocity { linear_ms } => {
                ("CURRENT_VEL", serde_json::json!({ "linear_ms": linear_ms }))
            }
            InputMsg::TwistCmd {
                linear_ms,
                angular_rads,
            } => (
                "TWIST_CMD",
                serde_json::json!({ "linear_ms": linear_ms, "angular_rads": angular_rads }),
            ),
            InputMsg::DbwEnabled { enabled } => {
                ("DBW_ENABLED", serde_json::json!({ "enabled": enabled }))
            }
        };

        serde_json::json!({ "type": msg_type, "payload": payload }).to_string()
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn parse_payload<T>(msg_type: &'static str, payload: Value) -> Result<T, MsgParseError>
where
    T: serde::de::DeserializeOwned,
{
    if payload.is_null() {
        return Err(MsgParseError::MissingPayload(msg_type));
    }

    serde_json::from_value(payload).map_err(|e| MsgParseError::InvalidPayload(msg_type, e))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_twist() {
        let msg = InputMsg::from_json(
            r#"{"type": "TWIST_CMD", "payload": {"linear_ms": 11.1, "angular_rads": -0.2}}"#,
        )
        .unwrap();

        assert_eq!(
            msg,
            InputMsg::TwistCmd {
                linear_ms: 11.1,
                angular_rads: -0.2
            }
        );
    }

    #[test]
    fn test_parse_enabled() {
        let msg =
            InputMsg::from_json(r#"{"type": "DBW_ENABLED", "payload": {"enabled": false}}"#)
                .unwrap();

        assert_eq!(msg, InputMsg::DbwEnabled { enabled: false });
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            InputMsg::from_json("not json"),
            Err(MsgParseError::InvalidJson(_))
        ));
        assert!(matches!(
            InputMsg::from_json(r#"{"type": "WARP_DRIVE", "payload": {}}"#),
            Err(MsgParseError::InvalidType(_))
        ));
        assert!(matches!(
            InputMsg::from_json(r#"{"type": "CURRENT_VEL"}"#),
            Err(MsgParseError::MissingPayload("CURRENT_VEL"))
        ));
        assert!(matches!(
            InputMsg::from_json(r#"{"type": "CURRENT_VEL", "payload": {"speed": 1.0}}"#),
            Err(MsgParseError::InvalidPayload("CURRENT_VEL", _))
        ));
    }

    #[test]
    fn test_to_json_is_parseable() {
        let msg = InputMsg::CurrentVelocity { linear_ms: 4.5 };

        assert_eq!(InputMsg::from_json(&msg.to_json()).unwrap(), msg);
    }
}
