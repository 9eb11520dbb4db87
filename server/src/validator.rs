//! Input Validator
//!
//! Every mutating command passes through [Validator::decode] before it reaches the
//! room. The raw wire payload is never trusted: anything that does not have the
//! expected shape becomes [Rejection::Malformed] and is dropped without a reply.

use comms::command::RawCommand;
use serde_json::Value;

use crate::error::Rejection;

const ALLOWED_SCHEMES: [&str; 2] = ["http://", "https://"];

/// A command that passed validation, with its references already sanitized
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TimeSync { client_send_time: f64 },
    AddSong { reference: PendingReference },
    RemoveSong { reference: String },
    Switch { reference: String },
    Play,
    Pause,
    Seek { position: f64 },
}

#[derive(Debug, Clone, Copy)]
pub struct Validator {
    max_reference_length: usize,
}

impl Validator {
    pub fn new(max_reference_length: usize) -> Self {
        Validator {
            max_reference_length,
        }
    }

    /// Decode a raw wire command into a typed [Command]
    pub fn decode(&self, raw: &RawCommand) -> Result<Command, Rejection> {
        match raw.event.as_str() {
            "time_sync" => coerce_number(&raw.data)
                .map(|client_send_time| Command::TimeSync { client_send_time })
                .ok_or_else(|| Rejection::malformed("time_sync payload is not a number")),
            "add_song" => {
                let url = song_url(&raw.data)?;

                Ok(Command::AddSong {
                    reference: self.check_length(url)?,
                })
            }
            // removal only needs to match what `add_song` stored
            "remove_song" => Ok(Command::RemoveSong {
                reference: escape_reference(song_url(&raw.data)?),
            }),
            "control_action" => self.decode_control_action(&raw.data),
            other => Err(Rejection::malformed(format!("unknown event '{}'", other))),
        }
    }

    fn decode_control_action(&self, data: &Value) -> Result<Command, Rejection> {
        let payload = data
            .as_object()
            .ok_or_else(|| Rejection::malformed("control_action payload is not an object"))?;
        let action = payload
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| Rejection::malformed("control_action without an action"))?;
        let value = payload.get("value").unwrap_or(&Value::Null);

        match action {
            "switch" => {
                let url = non_empty_str(value)
                    .ok_or_else(|| Rejection::malformed("switch target is not a string"))?;

                Ok(Command::Switch {
                    reference: self.sanitize_reference(url)?,
                })
            }
            "play" => Ok(Command::Play),
            "pause" => Ok(Command::Pause),
            "seek" => coerce_number(value)
                .map(|position| Command::Seek { position })
                .ok_or_else(|| Rejection::malformed("seek value is not a number")),
            other => Err(Rejection::malformed(format!("unknown action '{}'", other))),
        }
    }

    /// Check a media reference against the length and scheme policy and escape it for storage
    pub fn sanitize_reference(&self, url: &str) -> Result<String, Rejection> {
        self.check_length(url)?.sanitize()
    }

    fn check_length(&self, url: &str) -> Result<PendingReference, Rejection> {
        let length = url.chars().count();
        if length > self.max_reference_length {
            return Err(Rejection::ReferenceTooLong {
                length,
                max: self.max_reference_length,
            });
        }

        Ok(PendingReference(url.to_string()))
    }
}

/// A media reference within the length limit whose scheme has not been judged yet
///
/// A full playlist is reported before a bad scheme, so for `add_song` the last
/// checks run in the room, after its capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReference(pub(crate) String);

impl PendingReference {
    /// Check the scheme and escape the reference for storage
    pub fn sanitize(self) -> Result<String, Rejection> {
        if !ALLOWED_SCHEMES
            .iter()
            .any(|scheme| self.0.starts_with(scheme))
        {
            return Err(Rejection::UnsupportedScheme);
        }

        Ok(escape_reference(&self.0))
    }
}

/// HTML-escape a reference so clients may render it into a document as is
pub fn escape_reference(url: &str) -> String {
    html_escape::encode_quoted_attribute(url).into_owned()
}

/// Accept numbers and numeric strings, as long as they are finite
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}

fn song_url(data: &Value) -> Result<&str, Rejection> {
    data.as_object()
        .and_then(|payload| payload.get("url"))
        .and_then(non_empty_str)
        .ok_or_else(|| Rejection::malformed("song payload has no url"))
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn validator() -> Validator {
        Validator::new(1024)
    }

    fn decode(event: &str, data: Value) -> Result<Command, Rejection> {
        validator().decode(&RawCommand::new(event, data))
    }

    fn is_malformed(result: Result<Command, Rejection>) -> bool {
        matches!(result, Err(Rejection::Malformed(_)))
    }

    /// What `add_song` would store once the room accepts it
    fn added(data: Value) -> Result<String, Rejection> {
        match decode("add_song", data)? {
            Command::AddSong { reference } => reference.sanitize(),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_time_sync() {
        assert_eq!(
            decode("time_sync", json!(1700000000000u64)),
            Ok(Command::TimeSync {
                client_send_time: 1700000000000.0
            })
        );
        assert!(is_malformed(decode("time_sync", json!({"t": 1}))));
        assert!(is_malformed(decode("time_sync", json!(true))));
        assert!(is_malformed(decode("time_sync", Value::Null)));
    }

    #[test]
    fn test_add_song_escapes_markup() {
        assert_eq!(
            added(json!({"url": "https://x/<script>"})),
            Ok("https://x/&lt;script&gt;".to_string())
        );
        assert_eq!(
            added(json!({"url": "https://x/a?b=1&c=2"})),
            Ok("https://x/a?b=1&amp;c=2".to_string())
        );
    }

    #[test]
    fn test_add_song_scheme_is_judged_after_decoding() {
        // the room still has to check its capacity first
        assert_eq!(
            decode("add_song", json!({"url": "javascript:alert(1)"})),
            Ok(Command::AddSong {
                reference: PendingReference("javascript:alert(1)".to_string())
            })
        );
        assert_eq!(
            added(json!({"url": "javascript:alert(1)"})),
            Err(Rejection::UnsupportedScheme)
        );
        assert_eq!(
            added(json!({"url": "HTTPS://x/a"})),
            Err(Rejection::UnsupportedScheme)
        );
    }

    #[test]
    fn test_add_song_rejects_oversized_reference() {
        let url = format!("https://x/{}", "a".repeat(1024));

        assert_eq!(
            decode("add_song", json!({ "url": url })),
            Err(Rejection::ReferenceTooLong {
                length: 1034,
                max: 1024
            })
        );
    }

    #[test]
    fn test_reference_length_counts_characters() {
        let validator = Validator::new(12);

        assert!(validator.sanitize_reference("https://x/éé").is_ok());
        assert!(validator.sanitize_reference("https://x/ééé").is_err());
    }

    #[test]
    fn test_song_payload_shape() {
        assert!(is_malformed(decode("add_song", json!("https://x/a"))));
        assert!(is_malformed(decode("add_song", json!({"url": 5}))));
        assert!(is_malformed(decode("add_song", json!({"url": ""}))));
        assert!(is_malformed(decode("remove_song", json!({}))));
    }

    #[test]
    fn test_remove_song_is_escaped_without_policy_checks() {
        assert_eq!(
            decode("remove_song", json!({"url": "https://x/<a>"})),
            Ok(Command::RemoveSong {
                reference: "https://x/&lt;a&gt;".to_string()
            })
        );
        assert_eq!(
            decode("remove_song", json!({"url": "ftp://x/a"})),
            Ok(Command::RemoveSong {
                reference: "ftp://x/a".to_string()
            })
        );
    }

    #[test]
    fn test_control_actions() {
        assert_eq!(
            decode("control_action", json!({"action": "play", "value": "ignored"})),
            Ok(Command::Play)
        );
        assert_eq!(
            decode("control_action", json!({"action": "pause"})),
            Ok(Command::Pause)
        );
        assert_eq!(
            decode(
                "control_action",
                json!({"action": "switch", "value": "https://x/b"})
            ),
            Ok(Command::Switch {
                reference: "https://x/b".to_string()
            })
        );
        assert_eq!(
            decode(
                "control_action",
                json!({"action": "switch", "value": "file:///etc/passwd"})
            ),
            Err(Rejection::UnsupportedScheme)
        );
        assert!(is_malformed(decode(
            "control_action",
            json!({"action": "switch", "value": 3})
        )));
        assert!(is_malformed(decode(
            "control_action",
            json!({"action": "rewind"})
        )));
        assert!(is_malformed(decode("control_action", json!(["play"]))));
    }

    #[test]
    fn test_seek_coercion() {
        assert_eq!(
            decode("control_action", json!({"action": "seek", "value": 42.5})),
            Ok(Command::Seek { position: 42.5 })
        );
        assert_eq!(
            decode("control_action", json!({"action": "seek", "value": " 7 "})),
            Ok(Command::Seek { position: 7.0 })
        );
        // clamping is the room's business, the validator keeps the sign
        assert_eq!(
            decode("control_action", json!({"action": "seek", "value": -5})),
            Ok(Command::Seek { position: -5.0 })
        );
        for value in [json!("not-a-number"), json!("NaN"), json!("inf"), Value::Null] {
            assert!(is_malformed(decode(
                "control_action",
                json!({"action": "seek", "value": value})
            )));
        }
    }

    #[test]
    fn test_unknown_event() {
        assert!(is_malformed(decode("drop_table", json!({}))));
    }
}
