use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of the `add_song` and `remove_song` commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongCommand {
    // The media reference to add or remove.
    pub url: String,
}

/// The four playback mutations a peer can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlActionKind {
    Switch,
    Play,
    Pause,
    Seek,
}

/// Argument of a control action. `switch` carries a reference, `seek` a position in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlValue {
    Number(f64),
    Text(String),
}

/// Payload of the `control_action` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlActionCommand {
    pub action: ControlActionKind,
    // Required for `switch` and `seek`, ignored otherwise.
    #[serde(default)]
    pub value: Option<ControlValue>,
}

impl ControlActionCommand {
    pub fn switch(url: impl Into<String>) -> Self {
        ControlActionCommand {
            action: ControlActionKind::Switch,
            value: Some(ControlValue::Text(url.into())),
        }
    }

    pub fn play() -> Self {
        ControlActionCommand {
            action: ControlActionKind::Play,
            value: None,
        }
    }

    pub fn pause() -> Self {
        ControlActionCommand {
            action: ControlActionKind::Pause,
            value: None,
        }
    }

    pub fn seek(position: f64) -> Self {
        ControlActionCommand {
            action: ControlActionKind::Seek,
            value: Some(ControlValue::Number(position)),
        }
    }
}

/// A command which a peer sends to the coordinator.
/// Every command is framed as `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum UserCommand {
    /// Clock probe carrying the client's send time in milliseconds.
    TimeSync(f64),
    AddSong(SongCommand),
    RemoveSong(SongCommand),
    ControlAction(ControlActionCommand),
}

/// Loosely-typed form of a command as it arrives on the wire.
///
/// The server never trusts the payload shape a peer claims to send, so it only
/// requires the event name here and leaves `data` to be checked by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCommand {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl RawCommand {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        RawCommand {
            event: event.into(),
            data,
        }
    }
}

impl TryFrom<&UserCommand> for RawCommand {
    type Error = serde_json::Error;

    fn try_from(command: &UserCommand) -> Result<Self, Self::Error> {
        serde_json::to_value(command).and_then(serde_json::from_value)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    // given a command enum, and an expect string, asserts that command is serialized / deserialized appropiately
    fn assert_command_serialization(command: &UserCommand, expected: &str) {
        let serialized = serde_json::to_string(&command).unwrap();
        assert_eq!(serialized, expected);
        let deserialized: UserCommand = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, *command);
    }

    #[test]
    fn test_time_sync_command() {
        assert_command_serialization(
            &UserCommand::TimeSync(1700000000123.5),
            r#"{"event":"time_sync","data":1700000000123.5}"#,
        );
    }

    #[test]
    fn test_add_song_command() {
        let command = UserCommand::AddSong(SongCommand {
            url: "https://media.test/a".to_string(),
        });

        assert_command_serialization(
            &command,
            r#"{"event":"add_song","data":{"url":"https://media.test/a"}}"#,
        );
    }

    #[test]
    fn test_remove_song_command() {
        let command = UserCommand::RemoveSong(SongCommand {
            url: "https://media.test/a".to_string(),
        });

        assert_command_serialization(
            &command,
            r#"{"event":"remove_song","data":{"url":"https://media.test/a"}}"#,
        );
    }

    #[test]
    fn test_control_action_commands() {
        assert_command_serialization(
            &UserCommand::ControlAction(ControlActionCommand::seek(42.5)),
            r#"{"event":"control_action","data":{"action":"seek","value":42.5}}"#,
        );
        assert_command_serialization(
            &UserCommand::ControlAction(ControlActionCommand::switch("https://media.test/b")),
            r#"{"event":"control_action","data":{"action":"switch","value":"https://media.test/b"}}"#,
        );
        assert_command_serialization(
            &UserCommand::ControlAction(ControlActionCommand::play()),
            r#"{"event":"control_action","data":{"action":"play","value":null}}"#,
        );
    }

    #[test]
    fn test_control_action_without_value() {
        let command: UserCommand =
            serde_json::from_str(r#"{"event":"control_action","data":{"action":"pause"}}"#)
                .unwrap();

        assert_eq!(
            command,
            UserCommand::ControlAction(ControlActionCommand::pause())
        );
    }

    #[test]
    fn test_raw_command_accepts_any_payload() {
        let raw: RawCommand =
            serde_json::from_str(r#"{"event":"add_song","data":[1,2,3]}"#).unwrap();
        assert_eq!(raw, RawCommand::new("add_song", json!([1, 2, 3])));

        let raw: RawCommand = serde_json::from_str(r#"{"event":"control_action"}"#).unwrap();
        assert_eq!(raw.data, Value::Null);
    }

    #[test]
    fn test_raw_command_from_user_command() {
        let command = UserCommand::ControlAction(ControlActionCommand::seek(3.0));
        let raw = RawCommand::try_from(&command).unwrap();

        assert_eq!(
            raw,
            RawCommand::new("control_action", json!({"action": "seek", "value": 3.0}))
        );
    }
}
