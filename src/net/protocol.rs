//! Wire protocol - pipe-delimited text messages, newline framed
//!
//! Inbound: `k|<code>` key events, `m|<code>` rotation intents.
//! Outbound: `ID|<id>`, `pos|<n>|...`, `s|<n>|...`, `d|<id>`.
//!
//! Every outbound message is terminated with a newline by the session
//! writer; inbound bytes are split on newlines, so coalesced or fragmented
//! reads on the stream reassemble into whole messages.

use crate::game::player::{MoveKey, PlayerId, PlayerState, RotateIntent};

/// A decoded client command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    /// Movement key press or release
    Key { key: MoveKey, pressed: bool },
    /// Fire button pressed: lock and resolve a shot
    FirePressed,
    /// Fire button released: drop the lock
    FireReleased,
    /// Rotation intent change
    Rotate(RotateIntent),
}

/// Malformed or unknown inbound traffic. Always dropped, never fatal.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("message too short")]
    TooShort,

    #[error("unknown message prefix")]
    UnknownPrefix,

    #[error("missing code field")]
    MissingCode,

    #[error("unknown key code: {0}")]
    UnknownKeyCode(String),

    #[error("unknown rotation code: {0}")]
    UnknownRotateCode(String),
}

/// Decode one inbound message.
pub fn decode(raw: &str) -> Result<ClientCommand, ProtocolError> {
    let msg = raw.trim();
    if msg.len() < 2 {
        return Err(ProtocolError::TooShort);
    }

    if let Some(rest) = msg.strip_prefix("k|") {
        let code = rest.split('|').next().unwrap_or("").trim();
        if code.is_empty() {
            return Err(ProtocolError::MissingCode);
        }
        return match code {
            "1" => Ok(ClientCommand::Key { key: MoveKey::Forward, pressed: true }),
            "2" => Ok(ClientCommand::Key { key: MoveKey::Back, pressed: true }),
            "3" => Ok(ClientCommand::Key { key: MoveKey::StrafeLeft, pressed: true }),
            "4" => Ok(ClientCommand::Key { key: MoveKey::StrafeRight, pressed: true }),
            "m" => Ok(ClientCommand::Key { key: MoveKey::Forward, pressed: false }),
            "n" => Ok(ClientCommand::Key { key: MoveKey::Back, pressed: false }),
            "p" => Ok(ClientCommand::Key { key: MoveKey::StrafeLeft, pressed: false }),
            "q" => Ok(ClientCommand::Key { key: MoveKey::StrafeRight, pressed: false }),
            "f" => Ok(ClientCommand::FirePressed),
            "nf" => Ok(ClientCommand::FireReleased),
            other => Err(ProtocolError::UnknownKeyCode(other.to_string())),
        };
    }

    if let Some(rest) = msg.strip_prefix("m|") {
        let code = rest.split('|').next().unwrap_or("").trim();
        if code.is_empty() {
            return Err(ProtocolError::MissingCode);
        }
        return match code {
            "l" => Ok(ClientCommand::Rotate(RotateIntent::Left)),
            "r" => Ok(ClientCommand::Rotate(RotateIntent::Right)),
            "s" => Ok(ClientCommand::Rotate(RotateIntent::Stop)),
            other => Err(ProtocolError::UnknownRotateCode(other.to_string())),
        };
    }

    Err(ProtocolError::UnknownPrefix)
}

/// One player's row in a `pos|...` broadcast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub health: u32,
    pub animation_id: u8,
}

impl PlayerSnapshot {
    pub fn of(player: &PlayerState) -> Self {
        Self {
            id: player.id,
            x: player.x,
            y: player.y,
            z: player.z,
            roll: player.roll,
            pitch: player.pitch,
            yaw: player.yaw,
            health: player.health,
            animation_id: player.animation.id(),
        }
    }
}

/// Identity assignment, sent once per connection.
pub fn encode_welcome(id: PlayerId) -> String {
    format!("ID|{id}")
}

/// Position snapshot for all players, one decimal place for floats.
pub fn encode_positions(players: &[PlayerSnapshot]) -> String {
    let mut msg = format!("pos|{}", players.len());
    for p in players {
        msg.push_str(&format!(
            "|{}|{:.1}|{:.1}|{:.1}|{:.1}|{:.1}|{:.1}|{}|{}",
            p.id, p.x, p.y, p.z, p.roll, p.pitch, p.yaw, p.health, p.animation_id
        ));
    }
    msg
}

/// Score snapshot for all players.
pub fn encode_scores(rows: &[(PlayerId, u32)]) -> String {
    let mut msg = format!("s|{}", rows.len());
    for (id, score) in rows {
        msg.push_str(&format!("|{id}|{score}"));
    }
    msg
}

/// One-shot death notice.
pub fn encode_death(id: PlayerId) -> String {
    format!("d|{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_key_presses_and_releases() {
        assert_eq!(
            decode("k|1"),
            Ok(ClientCommand::Key { key: MoveKey::Forward, pressed: true })
        );
        assert_eq!(
            decode("k|q"),
            Ok(ClientCommand::Key { key: MoveKey::StrafeRight, pressed: false })
        );
        assert_eq!(decode("k|f"), Ok(ClientCommand::FirePressed));
        assert_eq!(decode("k|nf"), Ok(ClientCommand::FireReleased));
    }

    #[test]
    fn decodes_rotation_intents() {
        assert_eq!(decode("m|l"), Ok(ClientCommand::Rotate(RotateIntent::Left)));
        assert_eq!(decode("m|r"), Ok(ClientCommand::Rotate(RotateIntent::Right)));
        assert_eq!(decode("m|s"), Ok(ClientCommand::Rotate(RotateIntent::Stop)));
    }

    #[test]
    fn trailing_fields_are_ignored() {
        assert_eq!(
            decode("k|2|junk"),
            Ok(ClientCommand::Key { key: MoveKey::Back, pressed: true })
        );
        assert_eq!(decode(" m|l \n"), Ok(ClientCommand::Rotate(RotateIntent::Left)));
    }

    #[test]
    fn rejects_malformed_messages() {
        assert_eq!(decode(""), Err(ProtocolError::TooShort));
        assert_eq!(decode("k"), Err(ProtocolError::TooShort));
        assert_eq!(decode("x|1"), Err(ProtocolError::UnknownPrefix));
        assert_eq!(decode("k|"), Err(ProtocolError::MissingCode));
        assert_eq!(decode("k|9"), Err(ProtocolError::UnknownKeyCode("9".into())));
        assert_eq!(decode("m|x"), Err(ProtocolError::UnknownRotateCode("x".into())));
    }

    #[test]
    fn encodes_welcome_and_death() {
        assert_eq!(encode_welcome(7), "ID|7");
        assert_eq!(encode_death(12), "d|12");
    }

    #[test]
    fn encodes_position_snapshot() {
        let snaps = vec![
            PlayerSnapshot {
                id: 1,
                x: 500.0,
                y: 600.5,
                z: 90.0,
                roll: 0.0,
                pitch: 0.0,
                yaw: 93.0,
                health: 98,
                animation_id: 1,
            },
            PlayerSnapshot {
                id: 2,
                x: 100.0,
                y: 2000.0,
                z: 90.0,
                roll: 0.0,
                pitch: 0.0,
                yaw: 0.0,
                health: 0,
                animation_id: 3,
            },
        ];
        assert_eq!(
            encode_positions(&snaps),
            "pos|2|1|500.0|600.5|90.0|0.0|0.0|93.0|98|1|2|100.0|2000.0|90.0|0.0|0.0|0.0|0|3"
        );
    }

    #[test]
    fn encodes_score_snapshot() {
        assert_eq!(encode_scores(&[]), "s|0");
        assert_eq!(encode_scores(&[(1, 3), (4, 0)]), "s|2|1|3|4|0");
    }
}
