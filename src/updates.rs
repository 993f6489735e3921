use std::fmt;

/// Kinds of animated random throws the remote can produce.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
pub enum ThrowKind {
    SlotMachine,
    Bowling,
    Dart,
    Football,
    Basketball,
}

impl ThrowKind {
    pub fn emoji(self) -> &'static str {
        match self {
            ThrowKind::SlotMachine => "🎰",
            ThrowKind::Bowling => "🎳",
            ThrowKind::Dart => "🎯",
            ThrowKind::Football => "⚽",
            ThrowKind::Basketball => "🏀",
        }
    }

    pub fn from_emoji(emoji: &str) -> Option<Self> {
        [
            ThrowKind::SlotMachine,
            ThrowKind::Bowling,
            ThrowKind::Dart,
            ThrowKind::Football,
            ThrowKind::Basketball,
        ]
        .into_iter()
        .find(|kind| kind.emoji() == emoji)
    }
}

impl fmt::Display for ThrowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThrowKind::SlotMachine => "slot machine",
            ThrowKind::Bowling => "bowling",
            ThrowKind::Dart => "dart",
            ThrowKind::Football => "football",
            ThrowKind::Basketball => "basketball",
        };
        f.write_str(name)
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Throw {
    pub emoji: String,
    pub value: u8,
}

impl Throw {
    pub fn new(kind: ThrowKind, value: u8) -> Self {
        Self {
            emoji: kind.emoji().to_string(),
            value,
        }
    }

    /// `None` for emoji this bot does not know about.
    pub fn kind(&self) -> Option<ThrowKind> {
        ThrowKind::from_emoji(&self.emoji)
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Payload {
    Throw(Throw),
    Text(String),
    Other,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Message {
    pub message_id: i64,
    pub chat_id: i64,
    pub sender_id: Option<i64>,
    pub payload: Payload,
}

impl Message {
    pub fn throw(&self) -> Option<&Throw> {
        match &self.payload {
            Payload::Throw(throw) => Some(throw),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Update {
    pub update_id: i64,
    /// Absent for update types other than new messages (edits, callbacks, ...).
    pub message: Option<Message>,
}

/// Reference to a message the bot sent.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct MessageRef {
    pub message_id: i64,
    pub chat_id: i64,
}

impl From<&Message> for MessageRef {
    fn from(message: &Message) -> Self {
        Self {
            message_id: message.message_id,
            chat_id: message.chat_id,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn from_emoji__known_emoji__maps_back_to_kind() {
        for kind in [
            ThrowKind::SlotMachine,
            ThrowKind::Bowling,
            ThrowKind::Dart,
            ThrowKind::Football,
            ThrowKind::Basketball,
        ] {
            assert_eq!(ThrowKind::from_emoji(kind.emoji()), Some(kind));
        }
    }

    #[test]
    fn kind__unknown_emoji__is_none() {
        let throw = Throw {
            emoji: "🎲".to_string(),
            value: 3,
        };
        assert_eq!(throw.kind(), None);
    }
}
