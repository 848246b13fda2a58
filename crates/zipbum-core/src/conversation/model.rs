use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Opaque conversation identifier assigned by the backend.
///
/// The backend currently issues integers, but the client never does
/// arithmetic on them, so textual identifiers are accepted as well and
/// round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConversationId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        Self::Numeric(id)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        match id.parse::<i64>() {
            Ok(numeric) => Self::Numeric(numeric),
            Err(_) => Self::Text(id.to_string()),
        }
    }
}

impl FromStr for ConversationId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.trim()))
    }
}

/// An entry of the conversation history list.
///
/// The title is derived by the backend (from the first user message); the
/// client never edits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_text_ids_round_trip() {
        let numeric: ConversationId = serde_json::from_str("42").unwrap();
        assert_eq!(numeric, ConversationId::Numeric(42));
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "42");

        let text: ConversationId = serde_json::from_str("\"c-9\"").unwrap();
        assert_eq!(text, ConversationId::Text("c-9".to_string()));
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"c-9\"");
    }

    #[test]
    fn parsing_prefers_numeric_ids() {
        assert_eq!(" 12 ".parse::<ConversationId>().unwrap(), ConversationId::Numeric(12));
        assert_eq!(
            "abc".parse::<ConversationId>().unwrap(),
            ConversationId::Text("abc".to_string())
        );
    }

    #[test]
    fn conversation_decodes_from_history_entry() {
        let conv: Conversation =
            serde_json::from_str(r#"{"id": 3, "title": "como pagar..."}"#).unwrap();
        assert_eq!(conv.id.to_string(), "3");
        assert_eq!(conv.title, "como pagar...");
    }
}
