//! Message type: immutable identity, mutable emotion/personality/processed annotations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One reaction applied to a message, e.g. `{"emoji": "👍", "count": 2, "users": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub count: u32,
    /// Display names of known agents who reacted; filtered to known personas only.
    #[serde(default)]
    pub users: Vec<String>,
}

/// Per-message emotion classification, filled by the emotion analyzer (C2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEmotion {
    pub emotion: String,
    pub justification: String,
}

impl MessageEmotion {
    pub fn error(justification: impl Into<String>) -> Self {
        Self {
            emotion: "ERROR".to_string(),
            justification: justification.into(),
        }
    }
}

/// Big-Five trait score for one user, one trait. `raw_confidence` is set only when
/// the message-count confidence penalty (C3) actually adjusted `confidence` down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitScore {
    pub score: u8,
    pub confidence: f64,
    pub justification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_confidence: Option<f64>,
}

/// The five canonical Big-Five trait keys, in the order they're analyzed.
pub const BIG_FIVE_TRAITS: [&str; 5] = [
    "openness",
    "conscientiousness",
    "extraversion",
    "agreeableness",
    "neuroticism",
];

pub type Big5 = HashMap<String, TraitScore>;

/// A chat message. `message_id`/sender fields/`text`/`date`/`timestamp` are set once
/// by the poller; `reactions`/`reply_to_message_id` come from the transport; the rest
/// are annotations filled in by later pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub sender_first_name: String,
    pub sender_last_name: String,
    pub text: String,
    pub date: DateTime<Utc>,
    /// ISO-8601 timestamp string, preserved verbatim from the source transport.
    pub timestamp: String,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_emotion: Option<MessageEmotion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_personality: Option<Big5>,
    #[serde(default)]
    pub processed: bool,
}

impl Message {
    /// Display name for the sender: username, else first+last, else first, else "Unknown".
    pub fn sender_display_name(&self) -> String {
        let username = self.sender_username.trim();
        let first = self.sender_first_name.trim();
        let last = self.sender_last_name.trim();
        if !username.is_empty() {
            username.to_string()
        } else if !first.is_empty() && !last.is_empty() {
            format!("{first} {last}")
        } else if !first.is_empty() {
            first.to_string()
        } else {
            "Unknown".to_string()
        }
    }
}
