//! Chat transport adapter: the five HTTP-JSON endpoints the supervisor speaks to.

mod http;
mod mock;

pub use http::HttpChatTransport;
pub use mock::{MockChatTransport, RecordedCall};

use async_trait::async_trait;

use crate::domain::Message;
use crate::errors::TransportError;

/// Static facts about a group chat, fetched once at cold start.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantsInfo {
    pub chat_title: String,
    pub chat_description: String,
    pub participants_count: u32,
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// `GET /chat-messages` — newest `limit` messages for `chat_id`.
    async fn fetch_messages(&self, phone: &str, chat_id: &str, limit: u32) -> Result<Vec<Message>, TransportError>;

    /// `GET /participants` — static group facts.
    async fn fetch_participants(&self, phone: &str, chat_id: &str) -> Result<ParticipantsInfo, TransportError>;

    /// `POST /messages/send`. `reply_to_timestamp`, when given, is an ISO-Z timestamp
    /// eliding into a native reply when the transport supports it.
    async fn send_message(&self, from_phone: &str, to_target: &str, content: &str, reply_to_timestamp: Option<&str>) -> Result<(), TransportError>;

    /// `POST /reactions`. `message_timestamp` must already be ISO-Z with milliseconds.
    async fn add_reaction(&self, phone: &str, chat_id: &str, message_timestamp: &str, emoji: &str) -> Result<(), TransportError>;

    /// `POST /typing`. `duration` is milliseconds.
    async fn send_typing(&self, phone: &str, chat_id: &str, duration_ms: u64) -> Result<(), TransportError>;
}
