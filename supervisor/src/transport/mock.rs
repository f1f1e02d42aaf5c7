//! Deterministic fake `ChatTransport` for tests: scripted messages, recorded sends.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::Message;
use crate::errors::TransportError;

use super::{ChatTransport, ParticipantsInfo};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Send {
        from_phone: String,
        to_target: String,
        content: String,
        reply_to_timestamp: Option<String>,
    },
    Reaction {
        phone: String,
        chat_id: String,
        message_timestamp: String,
        emoji: String,
    },
    Typing {
        phone: String,
        chat_id: String,
        duration_ms: u64,
    },
}

pub struct MockChatTransport {
    messages: Mutex<Vec<Message>>,
    participants: ParticipantsInfo,
    calls: Mutex<Vec<RecordedCall>>,
    fail_sends: bool,
}

impl MockChatTransport {
    pub fn new(messages: Vec<Message>, participants: ParticipantsInfo) -> Self {
        Self {
            messages: Mutex::new(messages),
            participants,
            calls: Mutex::new(Vec::new()),
            fail_sends: false,
        }
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Appends a message as if freshly posted, for multi-tick poller tests.
    pub fn push_message(&self, message: Message) {
        self.messages.lock().unwrap().push(message);
    }
}

#[async_trait]
impl ChatTransport for MockChatTransport {
    async fn fetch_messages(&self, _phone: &str, _chat_id: &str, limit: u32) -> Result<Vec<Message>, TransportError> {
        let messages = self.messages.lock().unwrap();
        let take = (limit as usize).min(messages.len());
        Ok(messages[messages.len() - take..].to_vec())
    }

    async fn fetch_participants(&self, _phone: &str, _chat_id: &str) -> Result<ParticipantsInfo, TransportError> {
        Ok(self.participants.clone())
    }

    async fn send_message(&self, from_phone: &str, to_target: &str, content: &str, reply_to_timestamp: Option<&str>) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::UnexpectedResponse("mock configured to fail sends".into()));
        }
        self.calls.lock().unwrap().push(RecordedCall::Send {
            from_phone: from_phone.to_string(),
            to_target: to_target.to_string(),
            content: content.to_string(),
            reply_to_timestamp: reply_to_timestamp.map(str::to_string),
        });
        Ok(())
    }

    async fn add_reaction(&self, phone: &str, chat_id: &str, message_timestamp: &str, emoji: &str) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::UnexpectedResponse("mock configured to fail sends".into()));
        }
        self.calls.lock().unwrap().push(RecordedCall::Reaction {
            phone: phone.to_string(),
            chat_id: chat_id.to_string(),
            message_timestamp: message_timestamp.to_string(),
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn send_typing(&self, phone: &str, chat_id: &str, duration_ms: u64) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(RecordedCall::Typing {
            phone: phone.to_string(),
            chat_id: chat_id.to_string(),
            duration_ms,
        });
        Ok(())
    }
}
