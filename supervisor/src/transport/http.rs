//! `ChatTransport` over `reqwest`, against the five JSON endpoints in SPEC_FULL §6.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Message, Reaction};
use crate::errors::TransportError;

use super::{ChatTransport, ParticipantsInfo};

pub struct HttpChatTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpChatTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn check_success(resp: reqwest::Response) -> Result<serde_json::Value, TransportError> {
        let status = resp.status();
        let body: serde_json::Value = resp.json().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: body.to_string(),
            });
        }
        let ok = body.get("success").and_then(|v| v.as_bool()).unwrap_or(true);
        if !ok {
            let err = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown transport error")
                .to_string();
            return Err(TransportError::UnexpectedResponse(err));
        }
        Ok(body)
    }
}

#[derive(Deserialize)]
struct WireReactionUser {
    #[serde(default)]
    username: String,
    #[serde(default, rename = "firstName")]
    first_name: String,
    #[serde(default, rename = "lastName")]
    last_name: String,
}

#[derive(Deserialize)]
struct WireReaction {
    emoji: String,
    count: u32,
    #[serde(default)]
    users: Vec<WireReactionUser>,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "senderId")]
    sender_id: String,
    #[serde(default, rename = "senderUsername")]
    sender_username: String,
    #[serde(default, rename = "senderFirstName")]
    sender_first_name: String,
    #[serde(default, rename = "senderLastName")]
    sender_last_name: String,
    text: String,
    date: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    reactions: Vec<WireReaction>,
    #[serde(default, rename = "replyToMessageId")]
    reply_to_message_id: Option<String>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    messages: Vec<WireMessage>,
}

#[derive(Deserialize)]
struct ParticipantsResponse {
    #[serde(rename = "chatTitle")]
    chat_title: String,
    #[serde(default, rename = "chatDescription")]
    chat_description: String,
    #[serde(rename = "participantsCount")]
    participants_count: u32,
}

#[derive(Serialize)]
struct SendContent<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    #[serde(rename = "fromPhone")]
    from_phone: &'a str,
    #[serde(rename = "toTarget")]
    to_target: &'a str,
    content: SendContent<'a>,
    #[serde(rename = "replyToTimestamp", skip_serializing_if = "Option::is_none")]
    reply_to_timestamp: Option<&'a str>,
}

#[derive(Serialize)]
struct ReactionRequest<'a> {
    phone: &'a str,
    #[serde(rename = "chatId")]
    chat_id: &'a str,
    #[serde(rename = "messageTimestamp")]
    message_timestamp: &'a str,
    emoji: &'a str,
}

#[derive(Serialize)]
struct TypingRequest<'a> {
    phone: &'a str,
    #[serde(rename = "chatId")]
    chat_id: &'a str,
    duration: u64,
}

/// Maps one wire message onto the domain `Message`, substituting `UNKNOWN_<date>`
/// for a missing or empty id per the data model's documented fallback.
fn wire_to_message(w: WireMessage) -> Message {
    Message {
        message_id: w.id.filter(|id| !id.is_empty()).unwrap_or_else(|| format!("UNKNOWN_{}", w.date.to_rfc3339())),
        sender_id: w.sender_id,
        sender_username: w.sender_username,
        sender_first_name: w.sender_first_name,
        sender_last_name: w.sender_last_name,
        text: w.text,
        timestamp: crate::time::format_timestamp_millis(w.date),
        date: w.date,
        reactions: w
            .reactions
            .into_iter()
            .map(|r| Reaction {
                emoji: r.emoji,
                count: r.count,
                users: r
                    .users
                    .into_iter()
                    .map(|u| {
                        if !u.username.is_empty() {
                            u.username
                        } else {
                            format!("{} {}", u.first_name, u.last_name).trim().to_string()
                        }
                    })
                    .collect(),
            })
            .collect(),
        reply_to_message_id: w.reply_to_message_id,
        message_emotion: None,
        sender_personality: None,
        processed: false,
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn fetch_messages(&self, phone: &str, chat_id: &str, limit: u32) -> Result<Vec<Message>, TransportError> {
        let url = format!("{}/chat-messages", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("phone", phone), ("chatId", chat_id), ("limit", &limit.to_string())])
            .send()
            .await?;
        let body = Self::check_success(resp).await?;
        let parsed: MessagesResponse = serde_json::from_value(body)
            .map_err(|e| TransportError::UnexpectedResponse(e.to_string()))?;

        Ok(parsed.messages.into_iter().map(wire_to_message).collect())
    }

    async fn fetch_participants(&self, phone: &str, chat_id: &str) -> Result<ParticipantsInfo, TransportError> {
        let url = format!("{}/participants", self.base_url);
        let resp = self.client.get(&url).query(&[("phone", phone), ("chatId", chat_id)]).send().await?;
        let body = Self::check_success(resp).await?;
        let parsed: ParticipantsResponse = serde_json::from_value(body)
            .map_err(|e| TransportError::UnexpectedResponse(e.to_string()))?;
        Ok(ParticipantsInfo {
            chat_title: parsed.chat_title,
            chat_description: parsed.chat_description,
            participants_count: parsed.participants_count,
        })
    }

    async fn send_message(&self, from_phone: &str, to_target: &str, content: &str, reply_to_timestamp: Option<&str>) -> Result<(), TransportError> {
        let url = format!("{}/messages/send", self.base_url);
        let payload = SendMessageRequest {
            from_phone,
            to_target,
            content: SendContent { content_type: "text", value: content },
            reply_to_timestamp,
        };
        let resp = self.client.post(&url).json(&payload).send().await?;
        Self::check_success(resp).await?;
        Ok(())
    }

    async fn add_reaction(&self, phone: &str, chat_id: &str, message_timestamp: &str, emoji: &str) -> Result<(), TransportError> {
        let url = format!("{}/reactions", self.base_url);
        let payload = ReactionRequest {
            phone,
            chat_id,
            message_timestamp,
            emoji,
        };
        let resp = self.client.post(&url).json(&payload).send().await?;
        Self::check_success(resp).await?;
        Ok(())
    }

    async fn send_typing(&self, phone: &str, chat_id: &str, duration_ms: u64) -> Result<(), TransportError> {
        let url = format!("{}/typing", self.base_url);
        let payload = TypingRequest {
            phone,
            chat_id,
            duration: duration_ms,
        };
        let resp = self.client.post(&url).json(&payload).send().await?;
        Self::check_success(resp).await?;
        Ok(())
    }
}
