//! Emotion Analyzer (C2): one LLM call classifying every unclassified message in
//! the window, plus an overall group sentiment.

use serde::Deserialize;

use crate::domain::{GroupMetadata, Message, MessageEmotion};
use crate::format::{format_message_for_prompt, FormatOptions};
use crate::llm::LlmClient;
use crate::prompts;

const SYSTEM_PROMPT: &str = "You are an emotion analysis assistant for a group chat supervisor.";

#[derive(Deserialize)]
struct EmotionEntry {
    message_id: String,
    emotion: String,
    justification: String,
}

#[derive(Deserialize)]
struct EmotionResponse {
    message_emotions: Vec<EmotionEntry>,
    group_sentiment: String,
}

/// Fills `message_emotion` on every entry in `history` that doesn't already have
/// one, and returns the group's overall sentiment string. No-ops (without calling
/// the model) if every message is already classified.
pub async fn analyze_emotion(llm: &dyn LlmClient, group: &GroupMetadata, history: &mut [Message], model: &str, temperature: f32) -> String {
    let unclassified_ids: Vec<usize> = history
        .iter()
        .enumerate()
        .filter(|(_, m)| m.message_emotion.is_none())
        .map(|(i, _)| i)
        .collect();

    if unclassified_ids.is_empty() {
        return "neutral".to_string();
    }

    let conversation_history = history
        .iter()
        .map(|m| format_message_for_prompt(m, FormatOptions { include_timestamp: false, include_emotion: false }, &[], None, None))
        .collect::<Vec<_>>()
        .join("\n");

    let unclassified_messages = unclassified_ids
        .iter()
        .map(|&i| format!("[ID: {}] {}: {}", history[i].message_id, history[i].sender_display_name(), history[i].text))
        .collect::<Vec<_>>()
        .join("\n");

    let mut vars = std::collections::HashMap::new();
    vars.insert("group_name", group.group_name.clone());
    vars.insert("topic", group.topic.clone());
    vars.insert("member_count", group.member_count.to_string());
    vars.insert("conversation_history", conversation_history);
    vars.insert("unclassified_messages", unclassified_messages);
    let user_prompt = prompts::render(prompts::EMOTION_ANALYSIS, &vars);

    let mut last_error: Option<String> = None;
    for _attempt in 0..2 {
        match llm.complete(SYSTEM_PROMPT, &user_prompt, model, temperature).await {
            Ok(raw) => match parse_emotion_response(&raw) {
                Ok(parsed) => {
                    apply_emotions(history, &unclassified_ids, &parsed.message_emotions);
                    return parsed.group_sentiment;
                }
                Err(_) => {
                    last_error = None;
                    continue;
                }
            },
            Err(e) => {
                last_error = Some(e.to_string());
                break;
            }
        }
    }

    if let Some(err) = last_error {
        let justification = format!("Analysis failed: {err}");
        let group_sentiment = format!("ERROR: {err}");
        fill_error_emotions(history, &unclassified_ids, &justification);
        return group_sentiment;
    }

    fill_error_emotions(history, &unclassified_ids, "JSON parsing failed");
    "ERROR: Failed to parse LLM response".to_string()
}

fn parse_emotion_response(raw: &str) -> Result<EmotionResponse, serde_json::Error> {
    serde_json::from_str(raw)
}

fn apply_emotions(history: &mut [Message], unclassified_ids: &[usize], entries: &[EmotionEntry]) {
    for &i in unclassified_ids {
        let message_id = &history[i].message_id;
        let found = entries.iter().find(|e| &e.message_id == message_id);
        history[i].message_emotion = Some(match found {
            Some(e) => MessageEmotion {
                emotion: e.emotion.clone(),
                justification: e.justification.clone(),
            },
            None => MessageEmotion::error("LLM did not return emotion for this message"),
        });
    }
}

fn fill_error_emotions(history: &mut [Message], unclassified_ids: &[usize], justification: &str) {
    for &i in unclassified_ids {
        history[i].message_emotion = Some(MessageEmotion::error(justification));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    fn group() -> GroupMetadata {
        GroupMetadata {
            group_id: "g1".into(),
            group_name: "Cohort A".into(),
            topic: "fitness".into(),
            member_count: 3,
        }
    }

    fn msg(id: &str, text: &str) -> Message {
        Message {
            message_id: id.into(),
            sender_id: "u1".into(),
            sender_username: "bob".into(),
            sender_first_name: "".into(),
            sender_last_name: "".into(),
            text: text.into(),
            date: chrono::Utc::now(),
            timestamp: "2025-01-01T00:00:00.000Z".into(),
            reactions: vec![],
            reply_to_message_id: None,
            message_emotion: None,
            sender_personality: None,
            processed: false,
        }
    }

    #[tokio::test]
    async fn no_op_when_already_classified() {
        let llm = MockLlmClient::fixed("should not be called");
        let mut history = vec![msg("1", "hi")];
        history[0].message_emotion = Some(MessageEmotion {
            emotion: "calm".into(),
            justification: "fine".into(),
        });
        let sentiment = analyze_emotion(&llm, &group(), &mut history, "m", 0.0).await;
        assert_eq!(sentiment, "neutral");
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn classifies_unclassified_messages() {
        let llm = MockLlmClient::fixed(
            r#"{"message_emotions":[{"message_id":"1","emotion":"happy","justification":"excited"}],"group_sentiment":"positive"}"#,
        );
        let mut history = vec![msg("1", "yay!")];
        let sentiment = analyze_emotion(&llm, &group(), &mut history, "m", 0.0).await;
        assert_eq!(sentiment, "positive");
        assert_eq!(history[0].message_emotion.as_ref().unwrap().emotion, "happy");
    }

    #[tokio::test]
    async fn retries_once_on_parse_failure_then_succeeds() {
        let llm = MockLlmClient::scripted(vec![
            "not json".into(),
            r#"{"message_emotions":[{"message_id":"1","emotion":"sad","justification":"lost"}],"group_sentiment":"negative"}"#.into(),
        ]);
        let mut history = vec![msg("1", "ugh")];
        let sentiment = analyze_emotion(&llm, &group(), &mut history, "m", 0.0).await;
        assert_eq!(sentiment, "negative");
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn falls_back_to_error_after_second_parse_failure() {
        let llm = MockLlmClient::fixed("not json at all");
        let mut history = vec![msg("1", "ugh")];
        let sentiment = analyze_emotion(&llm, &group(), &mut history, "m", 0.0).await;
        assert_eq!(sentiment, "ERROR: Failed to parse LLM response");
        assert_eq!(history[0].message_emotion.as_ref().unwrap().emotion, "ERROR");
        assert_eq!(history[0].message_emotion.as_ref().unwrap().justification, "JSON parsing failed");
    }

    #[tokio::test]
    async fn missing_emotion_for_id_falls_back_to_error() {
        let llm = MockLlmClient::fixed(r#"{"message_emotions":[],"group_sentiment":"neutral"}"#);
        let mut history = vec![msg("1", "hi")];
        analyze_emotion(&llm, &group(), &mut history, "m", 0.0).await;
        assert_eq!(history[0].message_emotion.as_ref().unwrap().emotion, "ERROR");
    }
}
