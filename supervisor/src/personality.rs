//! Personality Analyzer (C3): per-user Big-Five scoring, one independent LLM call
//! per trait, all 5 run concurrently with a per-call timeout.

use std::collections::HashMap;
use std::time::Duration;

use futures::future::join_all;
use serde::Deserialize;

use crate::domain::{Big5, Message, Persona, TraitScore, BIG_FIVE_TRAITS};
use crate::llm::LlmClient;
use crate::memory::PersonalitySnapshot;
use crate::prompts;
use crate::settings::PersonalityAnalysisSettings;

const SYSTEM_PROMPT: &str = "You are a personality-assessment assistant scoring Big-Five traits from chat messages.";
const TRAIT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct TraitResponse {
    score: u8,
    confidence: f64,
    justification: String,
}

/// Per-trait LLM call result; `None` means the call failed or timed out.
async fn analyze_trait(llm: &dyn LlmClient, trait_name: &str, user_name: &str, user_messages: &str, previous: Option<&TraitScore>, model: &str, temperature: f32) -> Option<TraitScore> {
    let mut vars = HashMap::new();
    vars.insert("trait_name", trait_name.to_string());
    vars.insert("user_name", user_name.to_string());
    vars.insert("user_messages", user_messages.to_string());
    vars.insert(
        "previous_analysis",
        previous
            .map(|prev| format!("Previous analysis — score: {} (confidence {:.2}). Justification: {}", prev.score, prev.confidence, prev.justification))
            .unwrap_or_default(),
    );
    let prompt = prompts::render(prompts::PERSONALITY_TRAIT, &vars);

    let call = llm.complete(SYSTEM_PROMPT, &prompt, model, temperature);
    let raw = match tokio::time::timeout(TRAIT_CALL_TIMEOUT, call).await {
        Ok(Ok(raw)) => raw,
        _ => return None,
    };

    let parsed: TraitResponse = serde_json::from_str(&raw).ok()?;
    Some(TraitScore {
        score: parsed.score,
        confidence: parsed.confidence,
        justification: parsed.justification,
        raw_confidence: None,
    })
}

/// Applies the message-count confidence penalty: when `message_count` is below
/// `min_messages_full_confidence`, scales each trait's confidence down and
/// preserves the original in `raw_confidence`.
fn apply_confidence_penalty(big5: &mut Big5, message_count: u32, settings: &PersonalityAnalysisSettings) {
    let penalty = &settings.message_count_confidence_penalty;
    if !penalty.enabled || message_count >= penalty.min_messages_full_confidence {
        return;
    }
    let deficit = (penalty.min_messages_full_confidence - message_count) as f64;
    for score in big5.values_mut() {
        let raw = score.confidence;
        let adjusted = (raw - deficit * penalty.penalty_factor).max(0.0);
        score.raw_confidence = Some(raw);
        score.confidence = adjusted;
    }
}

fn meets_confidence_thresholds(snapshot: &PersonalitySnapshot, settings: &PersonalityAnalysisSettings) -> bool {
    BIG_FIVE_TRAITS.iter().all(|t| {
        let threshold = settings.confidence_thresholds.get(*t).copied().unwrap_or(1.0);
        snapshot.big5.get(*t).map(|s| s.confidence >= threshold).unwrap_or(false)
    })
}

/// Runs the 5 per-trait LLM calls concurrently for one user, applies the
/// confidence penalty, and returns `None` if any trait failed and there's no
/// previous snapshot to fall back to (no partial snapshots are ever produced).
pub async fn analyze_user_personality(
    llm: &dyn LlmClient,
    user_name: &str,
    user_messages: &str,
    message_count: u32,
    previous: Option<&PersonalitySnapshot>,
    settings: &PersonalityAnalysisSettings,
    model: &str,
    temperature: f32,
) -> Option<Big5> {
    if let Some(prev) = previous {
        if settings.stop_reanalysis_when_confident && meets_confidence_thresholds(prev, settings) {
            return Some(prev.big5.clone());
        }
    }

    let futures = BIG_FIVE_TRAITS.iter().map(|trait_name| {
        let previous_score = previous.and_then(|p| p.big5.get(*trait_name));
        analyze_trait(llm, trait_name, user_name, user_messages, previous_score, model, temperature)
    });
    let results = join_all(futures).await;

    let mut big5: Big5 = HashMap::new();
    for (trait_name, result) in BIG_FIVE_TRAITS.iter().zip(results) {
        match result {
            Some(score) => {
                big5.insert(trait_name.to_string(), score);
            }
            None => {
                if let Some(prev_score) = previous.and_then(|p| p.big5.get(*trait_name)) {
                    big5.insert(trait_name.to_string(), prev_score.clone());
                }
            }
        }
    }

    if big5.len() < BIG_FIVE_TRAITS.len() {
        return None;
    }

    if message_count < settings.min_messages_for_analysis {
        return previous.map(|p| p.big5.clone());
    }

    apply_confidence_penalty(&mut big5, message_count, settings);
    Some(big5)
}

/// Attaches `sender_personality` onto every message authored by `user_id`/`user_name`.
pub fn attach_personality_to_messages(history: &mut [Message], user_id: &str, big5: &Big5) {
    for message in history.iter_mut() {
        if message.sender_id == user_id {
            message.sender_personality = Some(big5.clone());
        }
    }
}

/// True if `user` should be skipped entirely for this tick (agents are never scored).
pub fn should_skip_user(personas: &[Persona], username: &str, first_name: &str, last_name: &str) -> bool {
    crate::identity::is_agent(personas, username, first_name, last_name)
}
