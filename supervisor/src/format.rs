//! Renders a `Message` into the single-line prompt format every LLM-facing node uses.
//!
//! Never stored on the `Message` itself — computed fresh at prompt-assembly time so
//! the same message renders differently depending on which persona's prompt it's in.

use crate::domain::{Message, Persona};
use crate::identity::matching_persona;

/// Options controlling which annotations `format_message_for_prompt` includes.
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    pub include_timestamp: bool,
    pub include_emotion: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            include_timestamp: true,
            include_emotion: true,
        }
    }
}

/// Renders one message for inclusion in an LLM prompt.
///
/// `selected_persona`, when given, is the persona whose prompt this is being built
/// for: a sender matching it gets `(YOU)`; a sender matching any other configured
/// persona gets `(Agent)`. `window`, when given, is the message list still in the
/// conversation window, used to resolve `reply_to_message_id` into a quoted snippet.
pub fn format_message_for_prompt(
    message: &Message,
    options: FormatOptions,
    personas: &[Persona],
    selected_persona: Option<&Persona>,
    window: Option<&[Message]>,
) -> String {
    let mut sender = message.sender_display_name();

    if let Some(selected) = selected_persona {
        let is_you = names_match_persona(message, selected);
        if is_you {
            sender.push_str(" (YOU)");
        } else if matching_persona(personas, &message.sender_username, &message.sender_first_name, &message.sender_last_name).is_some() {
            sender.push_str(" (Agent)");
        }
    } else if matching_persona(personas, &message.sender_username, &message.sender_first_name, &message.sender_last_name).is_some() {
        sender.push_str(" (Agent)");
    }

    let mut parts: Vec<String> = Vec::new();
    if options.include_timestamp {
        parts.push(format!("[{}]", message.timestamp));
    }
    parts.push(sender);
    if options.include_emotion {
        if let Some(emotion) = &message.message_emotion {
            parts.push(format!("[{}]", emotion.emotion));
        }
    }

    let header = parts.join(" ");
    let mut rendered = format!("{header}: {}", message.text);

    if let Some(reply_id) = &message.reply_to_message_id {
        if let Some(window) = window {
            if let Some(original) = window.iter().find(|m| &m.message_id == reply_id) {
                let replied_sender = original.sender_display_name();
                rendered.push_str(&format!(" [⤷ Replying to {replied_sender}: \"{}\"]", original.text));
            }
        }
    }

    if !message.reactions.is_empty() {
        let reactions_str = message
            .reactions
            .iter()
            .map(|r| format!("{}×{}", r.emoji, r.count))
            .collect::<Vec<_>>()
            .join(", ");
        rendered.push_str(&format!(" [Reactions: {reactions_str}]"));
    }

    rendered
}

fn names_match_persona(message: &Message, persona: &Persona) -> bool {
    let username = message.sender_username.trim();
    if !username.is_empty() && !persona.user_name.trim().is_empty() {
        return username.eq_ignore_ascii_case(persona.user_name.trim());
    }
    let first = message.sender_first_name.trim();
    let last = message.sender_last_name.trim();
    if !first.is_empty() && !persona.first_name.trim().is_empty() {
        return first.eq_ignore_ascii_case(persona.first_name.trim())
            && (last.is_empty() || persona.last_name.trim().is_empty() || last.eq_ignore_ascii_case(persona.last_name.trim()));
    }
    false
}
