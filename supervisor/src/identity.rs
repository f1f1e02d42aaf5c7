//! Identity matching: is a given sender one of our own personas?

use crate::domain::{Message, Persona};

fn names_match(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    !a.is_empty() && !b.is_empty() && a.eq_ignore_ascii_case(b)
}

fn persona_full_name(persona: &Persona) -> String {
    format!("{} {}", persona.first_name.trim(), persona.last_name.trim())
        .trim()
        .to_string()
}

/// True if `username`/`first_name`/`last_name` identify one of the configured personas.
/// Case-insensitive; tolerant of a missing last name on either side.
pub fn is_agent(personas: &[Persona], username: &str, first_name: &str, last_name: &str) -> bool {
    let display = if !first_name.trim().is_empty() && !last_name.trim().is_empty() {
        format!("{} {}", first_name.trim(), last_name.trim())
    } else {
        first_name.trim().to_string()
    };

    personas.iter().any(|p| {
        names_match(username, &p.user_name)
            || names_match(&display, &persona_full_name(p))
            || names_match(first_name, &p.first_name)
    })
}

/// Convenience overload against a `Message`'s sender fields.
pub fn is_agent_message(personas: &[Persona], message: &Message) -> bool {
    is_agent(personas, &message.sender_username, &message.sender_first_name, &message.sender_last_name)
}

/// True if a bare display name (as carried on a `Reaction`'s `users` list, which has
/// no separate username/first/last fields) identifies one of the configured personas.
/// Used to filter reaction users down to known agents only, per the data model.
pub fn is_agent_display_name(personas: &[Persona], display_name: &str) -> bool {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return false;
    }
    personas
        .iter()
        .any(|p| names_match(display_name, &p.user_name) || names_match(display_name, &persona_full_name(p)) || names_match(display_name, &p.first_name))
}

/// Returns the matching persona, if any, for the given display name (username or
/// "first last"/"first"), used by `format::format_message_for_prompt` to decide
/// between a `(YOU)` tag (the acting persona) and an `(Agent)` tag (a different one).
pub fn matching_persona<'a>(personas: &'a [Persona], username: &str, first_name: &str, last_name: &str) -> Option<&'a Persona> {
    let display = if !first_name.trim().is_empty() && !last_name.trim().is_empty() {
        format!("{} {}", first_name.trim(), last_name.trim())
    } else {
        first_name.trim().to_string()
    };

    personas.iter().find(|p| {
        names_match(username, &p.user_name)
            || names_match(&display, &persona_full_name(p))
            || names_match(first_name, &p.first_name)
    })
}
