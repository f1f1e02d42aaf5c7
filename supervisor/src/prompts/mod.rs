//! Embedded prompt templates with `{placeholder}` substitution.
//!
//! Templates are baked into the binary via `include_str!` rather than read from a
//! runtime prompts directory, so the crate has no filesystem dependency for them.

use std::collections::HashMap;

macro_rules! template {
    ($name:ident, $file:literal) => {
        pub const $name: &str = include_str!(concat!("templates/", $file));
    };
}

template!(EMOTION_ANALYSIS, "emotion_analysis.txt");
template!(PERSONALITY_TRAIT, "personality_trait.txt");
template!(TRIGGER_ANALYSIS, "trigger_analysis.txt");
template!(DECISION_MAKER, "decision_maker.txt");
template!(TEXT_GENERATOR, "text_generator.txt");
template!(STYLER, "styler.txt");
template!(VALIDATOR, "validator.txt");

/// Substitutes every `{key}` occurrence in `template` with its value from `vars`.
/// A key present in the template but missing from `vars` is left unsubstituted.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in vars {
        rendered = rendered.replace(&format!("{{{key}}}"), value);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_known_placeholders() {
        let mut vars = HashMap::new();
        vars.insert("trait_name", "openness".to_string());
        vars.insert("user_name", "bob".to_string());
        vars.insert("user_messages", "hi there".to_string());
        let rendered = render(PERSONALITY_TRAIT, &vars);
        assert!(rendered.contains("openness"));
        assert!(rendered.contains("bob"));
        assert!(!rendered.contains("{trait_name}"));
    }

    #[test]
    fn all_templates_are_nonempty() {
        for t in [EMOTION_ANALYSIS, PERSONALITY_TRAIT, TRIGGER_ANALYSIS, DECISION_MAKER, TEXT_GENERATOR, STYLER, VALIDATOR] {
            assert!(!t.trim().is_empty());
        }
    }
}
