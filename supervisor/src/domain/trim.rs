//! Single consolidated trim point for `conversation_history`, called once per tick
//! instead of scattered across pipeline stages (see SPEC_FULL Design Notes).

use super::message::Message;

/// Keeps at most `max_messages` most-recent entries, oldest-first order preserved.
pub fn trim_recent_messages(history: &mut Vec<Message>, max_messages: usize) {
    if history.len() > max_messages {
        let drop = history.len() - max_messages;
        history.drain(0..drop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn msg(id: &str) -> Message {
        Message {
            message_id: id.into(),
            sender_id: "1".into(),
            sender_username: "bob".into(),
            sender_first_name: "".into(),
            sender_last_name: "".into(),
            text: id.into(),
            date: Utc::now(),
            timestamp: "2025-01-01T00:00:00.000Z".into(),
            reactions: vec![],
            reply_to_message_id: None,
            message_emotion: None,
            sender_personality: None,
            processed: false,
        }
    }

    #[test]
    fn keeps_most_recent_n() {
        let mut history: Vec<Message> = (0..10).map(|i| msg(&i.to_string())).collect();
        trim_recent_messages(&mut history, 3);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].message_id, "7");
        assert_eq!(history[2].message_id, "9");
    }

    #[test]
    fn no_op_when_under_limit() {
        let mut history: Vec<Message> = (0..2).map(|i| msg(&i.to_string())).collect();
        trim_recent_messages(&mut history, 10);
        assert_eq!(history.len(), 2);
    }
}
