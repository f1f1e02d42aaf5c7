//! Message Poller (C1): fetches new messages, dedups against a seen-id ring,
//! marks agent-authored messages pre-processed.

use std::collections::VecDeque;

use crate::domain::{Message, Persona};
use crate::errors::TransportError;
use crate::identity::{is_agent_display_name, is_agent_message};
use crate::transport::ChatTransport;

const SEEN_IDS_RING_CAPACITY: usize = 1000;

/// FIFO ring of the most recently seen message ids, bounded at
/// `SEEN_IDS_RING_CAPACITY`. Oldest ids fall off, so a sufficiently old id can in
/// principle resurface as "new" after ≥1000 distinct ids have been observed.
pub struct SeenIdsRing {
    order: VecDeque<String>,
    capacity: usize,
}

impl SeenIdsRing {
    pub fn new() -> Self {
        Self::with_capacity(SEEN_IDS_RING_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.order.iter().any(|seen| seen == id)
    }

    pub fn insert(&mut self, id: String) {
        if self.order.len() >= self.capacity {
            self.order.pop_front();
        }
        self.order.push_back(id);
    }

    pub fn prime(&mut self, ids: impl IntoIterator<Item = String>) {
        for id in ids {
            self.insert(id);
        }
    }
}

impl Default for SeenIdsRing {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetches up to `fetch_limit` recent messages and returns only the ones not
/// already in `ring`, in the order the transport returned them, updating the ring
/// and marking agent-authored messages `processed=true` as a side effect.
pub async fn poll(
    transport: &dyn ChatTransport,
    phone: &str,
    chat_id: &str,
    fetch_limit: u32,
    ring: &mut SeenIdsRing,
    personas: &[Persona],
) -> Result<Vec<Message>, TransportError> {
    let fetched = transport.fetch_messages(phone, chat_id, fetch_limit).await?;

    let mut new_messages = Vec::new();
    for mut message in fetched {
        if ring.contains(&message.message_id) {
            continue;
        }
        ring.insert(message.message_id.clone());
        if is_agent_message(personas, &message) {
            message.processed = true;
        }
        for reaction in message.reactions.iter_mut() {
            reaction.users.retain(|name| is_agent_display_name(personas, name));
        }
        new_messages.push(message);
    }
    Ok(new_messages)
}
