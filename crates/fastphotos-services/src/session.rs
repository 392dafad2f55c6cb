//! Session registry — connected senders, their tokens, and the active sender.

use std::collections::BTreeMap;

use fastphotos_core::SenderId;

/// Per-sender state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub id: SenderId,
    /// Opaque token from the last `newSession`. Never interpreted.
    pub token: Option<String>,
}

/// Tracks connected senders. Ids come from a monotonic counter and are never
/// reused, so the map iterates in connection order.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    next_id: u64,
    entries: BTreeMap<SenderId, SessionEntry>,
    active: Option<SenderId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_sender(&mut self) -> SenderId {
        self.next_id += 1;
        let id = SenderId(self.next_id);
        self.entries.insert(id, SessionEntry { id, token: None });
        id
    }

    /// Drop a sender. Returns how many senders remain connected.
    pub fn unregister_sender(&mut self, id: SenderId) -> usize {
        self.entries.remove(&id);
        if self.active == Some(id) {
            self.active = None;
        }
        self.entries.len()
    }

    /// Make `id` the active sender. Unknown ids are ignored.
    pub fn set_active(&mut self, id: SenderId) -> bool {
        if self.entries.contains_key(&id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn is_active(&self, id: SenderId) -> bool {
        self.active == Some(id)
    }

    pub fn active(&self) -> Option<SenderId> {
        self.active
    }

    pub fn set_token(&mut self, id: SenderId, token: String) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.token = Some(token);
        }
    }

    pub fn clear_token(&mut self, id: SenderId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.token = None;
        }
    }

    pub fn token(&self, id: SenderId) -> Option<&str> {
        self.entries.get(&id).and_then(|e| e.token.as_deref())
    }

    pub fn contains(&self, id: SenderId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Connected senders in connection order.
    pub fn senders(&self) -> impl Iterator<Item = SenderId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
