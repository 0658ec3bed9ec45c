//! Conversation thread model.

use serde::{Deserialize, Serialize};

use threadmem_storage::time_utils;

/// A conversation between one owner (bot/agent account) and one counterpart.
///
/// Threads are never auto-deleted; cleanup may trim their messages and mark
/// them inactive, but the row survives so the id stays resolvable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    /// Deterministic id derived from (owner_id, counterpart_id).
    pub id: String,

    /// Account the agent operates as.
    pub owner_id: String,

    /// The other party in the conversation.
    pub counterpart_id: String,

    /// Agent configuration this thread runs under.
    pub agent_id: String,

    /// Inactive threads are excluded from statistics and skipped by tools.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Unix timestamp in milliseconds when this thread was created
    pub created_at: i64,

    /// Unix timestamp in milliseconds when this thread was last updated
    pub updated_at: i64,
}

fn default_active() -> bool {
    true
}

impl Thread {
    /// Create a new thread with a deterministic ID.
    ///
    /// The ID is derived from `sha256` over the length-prefixed pair, so the
    /// same (owner, counterpart) always maps to the same thread and no
    /// delimiter choice can make two distinct pairs collide.
    pub fn new(owner_id: String, counterpart_id: String, agent_id: String) -> Self {
        let id = Self::derive_id(&owner_id, &counterpart_id);
        let now = time_utils::now_ms();

        Self {
            id,
            owner_id,
            counterpart_id,
            agent_id,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Compute the thread id for an (owner, counterpart) pair without
    /// constructing a thread.
    pub fn derive_id(owner_id: &str, counterpart_id: &str) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update((owner_id.len() as u64).to_le_bytes());
        hasher.update(owner_id.as_bytes());
        hasher.update((counterpart_id.len() as u64).to_le_bytes());
        hasher.update(counterpart_id.as_bytes());
        let hash = hex::encode(hasher.finalize());
        format!("thread-{}", &hash[..16])
    }

    /// Refresh `updated_at` to now.
    #[must_use]
    pub fn touch(mut self) -> Self {
        self.updated_at = time_utils::now_ms();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_id_is_stable() {
        let a = Thread::new("bot-1".into(), "user-7".into(), "agent".into());
        let b = Thread::new("bot-1".into(), "user-7".into(), "other-agent".into());
        assert_eq!(a.id, b.id);
        assert!(a.id.starts_with("thread-"));
    }

    #[test]
    fn test_shifted_boundaries_do_not_collide() {
        // ("ab", "c") and ("a", "bc") concatenate identically; the length
        // prefix must keep them apart.
        assert_ne!(Thread::derive_id("ab", "c"), Thread::derive_id("a", "bc"));
    }

    #[test]
    fn test_new_thread_is_active() {
        let thread = Thread::new("bot".into(), "user".into(), "agent".into());
        assert!(thread.active);
        assert_eq!(thread.created_at, thread.updated_at);
    }
}
