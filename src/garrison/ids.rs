use crate::content::FollowerDbId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Mints follower storage ids. Shared by every garrison in the process.
#[derive(Debug)]
pub struct FollowerIdAllocator {
    next: AtomicU64,
}

impl FollowerIdAllocator {
    /// Seeds the counter past the highest id already persisted.
    pub fn from_max_persisted(max_used: u64) -> Self {
        Self {
            next: AtomicU64::new(max_used.saturating_add(1)),
        }
    }

    pub fn generate(&self) -> FollowerDbId {
        FollowerDbId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    pub fn peek_next(&self) -> FollowerDbId {
        FollowerDbId(self.next.load(Ordering::Relaxed))
    }
}

impl Default for FollowerIdAllocator {
    fn default() -> Self {
        Self::from_max_persisted(0)
    }
}
