//! Acting user and timestamp passed into every writing operation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Who is acting, and when. Supplied per call; the core has no ambient clock
/// or current-user state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    pub actor_id: Uuid,
    pub at: DateTime<Utc>,
}

impl ActorContext {
    pub fn new(actor_id: Uuid, at: DateTime<Utc>) -> Self {
        Self { actor_id, at }
    }

    /// Actor acting at the current wall-clock time. Used at the HTTP boundary.
    pub fn now(actor_id: Uuid) -> Self {
        Self::new(actor_id, Utc::now())
    }
}
