//! Checkpoint: the stored state of one thread plus bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::ConversationState;

/// Latest persisted state of a thread.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Id of this write; changes on every `put`.
    pub checkpoint_id: String,
    pub thread_id: String,
    pub state: ConversationState,
    /// Number of writes for this thread, starting at 1.
    pub step: u64,
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(thread_id: impl Into<String>, state: ConversationState, step: u64) -> Self {
        Self {
            checkpoint_id: uuid::Uuid::new_v4().to_string(),
            thread_id: thread_id.into(),
            state,
            step,
            created_at: Utc::now(),
        }
    }
}
