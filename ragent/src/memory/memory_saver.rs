//! In-memory checkpointer.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::memory::checkpoint::Checkpoint;
use crate::memory::checkpointer::{CheckpointError, Checkpointer};
use crate::state::ConversationState;

/// Keeps one checkpoint per thread in a sharded map.
///
/// Each `put` holds the shard entry lock for that thread id only, so writes for the same
/// thread are serialized while other threads proceed. Data is lost when dropped.
#[derive(Default)]
pub struct MemorySaver {
    threads: DashMap<String, Checkpoint>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of threads with a checkpoint.
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        if thread_id.is_empty() {
            return Err(CheckpointError::ThreadIdRequired);
        }
        Ok(self.threads.get(thread_id).map(|cp| cp.value().clone()))
    }

    async fn put(
        &self,
        thread_id: &str,
        state: &ConversationState,
    ) -> Result<String, CheckpointError> {
        if thread_id.is_empty() {
            return Err(CheckpointError::ThreadIdRequired);
        }
        let mut entry = self
            .threads
            .entry(thread_id.to_string())
            .or_insert_with(|| Checkpoint::new(thread_id, ConversationState::new(), 0));
        let next = Checkpoint::new(thread_id, state.clone(), entry.step + 1);
        let id = next.checkpoint_id.clone();
        *entry = next;
        Ok(id)
    }
}
