//! Checkpointer trait and CheckpointError.

use async_trait::async_trait;

use crate::memory::checkpoint::Checkpoint;
use crate::state::ConversationState;

/// Error type for checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("thread_id required")]
    ThreadIdRequired,
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("storage: {0}")]
    Storage(String),
}

/// Saves and loads the latest conversation state by thread id.
///
/// **Interaction**: Held by [`ReactAgent`](crate::ReactAgent); `get` decides first-turn
/// seeding, `put` runs after every appended message.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Latest checkpoint for the thread, or `None` when the thread has never been written.
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError>;

    /// Replaces the thread's checkpoint with `state`. Returns the new checkpoint id.
    async fn put(
        &self,
        thread_id: &str,
        state: &ConversationState,
    ) -> Result<String, CheckpointError>;

    /// Convenience: only the state of the latest checkpoint.
    async fn get_state(
        &self,
        thread_id: &str,
    ) -> Result<Option<ConversationState>, CheckpointError> {
        Ok(self.get(thread_id).await?.map(|cp| cp.state))
    }
}
