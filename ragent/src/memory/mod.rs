//! # Memory: per-thread checkpoints
//!
//! A [`Checkpointer`] keeps the latest [`ConversationState`](crate::ConversationState) of each
//! thread. The execution loop writes after every transition and reads once at the start of
//! a turn; whether a checkpoint exists decides if the system prompt is seeded.
//!
//! | Type            | Persistence | Use case          |
//! |-----------------|-------------|-------------------|
//! | [`MemorySaver`] | In-memory   | Service, dev, tests |
//!
//! Writes are last-write-wins per thread id. Reads and writes for one thread id never
//! interleave with a concurrent write for the same id; different threads do not contend.

mod checkpoint;
mod checkpointer;
mod memory_saver;

pub use checkpoint::Checkpoint;
pub use checkpointer::{CheckpointError, Checkpointer};
pub use memory_saver::MemorySaver;
