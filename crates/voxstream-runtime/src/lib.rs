//! Streaming orchestration: batch pipeline, handoff queue, and render pool.
#![forbid(unsafe_code)]

pub mod batch;
pub mod controller;
pub mod error;
pub mod render;

pub use batch::{BatchContext, BatchOutcome, BatchPhase, CancelCheck, CancelToken, ReadyMesh, run_batch};
pub use controller::{ChunkDiff, StreamStats, StreamingController, desired_set, diff};
pub use error::{GenerationError, InitError, SequencingError};
pub use render::{ChunkRenderer, RenderObjectId, RenderPool};
