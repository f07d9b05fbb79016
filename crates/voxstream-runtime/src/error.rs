use thiserror::Error;
use voxstream_blocks::AtlasError;
use voxstream_world::ChunkCoord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("batch cancelled")]
    Cancelled,
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),
    #[error("batch result channel closed")]
    Disconnected,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequencingError {
    #[error("chunk {0} is not ready")]
    NotReady(ChunkCoord),
    #[error("controller has been shut down")]
    ShutDown,
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid texture atlas: {0}")]
    Atlas(#[from] AtlasError),
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
