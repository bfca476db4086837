use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoadError>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Schema(#[from] pqload_core::Error),

    #[error(transparent)]
    Io(#[from] pqload_io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("spawn worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("worker {0} panicked")]
    WorkerPanic(usize),

    #[error("queue closed while the producer was still sending")]
    Disconnected,

    #[error("loader already ran (phase {0})")]
    AlreadyRan(String),
}
