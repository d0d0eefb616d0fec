pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("executor error: {0}")]
    Executor(String),

    #[error("pool is shut down")]
    PoolClosed,

    #[error("queue is closed")]
    QueueClosed,

    #[error("queue is full")]
    QueueFull,

    #[error("task panicked: {0}")]
    TaskPanicked(String),

    #[error("task cancelled before execution")]
    Cancelled,

    #[error("wait timed out")]
    TimedOut,
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }
}
