use std::error::Error;

#[derive(thiserror::Error, Debug)]
pub enum SshClientError {
    #[error("connection timed out")]
    ConnectionTimeout,
    #[error("authentication rejected for user {0}")]
    AuthenticationFailed(String),
    #[error("remote command exited with status {status}")]
    CommandFailed { status: u32, stderr: String },
    #[error("russh error: {0}")]
    Russh(#[from] russh::Error),
    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync>),
}

impl SshClientError {
    pub fn other<E: Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Other(Box::new(err))
    }
}
