use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("game service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("game service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Status { .. })
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("player location {0} is not part of the game tree")]
    MissingPlayerNode(String),

    #[error("another game was started before this one finished loading")]
    Superseded,
}
