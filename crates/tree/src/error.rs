use thiserror::Error;

pub type Result<T> = std::result::Result<T, TreeError>;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error(transparent)]
    Source(#[from] anyhow::Error),

    #[error("Tree node not found: {0}")]
    NodeNotFound(String),

    #[error("{0}")]
    Other(String),
}
