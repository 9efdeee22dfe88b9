use pure_ide_protocol::ProtocolError;
use pure_ide_tree::TreeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Request to '{endpoint}' failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server answered {status} for '{endpoint}': {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("{0}")]
    Other(String),
}

impl SessionError {
    pub(crate) fn transport(endpoint: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            endpoint: endpoint.to_string(),
            source,
        }
    }
}
