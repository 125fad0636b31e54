use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XhrError {
    #[error("Request failed: {0}")]
    Fetch(#[from] BridgeError),

    #[error("Could not decode {content_type} body: {message}")]
    Decode {
        content_type: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, XhrError>;
