use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Bridge command `{command}` failed: {message}")]
    InvokeFailed { command: String, message: String },

    #[error("Redirect response ({status}) carried no location header")]
    MissingLocation { status: u16 },

    #[error("Redirect chain exceeded {0} hops")]
    TooManyRedirects(usize),

    #[error("Request aborted")]
    Aborted,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Build an [`BridgeError::InvokeFailed`] for the given command.
    pub fn invoke_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvokeFailed {
            command: command.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
