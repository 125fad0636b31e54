use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Document error during {stage}: {message}")]
    Document { stage: &'static str, message: String },
}

impl CoreError {
    pub(crate) fn document(stage: &'static str, err: impl std::fmt::Display) -> Self {
        CoreError::Document {
            stage,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
