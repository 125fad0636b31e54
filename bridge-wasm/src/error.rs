//! Error types for WebAssembly bridge implementations

use bridge_traits::error::BridgeError;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Result type for WebAssembly bridge operations
pub type WasmResult<T> = Result<T, WasmError>;

/// Errors that can occur in WebAssembly bridge implementations
#[derive(Error, Debug)]
pub enum WasmError {
    /// A browser or host global is missing
    #[error("Not available: {0}")]
    Unavailable(String),

    /// JavaScript error from web-sys or the host
    #[error("JavaScript error in {context}: {message}")]
    JavaScript {
        /// Operation that raised the error
        context: String,
        /// Message extracted from the thrown value
        message: String,
    },

    /// Value could not cross the JS boundary
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl WasmError {
    /// Wrap a thrown JS value with the operation that raised it.
    pub fn js(context: &str, value: JsValue) -> Self {
        WasmError::JavaScript {
            context: context.to_string(),
            message: js_message(&value),
        }
    }
}

impl From<serde_wasm_bindgen::Error> for WasmError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        WasmError::Serialization(err.to_string())
    }
}

impl From<WasmError> for BridgeError {
    fn from(err: WasmError) -> Self {
        match err {
            WasmError::Unavailable(what) => BridgeError::NotAvailable(what),
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}

/// Best-effort message for a thrown JS value.
pub(crate) fn js_message(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        text
    } else if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        error.message().into()
    } else {
        format!("{:?}", value)
    }
}
