//! Tauri host bridge for WebAssembly pages.
//!
//! Calls `window.__TAURI__.core.invoke(command, args)`, which requires the
//! Tauri app to be built with `app.withGlobalTauri` enabled. Arguments are
//! serialized as plain JSON-compatible objects so the command handler
//! receives `localRequest` exactly as it would from JavaScript.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    HostInvoker, InvokeArgs, LocalResponse,
};
use js_sys::Reflect;
use serde::Serialize;
use tracing::debug;
use wasm_bindgen::prelude::*;

use crate::error::{js_message, WasmError};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "core"], js_name = invoke, catch)]
    async fn tauri_invoke(command: &str, args: JsValue) -> Result<JsValue, JsValue>;
}

/// [`HostInvoker`] over the Tauri global API.
#[derive(Debug, Clone, Copy)]
pub struct TauriInvoker;

impl TauriInvoker {
    /// Check that the Tauri global API is present.
    pub fn new() -> BridgeResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| BridgeError::NotAvailable("window".to_string()))?;
        let core = ["__TAURI__", "core", "invoke"]
            .iter()
            .try_fold(JsValue::from(window), |target, key| {
                Reflect::get(&target, &JsValue::from_str(key))
                    .ok()
                    .filter(|value| !value.is_undefined() && !value.is_null())
            });

        match core {
            Some(invoke) if invoke.is_function() => Ok(Self),
            _ => Err(WasmError::Unavailable(
                "window.__TAURI__.core.invoke (enable app.withGlobalTauri)".to_string(),
            )
            .into()),
        }
    }
}

#[async_trait(?Send)]
impl HostInvoker for TauriInvoker {
    async fn invoke(&self, command: &str, args: InvokeArgs) -> BridgeResult<LocalResponse> {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let js_args = args.serialize(&serializer).map_err(WasmError::from)?;

        debug!(command, uri = %args.local_request.uri, "Invoking Tauri command");
        let value = tauri_invoke(command, js_args)
            .await
            .map_err(|err| BridgeError::invoke_failed(command, js_message(&err)))?;

        serde_wasm_bindgen::from_value(value)
            .map_err(|err| BridgeError::invoke_failed(command, format!("invalid response: {}", err)))
    }
}
