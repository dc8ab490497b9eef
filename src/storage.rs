/// Storage service for the background script
///
/// Owns the persisted link list and visibility flag. Every save is a
/// whole-value replace that completes before the reply is sent.

use crate::config::SidebarConfig;
use crate::error::SidebarError;
use crate::messages::{Request, Response};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use wasm_bindgen::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/background.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;
}

/// Key-value store the service persists into
#[allow(async_fn_in_trait)]
pub trait StorageBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>, SidebarError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), SidebarError>;
}

/// In-process backend, used for previews and tests
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: RefCell<HashMap<String, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend::default()
    }
}

impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>, SidebarError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SidebarError> {
        self.values.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

/// `chrome.storage.sync`, reached through the background JS bridge
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeSyncBackend;

impl StorageBackend for ChromeSyncBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>, SidebarError> {
        let value_js = getStorage(key)
            .await
            .map_err(|e| SidebarError::storage("Failed to get storage", e))?;

        if value_js.is_null() || value_js.is_undefined() {
            return Ok(None);
        }

        serde_wasm_bindgen::from_value(value_js)
            .map(Some)
            .map_err(|e| SidebarError::storage("Failed to parse storage", e))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SidebarError> {
        let value_js = value
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| SidebarError::storage("Failed to serialize storage", e))?;

        setStorage(key, value_js)
            .await
            .map_err(|e| SidebarError::storage("Failed to save storage", e))
    }
}

pub struct StorageService<B> {
    backend: B,
    links_key: String,
    visibility_key: String,
}

impl<B: StorageBackend> StorageService<B> {
    pub fn new(backend: B, config: &SidebarConfig) -> Self {
        StorageService {
            backend,
            links_key: config.links_key.clone(),
            visibility_key: config.visibility_key.clone(),
        }
    }

    pub async fn save_links(&self, links: &[String]) -> Result<(), SidebarError> {
        self.backend.set(&self.links_key, Value::from(links.to_vec())).await?;
        log::debug!("Saved {} links", links.len());
        Ok(())
    }

    pub async fn load_links(&self) -> Result<Vec<String>, SidebarError> {
        match self.backend.get(&self.links_key).await? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                SidebarError::Storage(format!("Stored links are corrupt: {}", e))
            }),
        }
    }

    pub async fn save_visibility(&self, hidden: bool) -> Result<(), SidebarError> {
        self.backend.set(&self.visibility_key, Value::Bool(hidden)).await
    }

    pub async fn load_visibility(&self) -> Result<bool, SidebarError> {
        match self.backend.get(&self.visibility_key).await? {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(hidden)) => Ok(hidden),
            Some(other) => Err(SidebarError::Storage(format!(
                "Stored visibility flag is corrupt: {}",
                other
            ))),
        }
    }

    /// Serve one decoded request
    pub async fn handle(&self, request: Request) -> Response {
        let action = request.action();
        let result = match request {
            Request::SaveUserLinks(links) => self.save_links(&links).await.map(|_| None),
            Request::LoadUserLinks => self.load_links().await.map(|links| Some(Value::from(links))),
            Request::SaveSidebarVisibility(hidden) => self.save_visibility(hidden).await.map(|_| None),
            Request::LoadSidebarVisibility => self.load_visibility().await.map(|hidden| Some(Value::Bool(hidden))),
        };

        match result {
            Ok(Some(data)) => Response::ok_with(data),
            Ok(None) => Response::ok(),
            Err(e) => {
                log::error!("{} failed: {}", action, e);
                Response::failure(&e)
            }
        }
    }

    /// Serve an untyped message; malformed ones never reach the backend
    pub async fn handle_value(&self, message: Value) -> Response {
        match Request::from_value(message) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                log::warn!("Rejected message: {}", e);
                Response::failure(&e)
            }
        }
    }
}
