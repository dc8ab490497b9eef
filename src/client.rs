/// Sidebar-side access to the storage service

use crate::error::SidebarError;
use crate::messages::{Request, Response};
use crate::storage::{MemoryBackend, StorageBackend, StorageService};
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/sidebar.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn sendMessage(message: JsValue) -> Result<JsValue, JsValue>;
}

/// The four storage operations the sidebar relies on
#[allow(async_fn_in_trait)]
pub trait LinkStore {
    async fn load_links(&self) -> Result<Vec<String>, SidebarError>;

    async fn save_links(&self, links: &[String]) -> Result<(), SidebarError>;

    async fn load_visibility(&self) -> Result<bool, SidebarError>;

    async fn save_visibility(&self, hidden: bool) -> Result<(), SidebarError>;
}

impl<B: StorageBackend> LinkStore for StorageService<B> {
    async fn load_links(&self) -> Result<Vec<String>, SidebarError> {
        StorageService::load_links(self).await
    }

    async fn save_links(&self, links: &[String]) -> Result<(), SidebarError> {
        StorageService::save_links(self, links).await
    }

    async fn load_visibility(&self) -> Result<bool, SidebarError> {
        StorageService::load_visibility(self).await
    }

    async fn save_visibility(&self, hidden: bool) -> Result<(), SidebarError> {
        StorageService::save_visibility(self, hidden).await
    }
}

/// Talks to the background service over `chrome.runtime.sendMessage`
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RuntimeClient;

impl RuntimeClient {
    async fn request(&self, request: Request) -> Result<Response, SidebarError> {
        let message = request
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| SidebarError::storage("Failed to serialize request", e))?;

        let reply = sendMessage(message)
            .await
            .map_err(|e| SidebarError::storage("Message to background failed", e))?;

        if reply.is_null() || reply.is_undefined() {
            return Err(SidebarError::Storage(format!(
                "No response to {}",
                request.action()
            )));
        }

        serde_wasm_bindgen::from_value(reply)
            .map_err(|e| SidebarError::storage("Failed to parse response", e))
    }
}

impl LinkStore for RuntimeClient {
    async fn load_links(&self) -> Result<Vec<String>, SidebarError> {
        self.request(Request::LoadUserLinks).await?.into_data()
    }

    async fn save_links(&self, links: &[String]) -> Result<(), SidebarError> {
        self.request(Request::SaveUserLinks(links.to_vec())).await?.into_unit()
    }

    async fn load_visibility(&self) -> Result<bool, SidebarError> {
        self.request(Request::LoadSidebarVisibility).await?.into_data()
    }

    async fn save_visibility(&self, hidden: bool) -> Result<(), SidebarError> {
        self.request(Request::SaveSidebarVisibility(hidden)).await?.into_unit()
    }
}

/// Store handed to the sidebar component
#[derive(Clone)]
pub enum SidebarStore {
    /// Extension content script: background service via messages
    Runtime(RuntimeClient),
    /// Standalone preview page: in-process service, nothing persisted
    Local(Rc<StorageService<MemoryBackend>>),
}

impl PartialEq for SidebarStore {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SidebarStore::Runtime(_), SidebarStore::Runtime(_)) => true,
            (SidebarStore::Local(a), SidebarStore::Local(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl LinkStore for SidebarStore {
    async fn load_links(&self) -> Result<Vec<String>, SidebarError> {
        match self {
            SidebarStore::Runtime(client) => client.load_links().await,
            SidebarStore::Local(service) => service.load_links().await,
        }
    }

    async fn save_links(&self, links: &[String]) -> Result<(), SidebarError> {
        match self {
            SidebarStore::Runtime(client) => client.save_links(links).await,
            SidebarStore::Local(service) => service.save_links(links).await,
        }
    }

    async fn load_visibility(&self) -> Result<bool, SidebarError> {
        match self {
            SidebarStore::Runtime(client) => client.load_visibility().await,
            SidebarStore::Local(service) => service.load_visibility().await,
        }
    }

    async fn save_visibility(&self, hidden: bool) -> Result<(), SidebarError> {
        match self {
            SidebarStore::Runtime(client) => client.save_visibility(hidden).await,
            SidebarStore::Local(service) => service.save_visibility(hidden).await,
        }
    }
}
