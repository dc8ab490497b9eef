/// Sidebar Links - Chrome Extension sidebar bookmarks
/// Built with Rust + WASM + Yew

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod favicon;
pub mod links;
pub mod messages;
pub mod retry;
pub mod storage;
pub mod transfer;
pub mod ui;

use crate::client::{RuntimeClient, SidebarStore};
use crate::config::SidebarConfig;
use crate::error::SidebarError;
use crate::messages::Response;
use crate::storage::{ChromeSyncBackend, MemoryBackend, StorageService};
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

const ROOT_ELEMENT_ID: &str = "sidebar-links-root";

// Import JS bridge functions
#[wasm_bindgen(module = "/background.js")]
extern "C" {
    fn listenForMessages(handler: &Closure<dyn Fn(JsValue) -> js_sys::Promise>);
}

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Mount the sidebar in a content script, persisting via the background
#[wasm_bindgen]
pub fn start_sidebar(config: JsValue) -> Result<(), JsValue> {
    mount(SidebarStore::Runtime(RuntimeClient), SidebarConfig::from_js(config))
}

/// Mount the sidebar on a plain page with an in-memory store
#[wasm_bindgen]
pub fn start_sidebar_preview(config: JsValue) -> Result<(), JsValue> {
    let config = SidebarConfig::from_js(config);
    let service = StorageService::new(MemoryBackend::new(), &config);
    mount(SidebarStore::Local(Rc::new(service)), config)
}

fn mount(store: SidebarStore, config: SidebarConfig) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("No document to mount the sidebar in"))?;

    if document.get_element_by_id(ROOT_ELEMENT_ID).is_some() {
        log::warn!("Sidebar already mounted");
        return Ok(());
    }

    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("Document has no body"))?;
    let root = document.create_element("div")?;
    root.set_id(ROOT_ELEMENT_ID);
    body.append_child(&root)?;

    yew::Renderer::<ui::sidebar::Sidebar>::with_root_and_props(
        root,
        ui::sidebar::SidebarProps { store, config },
    )
    .render();
    Ok(())
}

/// Serve the message contract from the background script
///
/// Registers a `chrome.runtime.onMessage` listener that answers every
/// message through a `BackgroundService` built from `config`.
#[wasm_bindgen]
pub fn start_background(config: JsValue) {
    BackgroundService::new(config).listen();
}

/// Storage service owned by the background script
#[wasm_bindgen]
pub struct BackgroundService {
    service: Rc<StorageService<ChromeSyncBackend>>,
}

#[wasm_bindgen]
impl BackgroundService {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> BackgroundService {
        let config = SidebarConfig::from_js(config);
        log::info!(
            "Background storage ready (keys: {}, {})",
            config.links_key,
            config.visibility_key
        );
        BackgroundService {
            service: Rc::new(StorageService::new(ChromeSyncBackend, &config)),
        }
    }

    /// Answer runtime messages for the lifetime of the background page
    pub fn listen(&self) {
        let service = self.service.clone();
        let handler = Closure::<dyn Fn(JsValue) -> js_sys::Promise>::new(move |message: JsValue| {
            respond(service.clone(), message)
        });

        listenForMessages(&handler);
        log::info!("Listening for sidebar messages");
        // The listener lives as long as the page
        handler.forget();
    }

    /// Answer one runtime message; the promise always resolves to `{success, ...}`
    pub fn handle(&self, message: JsValue) -> js_sys::Promise {
        respond(self.service.clone(), message)
    }
}

fn respond(service: Rc<StorageService<ChromeSyncBackend>>, message: JsValue) -> js_sys::Promise {
    wasm_bindgen_futures::future_to_promise(async move {
        let response = match serde_wasm_bindgen::from_value::<serde_json::Value>(message) {
            Ok(value) => service.handle_value(value).await,
            Err(e) => Response::failure(&SidebarError::InvalidInput(e.to_string())),
        };

        response
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    })
}
