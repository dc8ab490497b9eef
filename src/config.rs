/// Runtime configuration for the sidebar and its storage service

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LINKS_KEY: &str = "sidebar-user-links";
pub const DEFAULT_VISIBILITY_KEY: &str = "sidebar-visibility";
pub const DEFAULT_FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SidebarConfig {
    pub links_key: String,
    pub visibility_key: String,
    pub favicon_service: String,
    pub favicon_size: u32,
    pub retry: RetryPolicy,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        SidebarConfig {
            links_key: DEFAULT_LINKS_KEY.to_string(),
            visibility_key: DEFAULT_VISIBILITY_KEY.to_string(),
            favicon_service: DEFAULT_FAVICON_SERVICE.to_string(),
            favicon_size: 32,
            retry: RetryPolicy::default(),
        }
    }
}

impl SidebarConfig {
    /// Decode a config object handed over from JavaScript.
    ///
    /// `undefined`/`null` and unreadable objects fall back to the defaults.
    pub fn from_js(value: wasm_bindgen::JsValue) -> Self {
        if value.is_null() || value.is_undefined() {
            return SidebarConfig::default();
        }

        serde_wasm_bindgen::from_value(value).unwrap_or_else(|e| {
            log::warn!("Ignoring invalid sidebar config: {:?}", e);
            SidebarConfig::default()
        })
    }
}
