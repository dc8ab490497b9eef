/// Favicon resolution for sidebar entries
///
/// Icons are derived from the link's hostname and never persisted.
use std::collections::HashMap;
use url::Url;

/// Extract the lowercase hostname from a link
///
/// Examples:
/// - https://www.google.com/search → www.google.com
/// - http://localhost:3000 → localhost
/// - not-a-url → None
pub fn extract_hostname(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    let host = url.host_str()?.trim_start_matches('[').trim_end_matches(']');

    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

/// Build the icon-service URL for a hostname
pub fn favicon_url(service: &str, hostname: &str, size: u32) -> String {
    format!("{}?domain={}&sz={}", service, hostname, size)
}

/// Per-session memo of hostname → icon URL
#[derive(Debug, Clone, PartialEq)]
pub struct FaviconCache {
    service: String,
    size: u32,
    by_host: HashMap<String, String>,
}

impl FaviconCache {
    pub fn new(service: &str, size: u32) -> Self {
        FaviconCache {
            service: service.to_string(),
            size,
            by_host: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, link: &str) -> Option<String> {
        let host = extract_hostname(link)?;
        let service = &self.service;
        let size = self.size;

        Some(
            self.by_host
                .entry(host)
                .or_insert_with_key(|host| favicon_url(service, host, size))
                .clone(),
        )
    }
}
