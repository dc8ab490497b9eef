/// Messages exchanged between the sidebar and the background storage service

use crate::error::SidebarError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request sent over `chrome.runtime.sendMessage`
///
/// Wire form: `{"action": "save-user-links", "data": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "kebab-case")]
pub enum Request {
    SaveUserLinks(Vec<String>),
    LoadUserLinks,
    SaveSidebarVisibility(bool),
    LoadSidebarVisibility,
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::SaveUserLinks(_) => "save-user-links",
            Request::LoadUserLinks => "load-user-links",
            Request::SaveSidebarVisibility(_) => "save-sidebar-visibility",
            Request::LoadSidebarVisibility => "load-sidebar-visibility",
        }
    }

    /// Decode an untyped message, rejecting unknown actions and bad payloads
    pub fn from_value(value: Value) -> Result<Request, SidebarError> {
        serde_json::from_value(value).map_err(|e| SidebarError::InvalidInput(e.to_string()))
    }
}

/// `{success, data?, error?}` reply to a [`Request`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Response {
            success: true,
            ..Response::default()
        }
    }

    pub fn ok_with(data: Value) -> Self {
        Response {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: &SidebarError) -> Self {
        Response {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }

    /// Unwrap an acknowledgement for a save request
    pub fn into_unit(self) -> Result<(), SidebarError> {
        self.check().map(|_| ())
    }

    /// Unwrap the payload of a load request; a missing payload means "unset"
    pub fn into_data<T: DeserializeOwned + Default>(self) -> Result<T, SidebarError> {
        match self.check()? {
            Some(Value::Null) | None => Ok(T::default()),
            Some(data) => serde_json::from_value(data)
                .map_err(|e| SidebarError::Storage(format!("Unexpected response payload: {}", e))),
        }
    }

    fn check(self) -> Result<Option<Value>, SidebarError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(SidebarError::Storage(
                self.error.unwrap_or_else(|| "Unknown storage failure".to_string()),
            ))
        }
    }
}
