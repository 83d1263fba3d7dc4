// Result values handed to callers (UI, scanner, CLI)

use serde::Serialize;

use crate::error::Result;

/// `{ success, message?, data? }`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> OpResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T> From<Result<T>> for OpResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => OpResponse::ok(data),
            Err(err) => OpResponse::failure(err.to_string()),
        }
    }
}
