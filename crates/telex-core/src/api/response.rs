//! The Bot API response envelope.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Extra information attached to some failed responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseParameters {
    /// The group was migrated to a supergroup with this id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
    /// Seconds left to wait before the request can be repeated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Every Bot API answer has this shape: `ok` plus either `result` or an error
/// description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(default = "Option::default")]
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

impl<T> ApiResponse<T> {
    /// Converts the envelope into the carried result or an [`ApiError::Api`].
    pub fn into_result(self) -> ApiResult<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(ApiError::Serialization(
                "response is ok but carries no result".to_string(),
            )),
            (false, _) => Err(ApiError::Api {
                code: self.error_code.unwrap_or_default(),
                description: self
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
                retry_after: self.parameters.and_then(|p| p.retry_after),
            }),
        }
    }
}
