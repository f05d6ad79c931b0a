//! Identity domain types

use serde::{Deserialize, Serialize};

/// Identity returned by the `/v1/me` probe
///
/// Only the user name is interpreted; everything else the service sends is
/// kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Me {
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
