use serde::{Deserialize, Serialize};

/// Connection data of a running embedded server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerData {
    pub server_url: String,
    pub app_key: String,
}
