use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub user_id: i64,
}
