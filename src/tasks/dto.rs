use serde::{Deserialize, Serialize};

/// Body of `POST /tasks`. Unknown fields (including any `user_id`) are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    pub status: Option<String>,
}

/// Body of `PATCH /tasks/:id`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
