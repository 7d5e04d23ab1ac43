use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{error::ApiError, routes::dispatch, state::AppState};
use crate::application::Interaction;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    dispatch(
        &state,
        id,
        Interaction::Chat {
            message: request.message,
        },
    )
    .await
}

pub async fn clear_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    dispatch(&state, id, Interaction::ClearChat).await
}
