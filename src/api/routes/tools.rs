use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{error::ApiError, routes::dispatch, state::AppState};
use crate::application::Interaction;
use crate::domain::{Subject, SummaryLength};

#[derive(Debug, Default, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub length: SummaryLength,
}

#[derive(Debug, Default, Deserialize)]
pub struct PracticeQuestionsRequest {
    #[serde(default)]
    pub subject: Subject,
    #[serde(default)]
    pub style_guide: String,
}

pub async fn summarize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SummaryRequest>,
) -> Result<Response, ApiError> {
    dispatch(
        &state,
        id,
        Interaction::Summarize {
            length: request.length,
        },
    )
    .await
}

pub async fn flashcards(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    dispatch(&state, id, Interaction::GenerateFlashcards).await
}

pub async fn practice_questions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PracticeQuestionsRequest>,
) -> Result<Response, ApiError> {
    dispatch(
        &state,
        id,
        Interaction::GeneratePracticeQuestions {
            subject: request.subject,
            style_guide: request.style_guide,
        },
    )
    .await
}
