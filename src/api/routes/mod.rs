pub mod chat;
pub mod documents;
pub mod health;
pub mod sessions;
pub mod tools;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::api::{error::ApiError, middleware::request_logger, state::AppState};
use crate::application::{Interaction, Reply};

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.config.cors.allowed_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_v1_routes())
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/sessions/{id}/document", post(documents::upload_document))
        .route("/sessions/{id}/ocr", post(documents::run_ocr))
        .route("/sessions/{id}/ocr/download", get(documents::download_ocr))
        .route(
            "/sessions/{id}/chat",
            post(chat::chat_handler).delete(chat::clear_chat),
        )
        .route("/sessions/{id}/summary", post(tools::summarize))
        .route("/sessions/{id}/flashcards", post(tools::flashcards))
        .route(
            "/sessions/{id}/practice-questions",
            post(tools::practice_questions),
        )
}

/// Runs one interaction while holding the session lock.
pub(crate) async fn dispatch(
    state: &AppState,
    id: Uuid,
    interaction: Interaction,
) -> Result<Response, ApiError> {
    let session = state.session(id).await?;
    let mut ctx = session.lock().await;
    let reply = state.controller.dispatch(&mut ctx, interaction).await;
    Ok(respond(reply))
}

pub(crate) fn respond(reply: Reply) -> Response {
    let status = match &reply {
        Reply::Failed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Reply::NoDocument { .. } => StatusCode::CONFLICT,
        _ => StatusCode::OK,
    };
    (status, Json(reply)).into_response()
}
