//! Phrase endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use phrase_core::review_patch;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::extract::JsonBody;
use crate::models::*;
use crate::services::generation::clamp_count;
use crate::AppState;

fn not_found() -> ApiError {
    ApiError::NotFound("Phrase not found".to_string())
}

/// Ids that are not UUIDs cannot match a stored phrase.
fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

/// GET /api/phrases
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<PhraseResponse>>> {
    let phrases = state.store.list().await?;
    Ok(Json(phrases.into_iter().map(PhraseResponse::from).collect()))
}

/// GET /api/phrases/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PhraseResponse>> {
    let id = parse_id(&id).ok_or_else(not_found)?;
    let phrase = state.store.get(id).await?.ok_or_else(not_found)?;
    Ok(Json(phrase.into()))
}

/// POST /api/phrases
pub async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<PhraseInput>,
) -> Result<(StatusCode, Json<PhraseResponse>)> {
    let phrase = input
        .into_new_phrase(Utc::now())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let stored = state.store.insert(&phrase).await?;
    tracing::info!(id = %stored.id, german = %stored.german, "Created phrase");

    Ok((StatusCode::CREATED, Json(stored.into())))
}

/// PUT /api/phrases/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdatePhraseRequest>,
) -> Result<Json<PhraseResponse>> {
    let id = parse_id(&id).ok_or_else(not_found)?;
    let patch = request
        .into_patch()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let updated = state.store.update(id, &patch).await?.ok_or_else(not_found)?;
    Ok(Json(updated.into()))
}

/// DELETE /api/phrases/{id}
///
/// Succeeds whether or not the phrase existed.
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    if let Some(id) = parse_id(&id) {
        let removed = state.store.delete(id).await?;
        tracing::debug!(%id, removed, "Deleted phrase");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/phrases/{id}/review
pub async fn review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<ReviewRequest>,
) -> Result<Json<PhraseResponse>> {
    let id = parse_id(&id).ok_or_else(not_found)?;
    let phrase = state.store.get(id).await?.ok_or_else(not_found)?;

    let patch = review_patch(&phrase, request.outcome, Utc::now());
    let updated = state.store.update(id, &patch).await?.ok_or_else(not_found)?;

    tracing::debug!(
        %id,
        outcome = ?request.outcome,
        know_streak = updated.know_streak,
        is_mastered = updated.is_mastered,
        "Reviewed phrase"
    );
    Ok(Json(updated.into()))
}

/// POST /api/phrases/generate
pub async fn generate(
    State(state): State<AppState>,
    body: Option<JsonBody<GenerateRequest>>,
) -> Result<(StatusCode, Json<Vec<PhraseResponse>>)> {
    let request = body.map(|JsonBody(r)| r).unwrap_or_default();
    let count = clamp_count(request.count);
    let level = request.level.unwrap_or_default();

    let saved = state
        .generator
        .generate_and_save(state.store.as_ref(), count, level)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(saved.into_iter().map(PhraseResponse::from).collect()),
    ))
}
