//! Employer endpoints, including ratings and the employer's drafts.

use axum::{
    extract::{Path, State},
    Json,
};

use super::jobs::present_job;
use super::{created, success, ApiResult};
use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{
    Count, CreateEmployerRequest, CreateRatingRequest, Employer, Job, Rating,
    UpdateEmployerRequest,
};
use crate::AppState;

/// GET /api/employers - List all employers.
pub async fn list_employers(State(state): State<AppState>) -> ApiResult<Vec<Employer>> {
    success(state.repo.list_employers().await?)
}

/// POST /api/employers - Create the caller's employer profile.
pub async fn create_employer(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateEmployerRequest>,
) -> ApiResult<Employer> {
    request.validate()?;
    created(state.repo.create_employer(caller.id(), &request).await?)
}

/// GET /api/employers/{id} - Get a single employer.
pub async fn get_employer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Employer> {
    match state.repo.get_employer(id).await? {
        Some(employer) => success(employer),
        None => Err(AppError::NotFound(format!("Employer {} not found", id))),
    }
}

/// PUT /api/employers/{id} - Update one's own employer profile.
pub async fn update_employer(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(request): Json<UpdateEmployerRequest>,
) -> ApiResult<Employer> {
    let employer = owned_employer(&state, &caller, id).await?;
    request.validate()?;

    success(state.repo.update_employer(employer.id, &request).await?)
}

/// DELETE /api/employers/{id} - Delete one's own employer profile.
pub async fn delete_employer(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let employer = owned_employer(&state, &caller, id).await?;
    state.repo.delete_employer(employer.id).await?;
    success(())
}

/// GET /api/employers/count
pub async fn count_employers(State(state): State<AppState>) -> ApiResult<Count> {
    let count = state.repo.count_employers().await?;
    success(Count { count })
}

/// GET /api/employers/ratings - Ratings given by the calling employer.
pub async fn list_ratings(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Vec<Rating>> {
    let employer = caller.employer(&state).await?;
    success(state.repo.ratings_by_employer(employer.id).await?)
}

/// POST /api/employers/ratings - Rate a job seeker.
pub async fn create_rating(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateRatingRequest>,
) -> ApiResult<Rating> {
    let employer = caller.employer(&state).await?;
    request.validate()?;

    created(state.repo.create_rating(employer.id, &request).await?)
}

/// GET /api/employers/drafts - The calling employer's unpublished jobs.
pub async fn list_drafts(State(state): State<AppState>, caller: Caller) -> ApiResult<Vec<Job>> {
    let employer = caller.employer(&state).await?;
    let drafts = state.repo.list_draft_jobs(employer.id).await?;

    success(drafts.into_iter().map(|job| present_job(&state, job)).collect())
}

async fn owned_employer(state: &AppState, caller: &Caller, id: i64) -> Result<Employer, AppError> {
    let employer = state
        .repo
        .get_employer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employer {} not found", id)))?;

    caller.ensure_owns(&employer.user_id)?;
    Ok(employer)
}
