//! Project endpoints.

use axum::{extract::State, Json};

use super::jobs::{ensure_posted_by, find_job};
use super::{created, success, ApiResult};
use crate::auth::Caller;
use crate::models::{CreateProjectRequest, Project};
use crate::AppState;

/// GET /api/projects - List all projects.
pub async fn list_projects(
    State(state): State<AppState>,
    _caller: Caller,
) -> ApiResult<Vec<Project>> {
    success(state.repo.list_projects().await?)
}

/// POST /api/projects - Award one of the caller's jobs to a job seeker.
///
/// The job drops out of the available listing from then on.
pub async fn create_project(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<Project> {
    let employer = caller.employer(&state).await?;
    let job = find_job(&state, request.job).await?;
    ensure_posted_by(&job, &employer)?;

    let project = state.repo.create_project(&request).await?;
    created(project)
}
