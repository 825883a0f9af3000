//! Job endpoints: CRUD, the available-jobs listing and search, and job aggregates.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::pagination::{Page, PageQuery, Paginator};
use super::{created, success, ApiResult};
use crate::auth::Caller;
use crate::db::AvailableJobs;
use crate::errors::AppError;
use crate::models::{
    Count, CreateJobRequest, Employer, Job, JobAge, LabelCount, UpdateJobRequest,
};
use crate::AppState;

/// `?search=&page=&page_size=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct JobSearchQuery {
    #[serde(default)]
    pub search: String,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Fill the derived URL fields of a job.
pub(super) fn present_job(state: &AppState, mut job: Job) -> Job {
    job.requirement_url = state.media.resolve(&job.requirement);
    job
}

/// GET /api/jobs - Available jobs, one page at a time. Employers only.
pub async fn list_jobs(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<Job>> {
    caller.employer(&state).await?;
    let paginator = Paginator::from_query(&query, &state.config)?;

    available_page(&state, &AvailableJobs::all(), paginator).await
}

/// GET /api/jobs/search - Available jobs whose name or description contains `search`.
pub async fn search_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobSearchQuery>,
) -> ApiResult<Page<Job>> {
    let paginator = Paginator::new(query.page, query.page_size, &state.config)?;

    available_page(&state, &AvailableJobs::matching(&query.search), paginator).await
}

/// POST /api/jobs - Post a job with its required skills.
pub async fn create_job(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateJobRequest>,
) -> ApiResult<Job> {
    let employer = caller.employer(&state).await?;
    request.validate()?;

    let job = state.repo.create_job(employer.id, &request).await?;
    created(present_job(&state, job))
}

/// GET /api/jobs/{id} - Get a single job. Employers only.
pub async fn get_job(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<Job> {
    caller.employer(&state).await?;
    let job = find_job(&state, id).await?;
    success(present_job(&state, job))
}

/// PUT /api/jobs/{id} - Update one's own job; `skills` replaces the required-skill set.
pub async fn update_job(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(request): Json<UpdateJobRequest>,
) -> ApiResult<Job> {
    let employer = caller.employer(&state).await?;
    let job = find_job(&state, id).await?;
    ensure_posted_by(&job, &employer)?;
    request.validate()?;

    let job = state.repo.update_job(id, &request).await?;
    success(present_job(&state, job))
}

/// DELETE /api/jobs/{id} - Delete one's own job.
pub async fn delete_job(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let employer = caller.employer(&state).await?;
    let job = find_job(&state, id).await?;
    ensure_posted_by(&job, &employer)?;

    state.repo.delete_job(id).await?;
    success(())
}

/// GET /api/jobs/count
pub async fn count_jobs(State(state): State<AppState>) -> ApiResult<Count> {
    let count = state.repo.count_jobs().await?;
    success(Count { count })
}

/// GET /api/jobs/category-counts - Number of jobs per category.
pub async fn category_counts(State(state): State<AppState>) -> ApiResult<Vec<LabelCount>> {
    success(state.repo.category_counts().await?)
}

/// GET /api/jobs/{id}/age - Days since the job was posted.
pub async fn job_age(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<JobAge> {
    match state.repo.job_age(id).await? {
        Some(age) => success(age),
        None => Err(AppError::NotFound(format!("Job {} not found", id))),
    }
}

async fn available_page(
    state: &AppState,
    filter: &AvailableJobs,
    paginator: Paginator,
) -> ApiResult<Page<Job>> {
    let count = state.repo.count_available_jobs(filter).await?;
    let jobs = state
        .repo
        .list_available_jobs(filter, paginator.limit(), paginator.offset())
        .await?;

    let jobs = jobs.into_iter().map(|job| present_job(state, job)).collect();
    success(paginator.page(count, jobs)?)
}

pub(super) async fn find_job(state: &AppState, id: i64) -> Result<Job, AppError> {
    state
        .repo
        .get_job(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))
}

pub(super) fn ensure_posted_by(job: &Job, employer: &Employer) -> Result<(), AppError> {
    if job.employer.id == employer.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the employer who posted this job may change it.".to_string(),
        ))
    }
}
