//! Job seeker endpoints and the job-seeker skill catalogue.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{created, success, ApiResult};
use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{
    Count, CreateJobSeekerRequest, JobSeeker, Project, Skill, SkillRequest, TagUniverse,
    UpdateJobSeekerRequest,
};
use crate::AppState;

/// GET /api/job-seekers - List all job seekers.
pub async fn list_job_seekers(State(state): State<AppState>) -> ApiResult<Vec<JobSeeker>> {
    success(state.repo.list_job_seekers().await?)
}

/// POST /api/job-seekers - Create the caller's job-seeker profile with its skills.
pub async fn create_job_seeker(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateJobSeekerRequest>,
) -> ApiResult<JobSeeker> {
    request.validate()?;
    created(state.repo.create_job_seeker(caller.id(), &request).await?)
}

/// GET /api/job-seekers/{id} - Get a single job seeker.
pub async fn get_job_seeker(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<JobSeeker> {
    match state.repo.get_job_seeker(id).await? {
        Some(seeker) => success(seeker),
        None => Err(AppError::NotFound(format!("Job seeker {} not found", id))),
    }
}

/// PUT /api/job-seekers/{id} - Update one's own profile; `skills` replaces the skill set.
pub async fn update_job_seeker(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(request): Json<UpdateJobSeekerRequest>,
) -> ApiResult<JobSeeker> {
    let seeker = owned_job_seeker(&state, &caller, id).await?;
    request.validate()?;

    success(state.repo.update_job_seeker(seeker.id, &request).await?)
}

/// DELETE /api/job-seekers/{id} - Delete one's own profile.
pub async fn delete_job_seeker(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let seeker = owned_job_seeker(&state, &caller, id).await?;
    state.repo.delete_job_seeker(seeker.id).await?;
    success(())
}

/// GET /api/job-seekers/count
pub async fn count_job_seekers(State(state): State<AppState>) -> ApiResult<Count> {
    let count = state.repo.count_job_seekers().await?;
    success(Count { count })
}

/// GET /api/job-seekers/{id}/projects - Projects a job seeker works on.
pub async fn job_seeker_projects(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Project>> {
    if state.repo.get_job_seeker(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Job seeker {} not found", id)));
    }
    success(state.repo.projects_for_job_seeker(id).await?)
}

// Skill catalogue

/// GET /api/job-seekers/skills
pub async fn list_skills(State(state): State<AppState>) -> ApiResult<Vec<Skill>> {
    success(state.repo.list_skills(TagUniverse::SeekerSkills).await?)
}

/// POST /api/job-seekers/skills - Return the named skill, creating it if new.
pub async fn create_skill(
    State(state): State<AppState>,
    _caller: Caller,
    Json(request): Json<SkillRequest>,
) -> ApiResult<Skill> {
    let skill = state
        .repo
        .get_or_create_skill(TagUniverse::SeekerSkills, &request.name)
        .await?;
    success(skill)
}

/// GET /api/job-seekers/skills/{id}
pub async fn get_skill(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Skill> {
    match state.repo.get_skill(TagUniverse::SeekerSkills, id).await? {
        Some(skill) => success(skill),
        None => Err(AppError::NotFound(format!("Skill {} not found", id))),
    }
}

/// PUT /api/job-seekers/skills/{id} - Rename a skill.
pub async fn update_skill(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<i64>,
    Json(request): Json<SkillRequest>,
) -> ApiResult<Skill> {
    let skill = state
        .repo
        .rename_skill(TagUniverse::SeekerSkills, id, &request.name)
        .await?;
    success(skill)
}

/// DELETE /api/job-seekers/skills/{id}
pub async fn delete_skill(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state
        .repo
        .delete_skill(TagUniverse::SeekerSkills, id)
        .await?;
    success(())
}

async fn owned_job_seeker(
    state: &AppState,
    caller: &Caller,
    id: i64,
) -> Result<JobSeeker, AppError> {
    let seeker = state
        .repo
        .get_job_seeker(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job seeker {} not found", id)))?;

    caller.ensure_owns(&seeker.user_id)?;
    Ok(seeker)
}
