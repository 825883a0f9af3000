//! Address endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{created, success, ApiResult};
use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{Address, CreateAddressRequest};
use crate::AppState;

/// `?search=` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

/// GET /api/address - List all addresses.
pub async fn list_addresses(State(state): State<AppState>) -> ApiResult<Vec<Address>> {
    success(state.repo.list_addresses().await?)
}

/// POST /api/address - Create the caller's address.
pub async fn create_address(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateAddressRequest>,
) -> ApiResult<Address> {
    request.validate()?;
    created(state.repo.create_address(caller.id(), &request).await?)
}

/// GET /api/employers/{id}/address - Address of an employer.
pub async fn employer_address(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Address>> {
    let employer = state
        .repo
        .get_employer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employer {} not found", id)))?;

    success(state.repo.addresses_for_user(&employer.user_id).await?)
}

/// GET /api/job-seekers/{id}/address - Address of a job seeker.
pub async fn job_seeker_address(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Address>> {
    let seeker = state
        .repo
        .get_job_seeker(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job seeker {} not found", id)))?;

    success(state.repo.addresses_for_user(&seeker.user_id).await?)
}

/// GET /api/job-seekers/search-address?search= - Find addresses by country or city.
pub async fn search_addresses(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<Address>> {
    success(state.repo.search_addresses(&query.search).await?)
}
