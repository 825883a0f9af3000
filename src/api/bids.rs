//! Bid and shortlisting endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::jobs::{ensure_posted_by, find_job};
use super::{created, success, ApiResult};
use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{
    Bid, CreateBidRequest, LabelCount, Shortlist, ShortlistRequest, UpdateBidRequest,
};
use crate::AppState;

/// GET /api/bids - List all bids.
pub async fn list_bids(State(state): State<AppState>, _caller: Caller) -> ApiResult<Vec<Bid>> {
    success(state.repo.list_bids().await?)
}

/// POST /api/bids - Bid on a job as the calling job seeker.
pub async fn create_bid(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateBidRequest>,
) -> ApiResult<Bid> {
    let seeker = caller.job_seeker(&state).await?;
    request.validate()?;

    created(state.repo.create_bid(seeker.id, &request).await?)
}

/// GET /api/bids/{id} - Get a single bid.
pub async fn get_bid(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<Bid> {
    success(find_bid(&state, id).await?)
}

/// PUT /api/bids/{id} - Revise one's own bid.
pub async fn update_bid(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(request): Json<UpdateBidRequest>,
) -> ApiResult<Bid> {
    let bid = own_bid(&state, &caller, id).await?;
    request.validate()?;

    success(state.repo.update_bid(bid.id, &request).await?)
}

/// DELETE /api/bids/{id} - Withdraw one's own bid.
pub async fn delete_bid(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let bid = own_bid(&state, &caller, id).await?;
    state.repo.delete_bid(bid.id).await?;
    success(())
}

/// GET /api/bids/{id}/shortlist - Shortlisting state of a bid on the caller's job.
pub async fn get_shortlist(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<Shortlist> {
    let bid = bid_on_callers_job(&state, &caller, id).await?;
    success(Shortlist::from(bid))
}

/// PUT /api/bids/{id}/shortlist - Shortlist or un-shortlist a bid on the caller's job.
pub async fn update_shortlist(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(request): Json<ShortlistRequest>,
) -> ApiResult<Shortlist> {
    let bid = bid_on_callers_job(&state, &caller, id).await?;
    success(state.repo.set_shortlisted(bid.id, request.is_shortlisted).await?)
}

/// GET /api/bids/per-job - Number of bids per job.
pub async fn bids_per_job(State(state): State<AppState>) -> ApiResult<Vec<LabelCount>> {
    success(state.repo.bids_per_job().await?)
}

async fn find_bid(state: &AppState, id: i64) -> Result<Bid, AppError> {
    state
        .repo
        .get_bid(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bid {} not found", id)))
}

/// The bid, provided the caller is the job seeker who placed it.
async fn own_bid(state: &AppState, caller: &Caller, id: i64) -> Result<Bid, AppError> {
    let seeker = caller.job_seeker(state).await?;
    let bid = find_bid(state, id).await?;

    if bid.job_seeker_id != seeker.id {
        return Err(AppError::Forbidden(
            "Only the job seeker who placed this bid may change it.".to_string(),
        ));
    }
    Ok(bid)
}

/// The bid, provided the caller is the employer who posted its job.
async fn bid_on_callers_job(state: &AppState, caller: &Caller, id: i64) -> Result<Bid, AppError> {
    let employer = caller.employer(state).await?;
    let bid = find_bid(state, id).await?;
    let job = find_job(state, bid.job_id).await?;

    ensure_posted_by(&job, &employer)?;
    Ok(bid)
}
