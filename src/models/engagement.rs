//! Bids, projects and ratings: everything that links a job seeker to a job.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::validation::Validator;

/// A job seeker's offer to do a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: i64,
    pub job_id: i64,
    pub job_name: String,
    pub job_seeker_id: i64,
    pub proposal: String,
    pub amount: f64,
    pub require_days: i64,
    pub milestone: String,
    pub is_shortlisted: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBidRequest {
    pub job: i64,
    pub proposal: String,
    pub amount: f64,
    pub require_days: i64,
    pub milestone: String,
}

impl CreateBidRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.text("proposal", &self.proposal, 150)
            .non_negative("amount", self.amount)
            .text("milestone", &self.milestone, 300);
        if self.require_days < 0 {
            v.add(
                "requireDays",
                "Ensure this value is greater than or equal to 0.",
            );
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBidRequest {
    #[serde(default)]
    pub proposal: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub require_days: Option<i64>,
    #[serde(default)]
    pub milestone: Option<String>,
}

impl UpdateBidRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(proposal) = &self.proposal {
            v.text("proposal", proposal, 150);
        }
        if let Some(amount) = self.amount {
            v.non_negative("amount", amount);
        }
        if let Some(milestone) = &self.milestone {
            v.text("milestone", milestone, 300);
        }
        if matches!(self.require_days, Some(days) if days < 0) {
            v.add(
                "requireDays",
                "Ensure this value is greater than or equal to 0.",
            );
        }
        v.finish()
    }
}

/// Shortlisting view of a bid, as seen by the employer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortlist {
    pub id: i64,
    pub project: String,
    pub job_seeker_id: i64,
    pub is_shortlisted: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortlistRequest {
    pub is_shortlisted: bool,
}

/// An accepted engagement binding one job to one job seeker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub job_id: i64,
    pub job_seeker_id: i64,
    pub employer_id: i64,
    pub is_active: bool,
    pub is_finished: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub job: i64,
    pub job_seeker: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_finished: bool,
}

fn default_true() -> bool {
    true
}

/// An employer's rating of a job seeker for a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: i64,
    pub employer_id: i64,
    pub job_seeker_id: i64,
    pub job_id: i64,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingRequest {
    pub job_seeker: i64,
    pub job: i64,
    pub rating: f64,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl CreateRatingRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.finite("rating", self.rating)
            .optional_text("feedback", self.feedback.as_deref(), 250);
        v.finish()
    }
}
