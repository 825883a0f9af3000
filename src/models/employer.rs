//! Employer profile model.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::validation::Validator;

pub const MAX_PHONE_LENGTH: usize = 31;

/// An employer profile. Employers post jobs and accept bids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employer {
    pub id: i64,
    pub user_id: String,
    pub username: String,
    pub description: String,
    pub phone: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Employer as embedded in a job listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerSummary {
    pub id: i64,
    pub username: String,
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployerRequest {
    pub description: String,
    #[serde(default)]
    pub phone: String,
}

impl CreateEmployerRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.text("description", &self.description, 250)
            .max_len("phone", &self.phone, MAX_PHONE_LENGTH);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployerRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl UpdateEmployerRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(description) = &self.description {
            v.text("description", description, 250);
        }
        v.optional_text("phone", self.phone.as_deref(), MAX_PHONE_LENGTH);
        v.finish()
    }
}
