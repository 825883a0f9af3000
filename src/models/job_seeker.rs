//! Job seeker profile model.

use serde::{Deserialize, Serialize};

use super::{TagUniverse, MAX_PHONE_LENGTH};
use crate::errors::AppError;
use crate::validation::Validator;

/// A job seeker profile with its skill set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSeeker {
    pub id: i64,
    pub user_id: String,
    pub username: String,
    pub education: String,
    pub experience: f64,
    pub phone: String,
    /// Skill names, ordered by name
    pub skills: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobSeekerRequest {
    pub education: String,
    pub experience: f64,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl CreateJobSeekerRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.text("education", &self.education, 250)
            .non_negative("experience", self.experience)
            .max_len("phone", &self.phone, MAX_PHONE_LENGTH);
        TagUniverse::SeekerSkills.check_names(&mut v, "skills", &self.skills);
        v.finish()
    }
}

/// Partial update. `skills`, when present, replaces the whole skill set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobSeekerRequest {
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub experience: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
}

impl UpdateJobSeekerRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(education) = &self.education {
            v.text("education", education, 250);
        }
        if let Some(experience) = self.experience {
            v.non_negative("experience", experience);
        }
        v.optional_text("phone", self.phone.as_deref(), MAX_PHONE_LENGTH);
        if let Some(skills) = &self.skills {
            TagUniverse::SeekerSkills.check_names(&mut v, "skills", skills);
        }
        v.finish()
    }
}
