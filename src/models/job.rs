//! Job postings.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::{EmployerSummary, TagUniverse};
use crate::errors::AppError;
use crate::validation::Validator;

/// A job posted by an employer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub budget: f64,
    /// Last day of the engagement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<NaiveDate>,
    /// File reference for the requirement document
    pub requirement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_url: Option<String>,
    pub employer: EmployerSummary,
    pub is_draft: bool,
    /// Required skill names, ordered by name
    pub skills: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    pub budget: f64,
    #[serde(default)]
    pub duration: Option<NaiveDate>,
    pub requirement: String,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl CreateJobRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.text("name", &self.name, 30)
            .text("description", &self.description, 250)
            .non_negative("budget", self.budget)
            .text("requirement", &self.requirement, 100);
        if let Some(category) = &self.category {
            v.text("category", category, 30);
        }
        TagUniverse::RequiredSkills.check_names(&mut v, "skills", &self.skills);
        v.finish()
    }
}

/// Partial update. `skills`, when present, replaces the whole required-skill set.
///
/// `category` and `duration` distinguish an absent key (keep) from an explicit `null` (clear).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default, deserialize_with = "present")]
    pub duration: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub requirement: Option<String>,
    #[serde(default)]
    pub is_draft: Option<bool>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
}

impl UpdateJobRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.text("name", name, 30);
        }
        if let Some(description) = &self.description {
            v.text("description", description, 250);
        }
        if let Some(Some(category)) = &self.category {
            v.text("category", category, 30);
        }
        if let Some(budget) = self.budget {
            v.non_negative("budget", budget);
        }
        if let Some(requirement) = &self.requirement {
            v.text("requirement", requirement, 100);
        }
        if let Some(skills) = &self.skills {
            TagUniverse::RequiredSkills.check_names(&mut v, "skills", skills);
        }
        v.finish()
    }
}

/// Wraps a key that is present in the body, `null` included, in `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Age of a posting in whole days.
#[derive(Debug, Clone, Serialize)]
pub struct JobAge {
    pub age: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_tells_null_from_absent() {
        let keep: UpdateJobRequest = serde_json::from_str(r#"{"name": "Logo"}"#).unwrap();
        assert_eq!(keep.category, None);
        assert_eq!(keep.duration, None);

        let clear: UpdateJobRequest =
            serde_json::from_str(r#"{"category": null, "duration": null}"#).unwrap();
        assert_eq!(clear.category, Some(None));
        assert_eq!(clear.duration, Some(None));

        let set: UpdateJobRequest =
            serde_json::from_str(r#"{"category": "Design", "duration": "2026-12-31"}"#).unwrap();
        assert_eq!(set.category, Some(Some("Design".to_string())));
        assert_eq!(set.duration, Some(NaiveDate::from_ymd_opt(2026, 12, 31)));
        assert!(set.validate().is_ok());
    }
}
