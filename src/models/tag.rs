//! Skill tags and the universes they live in.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::validation::{Validator, BLANK};

/// Namespace within which a tag name is unique.
///
/// Job-seeker skills and job required-skills are separate tables and never cross-referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagUniverse {
    SeekerSkills,
    RequiredSkills,
}

impl TagUniverse {
    pub fn max_name_length(self) -> usize {
        match self {
            TagUniverse::SeekerSkills => 50,
            TagUniverse::RequiredSkills => 30,
        }
    }

    /// Validate submitted names under `field`, one message per offending entry.
    pub fn check_names(self, v: &mut Validator, field: &str, names: &[String]) {
        let max = self.max_name_length();
        for (i, name) in names.iter().enumerate() {
            let name = name.trim();
            if name.is_empty() {
                v.add(field, format!("Item {}: {}", i, BLANK));
            } else if name.chars().count() > max {
                v.add(
                    field,
                    format!(
                        "Item {}: Ensure this field has no more than {} characters.",
                        i, max
                    ),
                );
            }
        }
    }

    /// Validate a single tag name, e.g. when a skill is created or renamed directly.
    pub fn check_name(self, name: &str) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.text("name", name.trim(), self.max_name_length());
        v.finish()
    }
}

/// A canonical tag row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkillRequest {
    pub name: String,
}
