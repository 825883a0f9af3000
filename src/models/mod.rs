//! Data models for the job marketplace.
//!
//! Request bodies validate themselves; response models are what handlers serialize.

mod address;
mod employer;
mod engagement;
mod job;
mod job_seeker;
mod tag;
mod user;

pub use address::*;
pub use employer::*;
pub use engagement::*;
pub use job::*;
pub use job_seeker::*;
pub use tag::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// Plain row count, e.g. `GET /api/jobs/count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Count {
    pub count: i64,
}

/// One group of an aggregate listing: a human-readable label and how many rows fall under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}
