//! Jobs, categories and the available-jobs listing.

use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqliteConnection};

use super::repository::like_pattern;
use super::tags::{reconcile, tag_names_for};
use super::Repository;
use crate::errors::AppError;
use crate::models::{
    CreateJobRequest, EmployerSummary, Job, JobAge, LabelCount, TagUniverse, UpdateJobRequest,
};

const JOB_SELECT: &str = r#"
    SELECT j.id, j.name, j.description, c.name AS category, j.budget, j.duration,
           j.requirement, j.employer_id, u.username AS employer_username,
           e.phone AS employer_phone, j.is_draft, j.created_at, j.updated_at
    FROM jobs j
    JOIN employers e ON e.id = j.employer_id
    JOIN users u ON u.id = e.user_id
    LEFT JOIN categories c ON c.id = j.category_id"#;

/// Jobs open for bidding: published and never attached to a project.
///
/// A finished project still takes its job off the listing.
const AVAILABLE: &str =
    "j.is_draft = 0 AND NOT EXISTS (SELECT 1 FROM projects p WHERE p.job_id = j.id)";

/// Matches against lowercased copies of name and description, since SQLite `LIKE` only folds ASCII.
const TEXT_FILTER: &str =
    r#" AND (j.name_folded LIKE ? ESCAPE '\' OR j.description_folded LIKE ? ESCAPE '\')"#;

/// The available-jobs set, optionally narrowed by a free-text term.
///
/// The term never widens the set: it is ANDed onto the availability predicate.
#[derive(Debug, Clone, Default)]
pub struct AvailableJobs {
    pattern: Option<String>,
}

impl AvailableJobs {
    pub fn all() -> Self {
        Self::default()
    }

    /// Case-insensitive substring match over name and description. A blank term matches all.
    pub fn matching(term: &str) -> Self {
        let term = term.trim();
        if term.is_empty() {
            return Self::all();
        }
        Self {
            pattern: Some(like_pattern(&term.to_lowercase())),
        }
    }

    fn where_clause(&self) -> String {
        match self.pattern {
            Some(_) => format!("WHERE {AVAILABLE}{TEXT_FILTER}"),
            None => format!("WHERE {AVAILABLE}"),
        }
    }
}

impl Repository {
    // ==================== JOB OPERATIONS ====================

    /// Get a job by ID, drafts included.
    pub async fn get_job(&self, id: i64) -> Result<Option<Job>, AppError> {
        let row = sqlx::query(&format!("{JOB_SELECT} WHERE j.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut conn = self.pool.acquire().await?;
        let job = job_with_skills(&mut conn, &row).await?;
        Ok(Some(job))
    }

    /// Create a job and its required-skill set in one transaction.
    pub async fn create_job(
        &self,
        employer_id: i64,
        request: &CreateJobRequest,
    ) -> Result<Job, AppError> {
        let now = Utc::now().to_rfc3339();
        let name = request.name.trim();
        let description = request.description.trim();
        let mut tx = self.pool.begin().await?;

        let category_id = match &request.category {
            Some(name) => Some(upsert_category(&mut tx, name.trim()).await?),
            None => None,
        };

        let result = sqlx::query(
            r#"INSERT INTO jobs (name, description, name_folded, description_folded, category_id,
                                 budget, duration, requirement, employer_id, is_draft,
                                 created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(name)
        .bind(description)
        .bind(name.to_lowercase())
        .bind(description.to_lowercase())
        .bind(category_id)
        .bind(request.budget)
        .bind(request.duration)
        .bind(request.requirement.trim())
        .bind(employer_id)
        .bind(request.is_draft)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        reconcile(&mut tx, TagUniverse::RequiredSkills, id, &request.skills, true).await?;
        tx.commit().await?;

        tracing::info!("Created job {} for employer {}", id, employer_id);

        self.get_job(id)
            .await?
            .ok_or_else(|| AppError::Internal("Job vanished after insert".to_string()))
    }

    /// Update a job. A present `skills` list replaces the whole required-skill set.
    ///
    /// An explicit `null` category or duration clears it.
    pub async fn update_job(&self, id: i64, request: &UpdateJobRequest) -> Result<Job, AppError> {
        let existing = self
            .get_job(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let trimmed = |value: &Option<String>, current: String| {
            value
                .as_deref()
                .map(|v| v.trim().to_string())
                .unwrap_or(current)
        };
        let name = trimmed(&request.name, existing.name);
        let description = trimmed(&request.description, existing.description);
        let requirement = trimmed(&request.requirement, existing.requirement);
        let budget = request.budget.unwrap_or(existing.budget);
        let duration = request.duration.unwrap_or(existing.duration);
        let is_draft = request.is_draft.unwrap_or(existing.is_draft);

        let mut tx = self.pool.begin().await?;

        let category_id = match &request.category {
            Some(Some(category)) => Some(upsert_category(&mut tx, category.trim()).await?),
            _ => None,
        };

        sqlx::query(
            r#"UPDATE jobs SET name = ?, description = ?, name_folded = ?, description_folded = ?,
                              category_id = CASE WHEN ? THEN ? ELSE category_id END,
                              budget = ?, duration = ?, requirement = ?, is_draft = ?,
                              updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&name)
        .bind(&description)
        .bind(name.to_lowercase())
        .bind(description.to_lowercase())
        .bind(request.category.is_some())
        .bind(category_id)
        .bind(budget)
        .bind(duration)
        .bind(&requirement)
        .bind(is_draft)
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(skills) = &request.skills {
            reconcile(&mut tx, TagUniverse::RequiredSkills, id, skills, false).await?;
        }

        tx.commit().await?;
        tracing::debug!("Updated job {}", id);

        self.get_job(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))
    }

    /// Delete a job with its bids, projects and skill memberships.
    pub async fn delete_job(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Job {} not found", id)));
        }
        tracing::info!("Deleted job {}", id);
        Ok(())
    }

    pub async fn count_jobs(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Size of the available-jobs set.
    pub async fn count_available_jobs(&self, filter: &AvailableJobs) -> Result<i64, AppError> {
        let sql = format!("SELECT COUNT(*) FROM jobs j {}", filter.where_clause());
        let mut query = sqlx::query_scalar::<Sqlite, i64>(&sql);
        if let Some(pattern) = &filter.pattern {
            query = query.bind(pattern).bind(pattern);
        }

        let count = query.fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// One slice of the available-jobs set, ordered by ID.
    pub async fn list_available_jobs(
        &self,
        filter: &AvailableJobs,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, AppError> {
        let sql = format!(
            "{JOB_SELECT} {} ORDER BY j.id LIMIT ? OFFSET ?",
            filter.where_clause()
        );
        let mut query = sqlx::query::<Sqlite>(&sql);
        if let Some(pattern) = &filter.pattern {
            query = query.bind(pattern).bind(pattern);
        }

        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        self.jobs_with_skills(&rows).await
    }

    /// Draft jobs of one employer.
    pub async fn list_draft_jobs(&self, employer_id: i64) -> Result<Vec<Job>, AppError> {
        let rows = sqlx::query(&format!(
            "{JOB_SELECT} WHERE j.is_draft = 1 AND j.employer_id = ? ORDER BY j.id"
        ))
        .bind(employer_id)
        .fetch_all(&self.pool)
        .await?;

        self.jobs_with_skills(&rows).await
    }

    /// Whole days since the job was posted.
    pub async fn job_age(&self, id: i64) -> Result<Option<JobAge>, AppError> {
        let created_at: Option<String> =
            sqlx::query_scalar("SELECT created_at FROM jobs WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(created_at) = created_at else {
            return Ok(None);
        };
        let created = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| AppError::Internal(format!("Bad timestamp on job {}: {}", id, e)))?;
        let age = (Utc::now() - created.with_timezone(&Utc)).num_days();

        Ok(Some(JobAge { age }))
    }

    /// Number of jobs per category. Jobs without a category and empty categories are left out.
    pub async fn category_counts(&self) -> Result<Vec<LabelCount>, AppError> {
        let rows = sqlx::query(
            r#"SELECT c.name AS label, COUNT(j.id) AS count
               FROM jobs j JOIN categories c ON c.id = j.category_id
               GROUP BY c.id, c.name
               ORDER BY c.name"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(label_count_from_row).collect())
    }

    async fn jobs_with_skills(&self, rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Job>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let mut jobs = Vec::with_capacity(rows.len());
        for row in rows {
            jobs.push(job_with_skills(&mut conn, row).await?);
        }
        Ok(jobs)
    }
}

/// Category id for `name`, inserting the category if it is new.
async fn upsert_category(conn: &mut SqliteConnection, name: &str) -> Result<i64, AppError> {
    sqlx::query("INSERT INTO categories (name, created_at) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
        .bind(name)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await?;

    let id = sqlx::query_scalar("SELECT id FROM categories WHERE name = ?")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

async fn job_with_skills(
    conn: &mut SqliteConnection,
    row: &sqlx::sqlite::SqliteRow,
) -> Result<Job, AppError> {
    let id: i64 = row.get("id");
    let skills = tag_names_for(conn, TagUniverse::RequiredSkills, id).await?;

    Ok(Job {
        id,
        name: row.get("name"),
        description: row.get("description"),
        category: row.get("category"),
        budget: row.get("budget"),
        duration: row.get("duration"),
        requirement: row.get("requirement"),
        requirement_url: None,
        employer: EmployerSummary {
            id: row.get("employer_id"),
            username: row.get("employer_username"),
            phone: row.get("employer_phone"),
        },
        is_draft: row.get("is_draft"),
        skills,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

pub(super) fn label_count_from_row(row: &sqlx::sqlite::SqliteRow) -> LabelCount {
    LabelCount {
        label: row.get("label"),
        count: row.get("count"),
    }
}
