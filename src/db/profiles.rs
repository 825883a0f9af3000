//! Employer and job-seeker profiles.

use chrono::Utc;
use sqlx::Row;

use super::tags::{reconcile, tag_names_for};
use super::Repository;
use crate::errors::{is_unique_violation, AppError};
use crate::models::{
    CreateEmployerRequest, CreateJobSeekerRequest, Employer, JobSeeker, TagUniverse,
    UpdateEmployerRequest, UpdateJobSeekerRequest,
};

const EMPLOYER_SELECT: &str = r#"
    SELECT e.id, e.user_id, u.username, e.description, e.phone, e.created_at, e.updated_at
    FROM employers e JOIN users u ON u.id = e.user_id"#;

const SEEKER_SELECT: &str = r#"
    SELECT s.id, s.user_id, u.username, s.education, s.experience, s.phone,
           s.created_at, s.updated_at
    FROM job_seekers s JOIN users u ON u.id = s.user_id"#;

impl Repository {
    // ==================== EMPLOYER OPERATIONS ====================

    /// List all employers.
    pub async fn list_employers(&self) -> Result<Vec<Employer>, AppError> {
        let rows = sqlx::query(&format!("{EMPLOYER_SELECT} ORDER BY e.id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(employer_from_row).collect())
    }

    /// Get an employer by ID.
    pub async fn get_employer(&self, id: i64) -> Result<Option<Employer>, AppError> {
        let row = sqlx::query(&format!("{EMPLOYER_SELECT} WHERE e.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(employer_from_row))
    }

    /// The employer profile of a user, if they have one.
    pub async fn employer_for_user(&self, user_id: &str) -> Result<Option<Employer>, AppError> {
        let row = sqlx::query(&format!("{EMPLOYER_SELECT} WHERE e.user_id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(employer_from_row))
    }

    /// Create the employer profile of a user.
    pub async fn create_employer(
        &self,
        user_id: &str,
        request: &CreateEmployerRequest,
    ) -> Result<Employer, AppError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO employers (user_id, description, phone, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(request.description.trim())
        .bind(request.phone.trim())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await;

        let id = match result {
            Ok(r) => r.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict(
                    "User already has an employer profile".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Created employer {} for user {}", id, user_id);

        self.get_employer(id)
            .await?
            .ok_or_else(|| AppError::Internal("Employer vanished after insert".to_string()))
    }

    /// Update an employer profile.
    pub async fn update_employer(
        &self,
        id: i64,
        request: &UpdateEmployerRequest,
    ) -> Result<Employer, AppError> {
        let existing = self
            .get_employer(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employer {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let description = request
            .description
            .as_deref()
            .map(str::trim)
            .map(String::from)
            .unwrap_or(existing.description);
        let phone = request
            .phone
            .as_deref()
            .map(str::trim)
            .map(String::from)
            .unwrap_or(existing.phone);

        sqlx::query("UPDATE employers SET description = ?, phone = ?, updated_at = ? WHERE id = ?")
            .bind(&description)
            .bind(&phone)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Employer {
            id,
            user_id: existing.user_id,
            username: existing.username,
            description,
            phone,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Delete an employer together with its jobs, projects and ratings.
    pub async fn delete_employer(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM employers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Employer {} not found", id)));
        }
        tracing::info!("Deleted employer {}", id);
        Ok(())
    }

    pub async fn count_employers(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM employers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ==================== JOB SEEKER OPERATIONS ====================

    /// List all job seekers with their skills.
    pub async fn list_job_seekers(&self) -> Result<Vec<JobSeeker>, AppError> {
        let rows = sqlx::query(&format!("{SEEKER_SELECT} ORDER BY s.id"))
            .fetch_all(&self.pool)
            .await?;

        let mut conn = self.pool.acquire().await?;
        let mut seekers = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut seeker = seeker_from_row(row);
            seeker.skills = tag_names_for(&mut conn, TagUniverse::SeekerSkills, seeker.id).await?;
            seekers.push(seeker);
        }
        Ok(seekers)
    }

    /// Get a job seeker by ID.
    pub async fn get_job_seeker(&self, id: i64) -> Result<Option<JobSeeker>, AppError> {
        let row = sqlx::query(&format!("{SEEKER_SELECT} WHERE s.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        self.with_seeker_skills(row).await
    }

    /// The job-seeker profile of a user, if they have one.
    pub async fn job_seeker_for_user(&self, user_id: &str) -> Result<Option<JobSeeker>, AppError> {
        let row = sqlx::query(&format!("{SEEKER_SELECT} WHERE s.user_id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        self.with_seeker_skills(row).await
    }

    /// Create the job-seeker profile of a user together with its skill set.
    pub async fn create_job_seeker(
        &self,
        user_id: &str,
        request: &CreateJobSeekerRequest,
    ) -> Result<JobSeeker, AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO job_seekers (user_id, education, experience, phone, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(request.education.trim())
        .bind(request.experience)
        .bind(request.phone.trim())
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await;

        let id = match result {
            Ok(r) => r.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict(
                    "User already has a job seeker profile".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        reconcile(&mut tx, TagUniverse::SeekerSkills, id, &request.skills, true).await?;
        tx.commit().await?;

        tracing::info!("Created job seeker {} for user {}", id, user_id);

        self.get_job_seeker(id)
            .await?
            .ok_or_else(|| AppError::Internal("Job seeker vanished after insert".to_string()))
    }

    /// Update a job seeker. A present `skills` list replaces the whole skill set.
    pub async fn update_job_seeker(
        &self,
        id: i64,
        request: &UpdateJobSeekerRequest,
    ) -> Result<JobSeeker, AppError> {
        let existing = self
            .get_job_seeker(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job seeker {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let education = request
            .education
            .as_deref()
            .map(str::trim)
            .map(String::from)
            .unwrap_or(existing.education);
        let experience = request.experience.unwrap_or(existing.experience);
        let phone = request
            .phone
            .as_deref()
            .map(str::trim)
            .map(String::from)
            .unwrap_or(existing.phone);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE job_seekers SET education = ?, experience = ?, phone = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&education)
        .bind(experience)
        .bind(&phone)
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let skills = match &request.skills {
            Some(skills) => {
                reconcile(&mut tx, TagUniverse::SeekerSkills, id, skills, false).await?
            }
            None => tag_names_for(&mut tx, TagUniverse::SeekerSkills, id).await?,
        };

        tx.commit().await?;

        Ok(JobSeeker {
            id,
            user_id: existing.user_id,
            username: existing.username,
            education,
            experience,
            phone,
            skills,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Delete a job seeker with its bids, projects and skill memberships.
    pub async fn delete_job_seeker(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM job_seekers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Job seeker {} not found", id)));
        }
        tracing::info!("Deleted job seeker {}", id);
        Ok(())
    }

    pub async fn count_job_seekers(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM job_seekers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn with_seeker_skills(
        &self,
        row: Option<sqlx::sqlite::SqliteRow>,
    ) -> Result<Option<JobSeeker>, AppError> {
        let Some(row) = row else {
            return Ok(None);
        };

        let mut seeker = seeker_from_row(&row);
        let mut conn = self.pool.acquire().await?;
        seeker.skills = tag_names_for(&mut conn, TagUniverse::SeekerSkills, seeker.id).await?;
        Ok(Some(seeker))
    }
}

fn employer_from_row(row: &sqlx::sqlite::SqliteRow) -> Employer {
    Employer {
        id: row.get("id"),
        user_id: row.get("user_id"),
        username: row.get("username"),
        description: row.get("description"),
        phone: row.get("phone"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn seeker_from_row(row: &sqlx::sqlite::SqliteRow) -> JobSeeker {
    JobSeeker {
        id: row.get("id"),
        user_id: row.get("user_id"),
        username: row.get("username"),
        education: row.get("education"),
        experience: row.get("experience"),
        phone: row.get("phone"),
        skills: Vec::new(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;

    #[tokio::test]
    async fn test_one_employer_profile_per_user() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;

        let request = CreateEmployerRequest {
            description: "again".to_string(),
            phone: String::new(),
        };
        let err = repo
            .create_employer(&employer.user_id, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.count_employers().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_seeker_update_without_skills_keeps_them() {
        let (repo, _dir) = fixtures::repo().await;
        let seeker = fixtures::seeker(&repo, "sam", &["rust", "sql"]).await;

        let request = UpdateJobSeekerRequest {
            education: Some("MSc".to_string()),
            ..Default::default()
        };
        let updated = repo.update_job_seeker(seeker.id, &request).await.unwrap();
        assert_eq!(updated.education, "MSc");
        assert_eq!(updated.skills, vec!["rust", "sql"]);

        let reloaded = repo.get_job_seeker(seeker.id).await.unwrap().unwrap();
        assert_eq!(reloaded.skills, vec!["rust", "sql"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_committed_update_reports_stored_skills() {
        let (repo, _dir) = fixtures::repo().await;
        let repo = std::sync::Arc::new(repo);
        let id = fixtures::seeker(&repo, "sam", &["rust"]).await.id;

        for round in 0..10 {
            let skills = UpdateJobSeekerRequest {
                skills: Some(vec![format!("skill-{round}")]),
                ..Default::default()
            };
            let education = UpdateJobSeekerRequest {
                education: Some(format!("Course {round}")),
                ..Default::default()
            };

            let (a, b) = tokio::join!(
                tokio::spawn({
                    let repo = repo.clone();
                    async move { repo.update_job_seeker(id, &skills).await }
                }),
                tokio::spawn({
                    let repo = repo.clone();
                    async move { repo.update_job_seeker(id, &education).await }
                })
            );
            let a = a.unwrap().unwrap();
            let b = b.unwrap().unwrap();

            // Whichever update committed last must describe the stored row
            let stored = repo.get_job_seeker(id).await.unwrap().unwrap();
            let describes =
                |s: &JobSeeker| s.education == stored.education && s.skills == stored.skills;
            assert!(describes(&a) || describes(&b), "round {round}: {stored:?}");
        }
    }

    #[tokio::test]
    async fn test_seeker_update_replaces_skills() {
        let (repo, _dir) = fixtures::repo().await;
        let seeker = fixtures::seeker(&repo, "sam", &["rust", "sql"]).await;

        let request = UpdateJobSeekerRequest {
            skills: Some(vec!["go".to_string()]),
            ..Default::default()
        };
        let updated = repo.update_job_seeker(seeker.id, &request).await.unwrap();
        assert_eq!(updated.skills, vec!["go"]);

        let seeker_for_user = repo
            .job_seeker_for_user(&seeker.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seeker_for_user.skills, vec!["go"]);
    }

    #[tokio::test]
    async fn test_deleting_employer_cascades_to_jobs() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;
        let job = fixtures::job(&repo, employer.id, "Gone", &["rust"]).await;

        repo.delete_employer(employer.id).await.unwrap();

        assert!(repo.get_job(job.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_employer(employer.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
