//! Bids, shortlisting, projects and ratings.

use chrono::Utc;
use sqlx::Row;

use super::jobs::label_count_from_row;
use super::Repository;
use crate::errors::AppError;
use crate::models::{
    Bid, CreateBidRequest, CreateProjectRequest, CreateRatingRequest, LabelCount, Project, Rating,
    Shortlist, UpdateBidRequest,
};

const BID_SELECT: &str = r#"
    SELECT b.id, b.job_id, j.name AS job_name, b.job_seeker_id, b.proposal, b.amount,
           b.require_days, b.milestone, b.is_shortlisted, b.created_at, b.updated_at
    FROM bids b JOIN jobs j ON j.id = b.job_id"#;

const PROJECT_SELECT: &str = r#"
    SELECT id, job_id, job_seeker_id, employer_id, is_active, is_finished, created_at, updated_at
    FROM projects"#;

const RATING_SELECT: &str = r#"
    SELECT id, employer_id, job_seeker_id, job_id, rating, feedback, created_at
    FROM ratings"#;

impl Repository {
    // ==================== BID OPERATIONS ====================

    pub async fn list_bids(&self) -> Result<Vec<Bid>, AppError> {
        let rows = sqlx::query(&format!("{BID_SELECT} ORDER BY b.id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(bid_from_row).collect())
    }

    pub async fn get_bid(&self, id: i64) -> Result<Option<Bid>, AppError> {
        let row = sqlx::query(&format!("{BID_SELECT} WHERE b.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(bid_from_row))
    }

    /// Place a bid on a job for a job seeker.
    pub async fn create_bid(
        &self,
        job_seeker_id: i64,
        request: &CreateBidRequest,
    ) -> Result<Bid, AppError> {
        self.require_job(request.job).await?;

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"INSERT INTO bids (job_id, job_seeker_id, proposal, amount, require_days, milestone,
                                 is_shortlisted, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)"#,
        )
        .bind(request.job)
        .bind(job_seeker_id)
        .bind(request.proposal.trim())
        .bind(request.amount)
        .bind(request.require_days)
        .bind(request.milestone.trim())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!("Job seeker {} bid on job {}", job_seeker_id, request.job);

        self.get_bid(id)
            .await?
            .ok_or_else(|| AppError::Internal("Bid vanished after insert".to_string()))
    }

    pub async fn update_bid(&self, id: i64, request: &UpdateBidRequest) -> Result<Bid, AppError> {
        let existing = self
            .get_bid(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Bid {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let proposal = request
            .proposal
            .as_deref()
            .map(|p| p.trim().to_string())
            .unwrap_or(existing.proposal);
        let milestone = request
            .milestone
            .as_deref()
            .map(|m| m.trim().to_string())
            .unwrap_or(existing.milestone);
        let amount = request.amount.unwrap_or(existing.amount);
        let require_days = request.require_days.unwrap_or(existing.require_days);

        sqlx::query(
            "UPDATE bids SET proposal = ?, amount = ?, require_days = ?, milestone = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&proposal)
        .bind(amount)
        .bind(require_days)
        .bind(&milestone)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Bid {
            proposal,
            amount,
            require_days,
            milestone,
            updated_at: now,
            ..existing
        })
    }

    pub async fn delete_bid(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM bids WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Bid {} not found", id)));
        }
        Ok(())
    }

    /// Mark a bid as shortlisted or not.
    pub async fn set_shortlisted(&self, id: i64, shortlisted: bool) -> Result<Shortlist, AppError> {
        let result = sqlx::query("UPDATE bids SET is_shortlisted = ?, updated_at = ? WHERE id = ?")
            .bind(shortlisted)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Bid {} not found", id)));
        }

        let bid = self
            .get_bid(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Bid {} not found", id)))?;
        Ok(Shortlist::from(bid))
    }

    /// Number of bids per job, labelled by job name.
    pub async fn bids_per_job(&self) -> Result<Vec<LabelCount>, AppError> {
        let rows = sqlx::query(
            r#"SELECT j.name AS label, COUNT(b.id) AS count
               FROM bids b JOIN jobs j ON j.id = b.job_id
               GROUP BY j.id, j.name
               ORDER BY j.id"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(label_count_from_row).collect())
    }

    // ==================== PROJECT OPERATIONS ====================

    pub async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query(&format!("{PROJECT_SELECT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(project_from_row).collect())
    }

    pub async fn projects_for_job_seeker(&self, job_seeker_id: i64) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query(&format!("{PROJECT_SELECT} WHERE job_seeker_id = ? ORDER BY id"))
            .bind(job_seeker_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(project_from_row).collect())
    }

    /// Bind a job to a job seeker. The project's employer is the job's owner.
    ///
    /// Once a project exists the job leaves the available listing for good.
    pub async fn create_project(&self, request: &CreateProjectRequest) -> Result<Project, AppError> {
        let employer_id = self.require_job(request.job).await?;
        self.require_job_seeker(request.job_seeker).await?;

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"INSERT INTO projects (job_id, job_seeker_id, employer_id, is_active, is_finished,
                                     created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(request.job)
        .bind(request.job_seeker)
        .bind(employer_id)
        .bind(request.is_active)
        .bind(request.is_finished)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!(
            "Created project {} binding job {} to job seeker {}",
            id,
            request.job,
            request.job_seeker
        );

        Ok(Project {
            id,
            job_id: request.job,
            job_seeker_id: request.job_seeker,
            employer_id,
            is_active: request.is_active,
            is_finished: request.is_finished,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    // ==================== RATING OPERATIONS ====================

    /// Ratings given by one employer.
    pub async fn ratings_by_employer(&self, employer_id: i64) -> Result<Vec<Rating>, AppError> {
        let rows = sqlx::query(&format!("{RATING_SELECT} WHERE employer_id = ? ORDER BY id"))
            .bind(employer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(rating_from_row).collect())
    }

    pub async fn create_rating(
        &self,
        employer_id: i64,
        request: &CreateRatingRequest,
    ) -> Result<Rating, AppError> {
        self.require_job(request.job).await?;
        self.require_job_seeker(request.job_seeker).await?;

        let now = Utc::now().to_rfc3339();
        let feedback = request
            .feedback
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from);

        let result = sqlx::query(
            "INSERT INTO ratings (employer_id, job_seeker_id, job_id, rating, feedback, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(employer_id)
        .bind(request.job_seeker)
        .bind(request.job)
        .bind(request.rating)
        .bind(&feedback)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Rating {
            id: result.last_insert_rowid(),
            employer_id,
            job_seeker_id: request.job_seeker,
            job_id: request.job,
            rating: request.rating,
            feedback,
            created_at: now,
        })
    }

    /// Owning employer of a job, or NotFound.
    async fn require_job(&self, job_id: i64) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT employer_id FROM jobs WHERE id = ?")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))
    }

    async fn require_job_seeker(&self, job_seeker_id: i64) -> Result<(), AppError> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM job_seekers WHERE id = ?")
            .bind(job_seeker_id)
            .fetch_optional(&self.pool)
            .await?;

        match exists {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!(
                "Job seeker {} not found",
                job_seeker_id
            ))),
        }
    }
}

impl From<Bid> for Shortlist {
    fn from(bid: Bid) -> Self {
        Shortlist {
            id: bid.id,
            project: bid.job_name,
            job_seeker_id: bid.job_seeker_id,
            is_shortlisted: bid.is_shortlisted,
        }
    }
}

fn bid_from_row(row: &sqlx::sqlite::SqliteRow) -> Bid {
    Bid {
        id: row.get("id"),
        job_id: row.get("job_id"),
        job_name: row.get("job_name"),
        job_seeker_id: row.get("job_seeker_id"),
        proposal: row.get("proposal"),
        amount: row.get("amount"),
        require_days: row.get("require_days"),
        milestone: row.get("milestone"),
        is_shortlisted: row.get("is_shortlisted"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn project_from_row(row: &sqlx::sqlite::SqliteRow) -> Project {
    Project {
        id: row.get("id"),
        job_id: row.get("job_id"),
        job_seeker_id: row.get("job_seeker_id"),
        employer_id: row.get("employer_id"),
        is_active: row.get("is_active"),
        is_finished: row.get("is_finished"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn rating_from_row(row: &sqlx::sqlite::SqliteRow) -> Rating {
    Rating {
        id: row.get("id"),
        employer_id: row.get("employer_id"),
        job_seeker_id: row.get("job_seeker_id"),
        job_id: row.get("job_id"),
        rating: row.get("rating"),
        feedback: row.get("feedback"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;

    fn bid_request(job: i64) -> CreateBidRequest {
        CreateBidRequest {
            job,
            proposal: "I can do it".to_string(),
            amount: 90.0,
            require_days: 5,
            milestone: "Draft in 3 days".to_string(),
        }
    }

    #[tokio::test]
    async fn test_bids_per_job_omits_jobs_without_bids() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;
        let seeker = fixtures::seeker(&repo, "sam", &[]).await;
        let busy = fixtures::job(&repo, employer.id, "Busy", &[]).await;
        let quiet = fixtures::job(&repo, employer.id, "Quiet", &[]).await;
        let once = fixtures::job(&repo, employer.id, "Once", &[]).await;

        for _ in 0..2 {
            repo.create_bid(seeker.id, &bid_request(busy.id)).await.unwrap();
        }
        repo.create_bid(seeker.id, &bid_request(once.id)).await.unwrap();

        let counts = repo.bids_per_job().await.unwrap();
        assert_eq!(
            counts,
            vec![
                LabelCount {
                    label: "Busy".to_string(),
                    count: 2
                },
                LabelCount {
                    label: "Once".to_string(),
                    count: 1
                },
            ]
        );
        assert!(counts.iter().all(|c| c.label != quiet.name));
    }

    #[tokio::test]
    async fn test_bid_on_missing_job_is_not_found() {
        let (repo, _dir) = fixtures::repo().await;
        let seeker = fixtures::seeker(&repo, "sam", &[]).await;

        let err = repo.create_bid(seeker.id, &bid_request(42)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_shortlisting_round_trip() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;
        let seeker = fixtures::seeker(&repo, "sam", &[]).await;
        let job = fixtures::job(&repo, employer.id, "Logo", &[]).await;
        let bid = repo.create_bid(seeker.id, &bid_request(job.id)).await.unwrap();
        assert!(!bid.is_shortlisted);

        let shortlist = repo.set_shortlisted(bid.id, true).await.unwrap();
        assert!(shortlist.is_shortlisted);
        assert_eq!(shortlist.project, "Logo");
        assert!(repo.get_bid(bid.id).await.unwrap().unwrap().is_shortlisted);
    }

    #[tokio::test]
    async fn test_project_takes_employer_from_job() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;
        let seeker = fixtures::seeker(&repo, "sam", &[]).await;
        let job = fixtures::job(&repo, employer.id, "Logo", &[]).await;

        let project = fixtures::project(&repo, job.id, seeker.id).await;
        assert_eq!(project.employer_id, employer.id);
        assert_eq!(
            repo.projects_for_job_seeker(seeker.id).await.unwrap().len(),
            1
        );

        let missing = CreateProjectRequest {
            job: job.id,
            job_seeker: seeker.id + 1,
            is_active: true,
            is_finished: false,
        };
        assert!(matches!(
            repo.create_project(&missing).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ratings_are_listed_per_employer() {
        let (repo, _dir) = fixtures::repo().await;
        let acme = fixtures::employer(&repo, "acme").await;
        let other = fixtures::employer(&repo, "other").await;
        let seeker = fixtures::seeker(&repo, "sam", &[]).await;
        let job = fixtures::job(&repo, acme.id, "Logo", &[]).await;

        let request = CreateRatingRequest {
            job_seeker: seeker.id,
            job: job.id,
            rating: 4.5,
            feedback: Some("  ".to_string()),
        };
        let rating = repo.create_rating(acme.id, &request).await.unwrap();
        assert_eq!(rating.feedback, None);

        assert_eq!(repo.ratings_by_employer(acme.id).await.unwrap().len(), 1);
        assert!(repo.ratings_by_employer(other.id).await.unwrap().is_empty());
    }
}
