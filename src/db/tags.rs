//! Tag-set reconciliation.
//!
//! Jobs and job seekers own a set of skill tags. A create or update request submits a list of
//! free-text names; [`reconcile`] maps each name onto exactly one canonical tag row (creating it
//! if needed) and makes the owner's membership set equal to the submitted names.
//!
//! Callers run it on a connection that is inside a transaction together with the owner's scalar
//! write, so readers never see a cleared-but-not-repopulated tag set and any failure rolls the
//! whole request back.

use chrono::Utc;
use sqlx::{Row, SqliteConnection};

use super::Repository;
use crate::errors::{is_unique_violation, AppError};
use crate::models::{Skill, TagUniverse};
use crate::validation::Validator;

/// Table layout backing one tag universe.
struct TagTables {
    tags: &'static str,
    memberships: &'static str,
    owner_column: &'static str,
}

fn tables(universe: TagUniverse) -> TagTables {
    match universe {
        TagUniverse::SeekerSkills => TagTables {
            tags: "skills",
            memberships: "job_seeker_skills",
            owner_column: "job_seeker_id",
        },
        TagUniverse::RequiredSkills => TagTables {
            tags: "required_skills",
            memberships: "job_required_skills",
            owner_column: "job_id",
        },
    }
}

/// Make `owner_id`'s tag membership equal the set of names in `submitted`.
///
/// When `is_new` is false the existing memberships are detached first; tag rows themselves are
/// never deleted. Duplicate names collapse to a single membership. An empty list leaves the owner
/// without tags. Returns the resulting tag names ordered by name.
pub async fn reconcile(
    conn: &mut SqliteConnection,
    universe: TagUniverse,
    owner_id: i64,
    submitted: &[String],
    is_new: bool,
) -> Result<Vec<String>, AppError> {
    let mut v = Validator::new();
    universe.check_names(&mut v, "skills", submitted);
    v.finish()?;

    let t = tables(universe);

    if !is_new {
        let clear = format!("DELETE FROM {} WHERE {} = ?", t.memberships, t.owner_column);
        sqlx::query(&clear)
            .bind(owner_id)
            .execute(&mut *conn)
            .await?;
    }

    let attach = format!(
        "INSERT OR IGNORE INTO {} ({}, skill_id) VALUES (?, ?)",
        t.memberships, t.owner_column
    );
    for name in submitted {
        let tag_id = lookup_or_create(&mut *conn, universe, name.trim()).await?;
        sqlx::query(&attach)
            .bind(owner_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }

    tag_names_for(conn, universe, owner_id).await
}

/// Find the tag named `name`, inserting it if absent.
///
/// Two writers may race to create the same new name; the UNIQUE constraint rejects the loser,
/// which then finds the winner's row on the second lookup.
pub async fn lookup_or_create(
    conn: &mut SqliteConnection,
    universe: TagUniverse,
    name: &str,
) -> Result<i64, AppError> {
    let t = tables(universe);
    let select = format!("SELECT id FROM {} WHERE name = ?", t.tags);
    let insert = format!("INSERT INTO {} (name, created_at) VALUES (?, ?)", t.tags);

    let mut retried = false;
    loop {
        let existing: Option<i64> = sqlx::query_scalar(&select)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        if let Some(id) = existing {
            return Ok(id);
        }

        let inserted = sqlx::query(&insert)
            .bind(name)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *conn)
            .await;

        match inserted {
            Ok(result) => {
                tracing::debug!("Created tag {:?} in {}", name, t.tags);
                return Ok(result.last_insert_rowid());
            }
            Err(e) if is_unique_violation(&e) && !retried => {
                tracing::debug!("Tag {:?} created concurrently, retrying lookup", name);
                retried = true;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Names of the tags attached to `owner_id`, ordered by name.
pub async fn tag_names_for(
    conn: &mut SqliteConnection,
    universe: TagUniverse,
    owner_id: i64,
) -> Result<Vec<String>, AppError> {
    let t = tables(universe);
    let sql = format!(
        "SELECT t.name FROM {} t JOIN {} m ON m.skill_id = t.id WHERE m.{} = ? ORDER BY t.name",
        t.tags, t.memberships, t.owner_column
    );

    let names = sqlx::query_scalar(&sql)
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(names)
}

impl Repository {
    // ==================== SKILL OPERATIONS ====================

    /// List every tag of a universe.
    pub async fn list_skills(&self, universe: TagUniverse) -> Result<Vec<Skill>, AppError> {
        let sql = format!("SELECT id, name FROM {} ORDER BY name", tables(universe).tags);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(skill_from_row).collect())
    }

    /// Get a tag by ID.
    pub async fn get_skill(&self, universe: TagUniverse, id: i64) -> Result<Option<Skill>, AppError> {
        let sql = format!("SELECT id, name FROM {} WHERE id = ?", tables(universe).tags);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(skill_from_row))
    }

    /// Return the tag with this name, creating it if absent.
    pub async fn get_or_create_skill(
        &self,
        universe: TagUniverse,
        name: &str,
    ) -> Result<Skill, AppError> {
        universe.check_name(name)?;

        let name = name.trim();
        let mut conn = self.pool.acquire().await?;
        let id = lookup_or_create(&mut conn, universe, name).await?;

        Ok(Skill {
            id,
            name: name.to_string(),
        })
    }

    /// Rename a tag. The new name must not already be taken in the universe.
    pub async fn rename_skill(
        &self,
        universe: TagUniverse,
        id: i64,
        name: &str,
    ) -> Result<Skill, AppError> {
        universe.check_name(name)?;

        let name = name.trim();
        let sql = format!("UPDATE {} SET name = ? WHERE id = ?", tables(universe).tags);
        let result = sqlx::query(&sql)
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(r) if r.rows_affected() == 0 => {
                Err(AppError::NotFound(format!("Skill {} not found", id)))
            }
            Ok(_) => Ok(Skill {
                id,
                name: name.to_string(),
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(AppError::field("name", "skill with this name already exists."))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a tag; memberships referencing it go with it.
    pub async fn delete_skill(&self, universe: TagUniverse, id: i64) -> Result<(), AppError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", tables(universe).tags);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Skill {} not found", id)));
        }
        Ok(())
    }
}

fn skill_from_row(row: &sqlx::sqlite::SqliteRow) -> Skill {
    Skill {
        id: row.get("id"),
        name: row.get("name"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;
    use crate::models::UpdateJobRequest;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    async fn tag_rows_named(repo: &Repository, universe: TagUniverse, name: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE name = ?", tables(universe).tags);
        sqlx::query_scalar(&sql)
            .bind(name)
            .fetch_one(&repo.pool)
            .await
            .unwrap()
    }

    async fn tag_row_count(repo: &Repository, universe: TagUniverse) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {}", tables(universe).tags);
        sqlx::query_scalar(&sql).fetch_one(&repo.pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_fresh_job_gets_submitted_tags() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;

        let job = fixtures::job(&repo, employer.id, "API work", &["python", "sql"]).await;

        assert_eq!(job.skills, names(&["python", "sql"]));
        assert_eq!(tag_row_count(&repo, TagUniverse::RequiredSkills).await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_names_collapse() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;

        let job = fixtures::job(&repo, employer.id, "Dup", &["python", "python"]).await;

        assert_eq!(job.skills, names(&["python"]));
        assert_eq!(
            tag_rows_named(&repo, TagUniverse::RequiredSkills, "python").await,
            1
        );
    }

    #[tokio::test]
    async fn test_update_replaces_memberships_but_keeps_tag_rows() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;
        let job = fixtures::job(&repo, employer.id, "Swap", &["python", "sql"]).await;

        let mut conn = repo.pool.acquire().await.unwrap();
        let result = reconcile(
            &mut conn,
            TagUniverse::RequiredSkills,
            job.id,
            &names(&["go"]),
            false,
        )
        .await
        .unwrap();

        assert_eq!(result, names(&["go"]));
        for orphan in ["python", "sql"] {
            assert_eq!(
                tag_rows_named(&repo, TagUniverse::RequiredSkills, orphan).await,
                1
            );
        }
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;
        let job = fixtures::job(&repo, employer.id, "Idem", &[]).await;
        let submitted = names(&["rust", "tokio", "rust", "axum"]);

        let mut conn = repo.pool.acquire().await.unwrap();
        let once = reconcile(&mut conn, TagUniverse::RequiredSkills, job.id, &submitted, false)
            .await
            .unwrap();
        let twice = reconcile(&mut conn, TagUniverse::RequiredSkills, job.id, &submitted, false)
            .await
            .unwrap();

        assert_eq!(once, twice);
        assert_eq!(once, names(&["axum", "rust", "tokio"]));
        assert_eq!(tag_row_count(&repo, TagUniverse::RequiredSkills).await, 3);
    }

    #[tokio::test]
    async fn test_empty_list_clears_all_tags() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;
        let job = fixtures::job(&repo, employer.id, "Clear", &["python"]).await;

        let mut conn = repo.pool.acquire().await.unwrap();
        let result = reconcile(&mut conn, TagUniverse::RequiredSkills, job.id, &[], false)
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(
            tag_rows_named(&repo, TagUniverse::RequiredSkills, "python").await,
            1
        );
    }

    #[tokio::test]
    async fn test_names_shared_across_owners_use_one_row() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;

        let a = fixtures::job(&repo, employer.id, "A", &["python", "sql"]).await;
        let b = fixtures::job(&repo, employer.id, "B", &["sql", "go"]).await;
        let c = fixtures::job(&repo, employer.id, "C", &["go", "python"]).await;

        assert_eq!(a.skills, names(&["python", "sql"]));
        assert_eq!(b.skills, names(&["go", "sql"]));
        assert_eq!(c.skills, names(&["go", "python"]));
        for name in ["python", "sql", "go"] {
            assert_eq!(
                tag_rows_named(&repo, TagUniverse::RequiredSkills, name).await,
                1
            );
        }
    }

    #[tokio::test]
    async fn test_universes_are_independent() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;
        fixtures::job(&repo, employer.id, "Job", &["python"]).await;
        let seeker = fixtures::seeker(&repo, "sam", &["python", "django"]).await;

        assert_eq!(seeker.skills, names(&["django", "python"]));
        assert_eq!(tag_row_count(&repo, TagUniverse::RequiredSkills).await, 1);
        assert_eq!(tag_row_count(&repo, TagUniverse::SeekerSkills).await, 2);
    }

    #[tokio::test]
    async fn test_names_are_trimmed_and_case_sensitive() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;

        let job = fixtures::job(&repo, employer.id, "Trim", &[" Python ", "python"]).await;

        assert_eq!(job.skills, names(&["Python", "python"]));
    }

    #[tokio::test]
    async fn test_oversized_name_aborts_the_whole_update() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;
        let job = fixtures::job(&repo, employer.id, "Keep", &["python"]).await;

        let request = UpdateJobRequest {
            name: Some("Renamed".to_string()),
            skills: Some(vec!["go".to_string(), "x".repeat(31)]),
            ..Default::default()
        };
        let err = repo.update_job(job.id, &request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let after = repo.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(after.name, "Keep");
        assert_eq!(after.skills, names(&["python"]));
        assert_eq!(
            tag_rows_named(&repo, TagUniverse::RequiredSkills, "go").await,
            0
        );
    }

    #[tokio::test]
    async fn test_rollback_discards_cleared_memberships() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;
        let job = fixtures::job(&repo, employer.id, "Tx", &["python", "sql"]).await;

        {
            let mut tx = repo.pool.begin().await.unwrap();
            reconcile(&mut tx, TagUniverse::RequiredSkills, job.id, &names(&["go"]), false)
                .await
                .unwrap();
            // Dropped without commit
        }

        let after = repo.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(after.skills, names(&["python", "sql"]));
    }

    #[tokio::test]
    async fn test_concurrent_creates_share_new_tag() {
        let (repo, _dir) = fixtures::repo().await;
        let employer = fixtures::employer(&repo, "acme").await;

        let first = fixtures::job_request("First", &["brand-new"]);
        let second = fixtures::job_request("Second", &["brand-new"]);
        let (a, b) = tokio::join!(
            repo.create_job(employer.id, &first),
            repo.create_job(employer.id, &second)
        );

        assert_eq!(a.unwrap().skills, names(&["brand-new"]));
        assert_eq!(b.unwrap().skills, names(&["brand-new"]));
        assert_eq!(
            tag_rows_named(&repo, TagUniverse::RequiredSkills, "brand-new").await,
            1
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_skill_creates_share_one_row() {
        let (repo, _dir) = fixtures::repo().await;
        let repo = std::sync::Arc::new(repo);

        for round in 0..10 {
            let name = format!("racy-{round}");
            let handles: Vec<_> = (0..5)
                .map(|_| {
                    let repo = repo.clone();
                    let name = name.clone();
                    tokio::spawn(async move {
                        repo.get_or_create_skill(TagUniverse::SeekerSkills, &name)
                            .await
                    })
                })
                .collect();

            let mut ids = Vec::new();
            for handle in handles {
                ids.push(handle.await.unwrap().unwrap().id);
            }
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), 1, "one id for {name}");
            assert_eq!(tag_rows_named(&repo, TagUniverse::SeekerSkills, &name).await, 1);
        }
    }

    #[tokio::test]
    async fn test_lookup_or_create_returns_existing_row() {
        let (repo, _dir) = fixtures::repo().await;
        let mut conn = repo.pool.acquire().await.unwrap();

        let first = lookup_or_create(&mut conn, TagUniverse::SeekerSkills, "rust")
            .await
            .unwrap();
        let second = lookup_or_create(&mut conn, TagUniverse::SeekerSkills, "rust")
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_rename_to_taken_name_is_rejected() {
        let (repo, _dir) = fixtures::repo().await;
        let rust = repo
            .get_or_create_skill(TagUniverse::SeekerSkills, "rust")
            .await
            .unwrap();
        repo.get_or_create_skill(TagUniverse::SeekerSkills, "go")
            .await
            .unwrap();

        let err = repo
            .rename_skill(TagUniverse::SeekerSkills, rust.id, "go")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let renamed = repo
            .rename_skill(TagUniverse::SeekerSkills, rust.id, "rustlang")
            .await
            .unwrap();
        assert_eq!(renamed.name, "rustlang");
    }
}
