//! Shared setup for repository tests.

use tempfile::TempDir;

use super::{init_database, Repository};
use crate::models::{
    CreateEmployerRequest, CreateJobRequest, CreateJobSeekerRequest, CreateProjectRequest,
    CreateUserRequest, Employer, Job, JobSeeker, Project, User,
};

/// A repository over a fresh database. Keep the directory alive for the test's duration.
pub async fn repo() -> (Repository, TempDir) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("test.db")).await.unwrap();
    (Repository::new(pool), dir)
}

pub fn user_request(name: &str) -> CreateUserRequest {
    CreateUserRequest {
        username: name.to_string(),
        email: format!("{name}@example.com"),
        password: "password123".to_string(),
        first_name: String::new(),
        last_name: String::new(),
        profile_picture: None,
    }
}

pub async fn user(repo: &Repository, name: &str) -> User {
    repo.create_user(&user_request(name), "not-a-real-hash")
        .await
        .unwrap()
}

pub async fn employer(repo: &Repository, name: &str) -> Employer {
    let user = user(repo, name).await;
    let request = CreateEmployerRequest {
        description: format!("{name} hires"),
        phone: "555-0100".to_string(),
    };
    repo.create_employer(&user.id, &request).await.unwrap()
}

pub async fn seeker(repo: &Repository, name: &str, skills: &[&str]) -> JobSeeker {
    let user = user(repo, name).await;
    let request = CreateJobSeekerRequest {
        education: "BSc".to_string(),
        experience: 2.0,
        phone: String::new(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
    };
    repo.create_job_seeker(&user.id, &request).await.unwrap()
}

pub fn job_request(name: &str, skills: &[&str]) -> CreateJobRequest {
    CreateJobRequest {
        name: name.to_string(),
        description: format!("{name} description"),
        category: None,
        budget: 100.0,
        duration: None,
        requirement: "requirements/brief.pdf".to_string(),
        is_draft: false,
        skills: skills.iter().map(|s| s.to_string()).collect(),
    }
}

pub async fn job(repo: &Repository, employer_id: i64, name: &str, skills: &[&str]) -> Job {
    repo.create_job(employer_id, &job_request(name, skills))
        .await
        .unwrap()
}

pub async fn project(repo: &Repository, job_id: i64, job_seeker_id: i64) -> Project {
    let request = CreateProjectRequest {
        job: job_id,
        job_seeker: job_seeker_id,
        is_active: true,
        is_finished: false,
    };
    repo.create_project(&request).await.unwrap()
}
