use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;

use crate::config::PortalConfig;
use crate::portal::accounts::{CompanyDetails, SignUpRequest, StudentDetails};
use crate::portal::domain::{
    Company, CompanyId, CompanyStatus, Job, JobId, Notification, ProfileId, Role, Student,
    StudentId,
};
use crate::portal::identity::{MemoryIdentityProvider, SessionToken};
use crate::portal::repository::{
    CompanyRepository, JobRepository, NotificationError, NotificationPublisher,
};
use crate::portal::{portal_router, MemoryStore, PlacementPortal, SignInRequest};

pub(super) const PASSWORD: &str = "placement-2024";

pub(super) type TestPortal = PlacementPortal<MemoryStore, MemoryIdentityProvider>;

pub(super) fn portal_config() -> PortalConfig {
    PortalConfig {
        jobs_per_page: 2,
        ..PortalConfig::default()
    }
}

pub(super) fn build_portal() -> (Arc<TestPortal>, Arc<MemoryStore>, Arc<MemoryIdentityProvider>) {
    build_portal_with(portal_config())
}

pub(super) fn build_portal_with(
    config: PortalConfig,
) -> (Arc<TestPortal>, Arc<MemoryStore>, Arc<MemoryIdentityProvider>) {
    let store = Arc::new(MemoryStore::new());
    let identity = Arc::new(MemoryIdentityProvider::new(
        config.require_email_verification,
    ));
    let portal = Arc::new(PlacementPortal::new(
        store.clone(),
        identity.clone(),
        &config,
    ));
    (portal, store, identity)
}

pub(super) fn router(portal: Arc<TestPortal>) -> axum::Router {
    portal_router(portal)
}

pub(super) fn student_sign_up(email: &str, branch: &str, cgpa: f32) -> SignUpRequest {
    SignUpRequest {
        full_name: "Jane Smith".to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
        role: Role::Student,
        student: Some(StudentDetails {
            branch: branch.to_string(),
            passing_year: 2025,
            cgpa,
        }),
        company: None,
    }
}

pub(super) fn company_sign_up(email: &str, company: &str) -> SignUpRequest {
    SignUpRequest {
        full_name: "Priya Recruiter".to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
        role: Role::Company,
        student: None,
        company: Some(CompanyDetails {
            name: company.to_string(),
            industry: Some("Information Technology".to_string()),
            website: None,
        }),
    }
}

pub(super) fn staff_sign_up(email: &str) -> SignUpRequest {
    SignUpRequest {
        full_name: "Placement Officer".to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
        role: Role::Staff,
        student: None,
        company: None,
    }
}

/// Registers the account and returns a fresh session token for it.
pub(super) fn signed_in(portal: &TestPortal, request: SignUpRequest) -> SessionToken {
    let email = request.email.clone();
    portal.accounts().sign_up(request).expect("sign up succeeds");
    portal
        .accounts()
        .sign_in(&SignInRequest {
            email,
            password: PASSWORD.to_string(),
        })
        .expect("sign in succeeds")
        .token
}

pub(super) fn company(store: &MemoryStore, name: &str) -> Company {
    store
        .insert_company(Company {
            id: CompanyId::next(),
            name: name.to_string(),
            industry: None,
            website: None,
            status: CompanyStatus::Approved,
        })
        .expect("company inserted")
}

pub(super) fn job_for(
    company: &Company,
    title: &str,
    ctc: &str,
    min_cgpa: f32,
    branches: &[&str],
    age_days: i64,
) -> Job {
    Job {
        id: JobId::next(),
        company_id: company.id.clone(),
        company_name: company.name.clone(),
        title: title.to_string(),
        description: format!("{title} role at {}", company.name),
        requirements: vec!["SQL".to_string()],
        ctc: ctc.to_string(),
        location: "Bangalore".to_string(),
        job_type: "Full-time".to_string(),
        deadline: NaiveDate::from_ymd_opt(2026, 12, 15).expect("valid date"),
        min_cgpa,
        eligible_branches: branches.iter().map(|branch| branch.to_string()).collect(),
        created_at: Utc::now() - Duration::days(age_days),
    }
}

pub(super) fn posted(
    store: &MemoryStore,
    company: &Company,
    title: &str,
    min_cgpa: f32,
    branches: &[&str],
) -> Job {
    store
        .insert_job(job_for(company, title, "6-8 LPA", min_cgpa, branches, 1))
        .expect("job inserted")
}

pub(super) fn student(branch: &str, cgpa: Option<f32>) -> Student {
    Student {
        id: StudentId::next(),
        profile_id: ProfileId::next(),
        full_name: "Rahul Verma".to_string(),
        email: "rahul@college.edu".to_string(),
        branch: Some(branch.to_string()),
        passing_year: Some(2025),
        cgpa,
        phone: None,
        skills: Vec::new(),
        resume_url: None,
        profile_complete: 0,
    }
}

/// Publisher whose transport is always down.
#[derive(Default)]
pub(super) struct FailingPublisher {
    attempts: Mutex<usize>,
}

impl FailingPublisher {
    pub(super) fn attempts(&self) -> usize {
        *self.attempts.lock().expect("publisher mutex poisoned")
    }
}

impl NotificationPublisher for FailingPublisher {
    fn publish(&self, _notification: Notification) -> Result<(), NotificationError> {
        *self.attempts.lock().expect("publisher mutex poisoned") += 1;
        Err(NotificationError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) fn request(
    method: Method,
    uri: &str,
    token: Option<&SessionToken>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token.0));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
