use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::portal::domain::{Job, Role};
use crate::portal::repository::{CompanyRepository, RepositoryError};
use crate::portal::router::bearer_token;
use crate::portal::{MemoryStore, PortalError};

fn job_of(store: &MemoryStore, name: &str, title: &str, min_cgpa: f32) -> Job {
    let owner = match store.company_by_name(name).expect("lookup") {
        Some(existing) => existing,
        None => company(store, name),
    };
    posted(store, &owner, title, min_cgpa, &[])
}

#[test]
fn bearer_token_requires_the_bearer_scheme() {
    let mut headers = HeaderMap::new();
    assert!(bearer_token(&headers).is_none());

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert!(bearer_token(&headers).is_none());

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  tok-1 "));
    assert_eq!(bearer_token(&headers).map(|token| token.0), Some("tok-1".to_string()));
}

#[test]
fn store_outages_map_to_service_unavailable() {
    let response =
        PortalError::Repository(RepositoryError::Unavailable("timeout".to_string())).into_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unauthenticated_requests_are_redirected() {
    let (portal, _, _) = build_portal();

    let response = router(portal)
        .oneshot(request(Method::GET, "/api/v1/jobs", None, None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::LOCATION),
        Some(&HeaderValue::from_static("index.html"))
    );
    let payload = read_json_body(response).await;
    assert_eq!(payload["redirect"], "index.html");
    assert!(payload.get("jobs").is_none());
}

#[tokio::test]
async fn students_cannot_reach_staff_analytics() {
    let (portal, _, _) = build_portal();
    let token = signed_in(&portal, student_sign_up("s@college.edu", "CS", 8.0));

    let response = router(portal)
        .oneshot(request(Method::GET, "/api/v1/staff/analytics", Some(&token), None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(read_json_body(response).await["redirect"], "index.html");
}

#[tokio::test]
async fn session_endpoint_reports_role_dashboard() {
    let (portal, _, _) = build_portal();
    let token = signed_in(&portal, company_sign_up("hr@techcorp.com", "TechCorp Solutions"));

    let response = router(portal)
        .oneshot(request(Method::GET, "/api/v1/session", Some(&token), None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["redirect"], Role::Company.dashboard());
    assert_eq!(payload["profile"]["email"], "hr@techcorp.com");
}

#[tokio::test]
async fn sign_up_and_sign_in_over_http() {
    let (portal, _, _) = build_portal();
    let app = router(portal);

    let sign_up = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/sign-up",
            None,
            Some(json!({
                "full_name": "Jane Smith",
                "email": "jane@college.edu",
                "password": PASSWORD,
                "role": "student",
                "student": { "branch": "CS", "passing_year": 2025, "cgpa": 8.1 },
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(sign_up.status(), StatusCode::CREATED);

    let bad_sign_up = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/sign-up",
            None,
            Some(json!({
                "full_name": "",
                "email": "blank@college.edu",
                "password": PASSWORD,
                "role": "staff",
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(bad_sign_up.status(), StatusCode::BAD_REQUEST);

    let sign_in = app
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/sign-in",
            None,
            Some(json!({ "email": "JANE@college.edu", "password": PASSWORD })),
        ))
        .await
        .expect("route executes");
    assert_eq!(sign_in.status(), StatusCode::OK);
    let payload = read_json_body(sign_in).await;
    assert_eq!(payload["role"], "student");
    assert_eq!(payload["redirect"], "dashboard-student.html");
    assert!(payload["token"].as_str().is_some_and(|token| !token.is_empty()));
}

#[tokio::test]
async fn jobs_page_filters_and_loads_more() {
    let (portal, store, _) = build_portal();
    let token = signed_in(&portal, student_sign_up("s@college.edu", "CS", 8.0));
    for title in ["Analyst", "Developer", "Designer"] {
        job_of(&store, "TechCorp Solutions", title, 7.0);
    }
    job_of(&store, "TechCorp Solutions", "Research Lead", 9.0);
    let app = router(portal);

    let first = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/jobs?ctc=", Some(&token), None))
        .await
        .expect("route executes");
    assert_eq!(first.status(), StatusCode::OK);
    let first = read_json_body(first).await;
    assert_eq!(first["total"], 3);
    assert_eq!(first["jobs"].as_array().map(Vec::len), Some(2));
    assert_eq!(first["has_more"], true);

    let more = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/jobs?page=1", Some(&token), None))
        .await
        .expect("route executes");
    let more = read_json_body(more).await;
    assert_eq!(more["jobs"].as_array().map(Vec::len), Some(3));
    assert_eq!(more["has_more"], false);

    let searched = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/jobs?search=design", Some(&token), None))
        .await
        .expect("route executes");
    let searched = read_json_body(searched).await;
    assert_eq!(searched["total"], 1);
    assert_eq!(searched["jobs"][0]["title"], "Designer");

    let bad_band = app
        .oneshot(request(Method::GET, "/api/v1/jobs?ctc=lots", Some(&token), None))
        .await
        .expect("route executes");
    assert_eq!(bad_band.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn apply_twice_reports_already_applied() {
    let (portal, store, _) = build_portal();
    let token = signed_in(&portal, student_sign_up("s@college.edu", "CS", 8.0));
    let job = job_of(&store, "TechCorp Solutions", "Developer", 7.0);
    let uri = format!("/api/v1/jobs/{}/apply", job.id);
    let app = router(portal);

    let first = app
        .clone()
        .oneshot(request(Method::POST, &uri, Some(&token), None))
        .await
        .expect("route executes");
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = read_json_body(first).await;
    assert_eq!(first["already_applied"], false);
    assert_eq!(first["application"]["status"], "pending");

    let second = app
        .clone()
        .oneshot(request(Method::POST, &uri, Some(&token), None))
        .await
        .expect("route executes");
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(read_json_body(second).await["already_applied"], true);

    let details = app
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/jobs/{}", job.id),
            Some(&token),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(details).await["eligibility"], "applied");
}

#[tokio::test]
async fn reapplying_after_a_cgpa_drop_is_still_already_applied() {
    let (portal, store, _) = build_portal();
    let token = signed_in(&portal, student_sign_up("s@college.edu", "CS", 8.0));
    let job = job_of(&store, "TechCorp Solutions", "Developer", 7.5);
    let uri = format!("/api/v1/jobs/{}/apply", job.id);
    let app = router(portal);

    let first = app
        .clone()
        .oneshot(request(Method::POST, &uri, Some(&token), None))
        .await
        .expect("route executes");
    assert_eq!(first.status(), StatusCode::CREATED);

    let lowered = app
        .clone()
        .oneshot(request(
            Method::PUT,
            "/api/v1/profile",
            Some(&token),
            Some(json!({ "full_name": "Jane Smith", "cgpa": 7.0 })),
        ))
        .await
        .expect("route executes");
    assert_eq!(lowered.status(), StatusCode::OK);

    let again = app
        .clone()
        .oneshot(request(Method::POST, &uri, Some(&token), None))
        .await
        .expect("route executes");
    assert_eq!(again.status(), StatusCode::OK);
    assert_eq!(read_json_body(again).await["already_applied"], true);

    let applications = app
        .oneshot(request(Method::GET, "/api/v1/applications", Some(&token), None))
        .await
        .expect("route executes");
    let applications = read_json_body(applications).await;
    assert_eq!(applications.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn marking_interest_twice_reports_already_marked() {
    let (portal, store, _) = build_portal();
    let token = signed_in(&portal, student_sign_up("s@college.edu", "CS", 8.0));
    let job = job_of(&store, "CloudSys Ltd", "Cloud Engineer", 7.0);
    let uri = format!("/api/v1/jobs/{}/interest", job.id);
    let app = router(portal);

    let first = app
        .clone()
        .oneshot(request(Method::POST, &uri, Some(&token), None))
        .await
        .expect("route executes");
    assert_eq!(first.status(), StatusCode::OK);
    let first = read_json_body(first).await;
    assert_eq!(first["interested"], true);
    assert_eq!(first["already_marked"], false);

    let second = app
        .oneshot(request(Method::POST, &uri, Some(&token), None))
        .await
        .expect("route executes");
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(read_json_body(second).await["already_marked"], true);
}

#[tokio::test]
async fn ineligible_students_cannot_apply() {
    let (portal, store, _) = build_portal();
    let token = signed_in(&portal, student_sign_up("s@college.edu", "CS", 6.5));
    let job = job_of(&store, "TechCorp Solutions", "Developer", 7.5);

    let app = router(portal);

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/jobs/{}/apply", job.id),
            Some(&token),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let applications = app
        .oneshot(request(Method::GET, "/api/v1/applications", Some(&token), None))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(applications).await, json!([]));
}

#[tokio::test]
async fn profile_updates_validate_before_writing() {
    let (portal, _, _) = build_portal();
    let token = signed_in(&portal, student_sign_up("s@college.edu", "CS", 8.0));
    let app = router(portal);

    let rejected = app
        .clone()
        .oneshot(request(
            Method::PUT,
            "/api/v1/profile",
            Some(&token),
            Some(json!({ "full_name": "Jane", "cgpa": 12.0 })),
        ))
        .await
        .expect("route executes");
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let saved = app
        .clone()
        .oneshot(request(
            Method::PUT,
            "/api/v1/profile",
            Some(&token),
            Some(json!({
                "full_name": "Jane Smith",
                "phone": "9876543210",
                "cgpa": 8.0,
                "skills": ["Rust", " ", "SQL"],
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(saved.status(), StatusCode::OK);
    let saved = read_json_body(saved).await;
    assert_eq!(saved["profile_complete"], 100);
    assert_eq!(saved["skills"], json!(["Rust", "SQL"]));

    let loaded = app
        .oneshot(request(Method::GET, "/api/v1/profile", Some(&token), None))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(loaded).await["full_name"], "Jane Smith");
}

#[tokio::test]
async fn company_review_flow_respects_job_ownership() {
    let (portal, _, _) = build_portal();
    let student_token = signed_in(&portal, student_sign_up("s@college.edu", "CS", 8.0));
    let company_token = signed_in(&portal, company_sign_up("hr@techcorp.com", "TechCorp Solutions"));
    let rival_token = signed_in(&portal, company_sign_up("hr@rival.com", "Rival Systems"));
    let app = router(portal);

    let posted = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/company/jobs",
            Some(&company_token),
            Some(json!({
                "title": "Software Developer",
                "description": "Full stack development role",
                "requirements": ["Rust", "SQL"],
                "ctc": "6-8 LPA",
                "location": "Bangalore",
                "deadline": "2026-12-15",
                "min_cgpa": 7.5,
                "eligible_branches": ["CS", "IT"],
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(posted.status(), StatusCode::CREATED);
    let job_id = read_json_body(posted).await["id"]
        .as_str()
        .expect("job id")
        .to_string();

    let applied = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/jobs/{job_id}/apply"),
            Some(&student_token),
            None,
        ))
        .await
        .expect("route executes");
    let application_id = read_json_body(applied).await["application"]["id"]
        .as_str()
        .expect("application id")
        .to_string();
    let review_uri = format!("/api/v1/company/applications/{application_id}/review");

    let foreign = app
        .clone()
        .oneshot(request(
            Method::POST,
            &review_uri,
            Some(&rival_token),
            Some(json!({ "decision": "approve" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(foreign.status(), StatusCode::FORBIDDEN);

    let approved = app
        .clone()
        .oneshot(request(
            Method::POST,
            &review_uri,
            Some(&company_token),
            Some(json!({ "decision": "approve" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(approved.status(), StatusCode::OK);
    assert_eq!(read_json_body(approved).await["status"], "shortlisted");

    let applicants = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/v1/company/applications",
            Some(&company_token),
            None,
        ))
        .await
        .expect("route executes");
    let applicants = read_json_body(applicants).await;
    assert_eq!(applicants[0]["student_name"], "Jane Smith");
    let student_id = applicants[0]["student_id"]
        .as_str()
        .expect("student id")
        .to_string();

    let scheduled = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/company/candidates/{student_id}/jobs/{job_id}/interviews"),
            Some(&company_token),
            Some(json!({ "date": "2026-11-20", "time": "10:00", "mode": "online" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(scheduled.status(), StatusCode::CREATED);

    let candidate = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/company/candidates/{student_id}/jobs/{job_id}"),
            Some(&company_token),
            None,
        ))
        .await
        .expect("route executes");
    let candidate = read_json_body(candidate).await;
    assert_eq!(candidate["application"]["status"], "shortlisted");
    assert_eq!(candidate["interviews"].as_array().map(Vec::len), Some(1));

    let interviews = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/v1/interviews?status=scheduled",
            Some(&student_token),
            None,
        ))
        .await
        .expect("route executes");
    let interviews = read_json_body(interviews).await;
    assert_eq!(interviews[0]["job_title"], "Software Developer");

    let feed = app
        .oneshot(request(
            Method::GET,
            "/api/v1/notifications",
            Some(&student_token),
            None,
        ))
        .await
        .expect("route executes");
    let feed = read_json_body(feed).await;
    assert_eq!(feed["unread"], 3);
    assert_eq!(feed["notifications"][0]["kind"], "interview");
}

#[tokio::test]
async fn staff_overwrite_status_and_approve_companies() {
    let (portal, store, _) = build_portal();
    let staff_token = signed_in(&portal, staff_sign_up("officer@college.edu"));
    signed_in(&portal, company_sign_up("hr@techcorp.com", "TechCorp Solutions"));
    let student_token = signed_in(&portal, student_sign_up("s@college.edu", "CS", 8.0));
    let job = job_of(&store, "TechCorp Solutions", "Developer", 7.0);
    let app = router(portal);

    let applied = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/jobs/{}/apply", job.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("route executes");
    let application_id = read_json_body(applied).await["application"]["id"]
        .as_str()
        .expect("application id")
        .to_string();

    for status in ["rejected", "selected"] {
        let response = app
            .clone()
            .oneshot(request(
                Method::PUT,
                &format!("/api/v1/staff/applications/{application_id}/status"),
                Some(&staff_token),
                Some(json!({ "status": status })),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let company = store
        .company_by_name("TechCorp Solutions")
        .expect("lookup")
        .expect("company");
    let approved = app
        .clone()
        .oneshot(request(
            Method::PUT,
            &format!("/api/v1/staff/companies/{}/status", company.id),
            Some(&staff_token),
            Some(json!({ "status": "approved" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(approved).await["status"], "approved");

    let analytics = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/staff/analytics", Some(&staff_token), None))
        .await
        .expect("route executes");
    let analytics = read_json_body(analytics).await;
    assert_eq!(analytics["placement_rate"], 100);
    assert_eq!(analytics["status_breakdown"]["selected"], 1);
    assert_eq!(analytics["top_recruiting_companies"], json!(["TechCorp Solutions"]));

    let missing = app
        .oneshot(request(
            Method::PUT,
            "/api/v1/staff/applications/app-missing/status",
            Some(&staff_token),
            Some(json!({ "status": "selected" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
