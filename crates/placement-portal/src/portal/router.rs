use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::accounts::{SignInRequest, SignInResult, SignUpRequest};
use super::analytics::PlacementAnalytics;
use super::applications::{ApplicantView, ApplyOutcome, InterestOutcome, ReviewDecision, StudentApplicationView};
use super::catalog::{CtcBand, FilterOptions, JobDetails, JobFilter, JobPage, JobPosting};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, Company, CompanyId, CompanyStatus, Interview,
    InterviewStatus, Job, JobId, NotificationId, Role, Student, StudentId, UserProfile,
};
use super::error::{PortalError, ValidationError};
use super::identity::{IdentityProvider, SessionToken};
use super::interviews::{InterviewFilter, InterviewSlot, StudentInterviewView};
use super::notifications::NotificationFeed;
use super::profile::ProfileEdits;
use super::repository::PortalStore;
use super::session::ENTRY_PAGE;
use super::{CandidateView, PlacementPortal};

const STUDENT: &[Role] = &[Role::Student];
const COMPANY: &[Role] = &[Role::Company];
const STAFF: &[Role] = &[Role::Staff];
const ANY_ROLE: &[Role] = &[Role::Student, Role::Company, Role::Staff];

type PortalState<S, P> = State<Arc<PlacementPortal<S, P>>>;

/// Router builder exposing the portal's JSON API.
pub fn portal_router<S, P>(portal: Arc<PlacementPortal<S, P>>) -> Router
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    Router::new()
        .route("/api/v1/auth/sign-in", post(sign_in_handler::<S, P>))
        .route("/api/v1/auth/sign-up", post(sign_up_handler::<S, P>))
        .route("/api/v1/auth/sign-out", post(sign_out_handler::<S, P>))
        .route("/api/v1/session", get(session_handler::<S, P>))
        .route("/api/v1/jobs", get(list_jobs_handler::<S, P>))
        .route("/api/v1/jobs/filters", get(job_filters_handler::<S, P>))
        .route("/api/v1/jobs/:job_id", get(job_details_handler::<S, P>))
        .route("/api/v1/jobs/:job_id/apply", post(apply_handler::<S, P>))
        .route("/api/v1/jobs/:job_id/interest", post(interest_handler::<S, P>))
        .route("/api/v1/applications", get(student_applications_handler::<S, P>))
        .route("/api/v1/interviews", get(student_interviews_handler::<S, P>))
        .route(
            "/api/v1/profile",
            get(load_profile_handler::<S, P>).put(save_profile_handler::<S, P>),
        )
        .route("/api/v1/notifications", get(notifications_handler::<S, P>))
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(mark_read_handler::<S, P>),
        )
        .route(
            "/api/v1/company/jobs",
            get(company_jobs_handler::<S, P>).post(post_job_handler::<S, P>),
        )
        .route(
            "/api/v1/company/applications",
            get(company_applicants_handler::<S, P>),
        )
        .route(
            "/api/v1/company/applications/:application_id/review",
            post(review_handler::<S, P>),
        )
        .route(
            "/api/v1/company/candidates/:student_id/jobs/:job_id",
            get(candidate_handler::<S, P>),
        )
        .route(
            "/api/v1/company/candidates/:student_id/jobs/:job_id/status",
            put(candidate_status_handler::<S, P>),
        )
        .route(
            "/api/v1/company/candidates/:student_id/jobs/:job_id/interviews",
            post(candidate_interview_handler::<S, P>),
        )
        .route("/api/v1/staff/analytics", get(analytics_handler::<S, P>))
        .route(
            "/api/v1/staff/applications/:application_id/status",
            put(staff_status_handler::<S, P>),
        )
        .route(
            "/api/v1/staff/companies/:company_id/status",
            put(company_status_handler::<S, P>),
        )
        .with_state(portal)
}

/// `Authorization: Bearer <token>`; anything else counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| SessionToken(token.to_string()))
}

/// Blank query values come from untouched form controls and mean "no filter".
fn parse_label<T: DeserializeOwned>(
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, ValidationError> {
    let Some(raw) = raw.map(|raw| raw.trim().to_string()).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    serde_json::from_value(serde_json::Value::String(raw.clone()))
        .map(Some)
        .map_err(|_| ValidationError::Invalid {
            field,
            reason: format!("unknown value `{raw}`"),
        })
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobQuery {
    search: Option<String>,
    company: Option<String>,
    branch: Option<String>,
    job_type: Option<String>,
    location: Option<String>,
    ctc: Option<String>,
    page: Option<usize>,
}

impl JobQuery {
    fn into_filter(self) -> Result<(JobFilter, usize), ValidationError> {
        let ctc = parse_label::<CtcBand>("ctc", self.ctc)?;
        let filter = JobFilter {
            search: self.search,
            company: self.company,
            branch: self.branch,
            job_type: self.job_type,
            location: self.location,
            ctc,
        };
        Ok((filter, self.page.unwrap_or(0)))
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InterviewQuery {
    status: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdate<T> {
    status: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    decision: ReviewDecision,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionView {
    profile: UserProfile,
    redirect: &'static str,
}

async fn sign_in_handler<S, P>(
    State(portal): PortalState<S, P>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResult>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    portal.accounts().sign_in(&request).map(Json)
}

async fn sign_up_handler<S, P>(
    State(portal): PortalState<S, P>,
    Json(request): Json<SignUpRequest>,
) -> Result<Response, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let result = portal.accounts().sign_up(request)?;
    Ok((StatusCode::CREATED, Json(result)).into_response())
}

async fn sign_out_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
) -> Response
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Some(token) = bearer_token(&headers) {
        portal.accounts().sign_out(&token);
    }
    Json(json!({ "signed_out": true, "redirect": ENTRY_PAGE })).into_response()
}

async fn session_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
) -> Result<Json<SessionView>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let session = portal.authorize(bearer_token(&headers).as_ref(), ANY_ROLE)?;
    let redirect = session.role().dashboard();
    Ok(Json(SessionView {
        profile: session.profile,
        redirect,
    }))
}

fn current_student<S, P>(
    portal: &PlacementPortal<S, P>,
    headers: &HeaderMap,
) -> Result<Student, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let session = portal.authorize(bearer_token(headers).as_ref(), STUDENT)?;
    portal.student_for(&session)
}

fn current_company<S, P>(
    portal: &PlacementPortal<S, P>,
    headers: &HeaderMap,
) -> Result<Company, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let session = portal.authorize(bearer_token(headers).as_ref(), COMPANY)?;
    portal.company_for(&session)
}

async fn list_jobs_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Query(query): Query<JobQuery>,
) -> Result<Json<JobPage>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let student = current_student(&portal, &headers)?;
    let (filter, page) = query.into_filter()?;
    portal.browse_jobs(&student, &filter, page).map(Json)
}

async fn job_filters_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
) -> Result<Json<FilterOptions>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let student = current_student(&portal, &headers)?;
    portal.catalog().filter_options(&student).map(Json)
}

async fn job_details_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Result<Json<JobDetails>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let student = current_student(&portal, &headers)?;
    portal.job_details(&student, &JobId(job_id)).map(Json)
}

async fn apply_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Result<Response, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let student = current_student(&portal, &headers)?;
    let response = match portal.apply_to_job(&student, &JobId(job_id))? {
        ApplyOutcome::Applied(application) => (
            StatusCode::CREATED,
            Json(json!({ "application": application, "already_applied": false })),
        )
            .into_response(),
        ApplyOutcome::AlreadyApplied(job_id) => (
            StatusCode::OK,
            Json(json!({ "job_id": job_id, "already_applied": true })),
        )
            .into_response(),
    };
    Ok(response)
}

async fn interest_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Result<Response, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let student = current_student(&portal, &headers)?;
    let job_id = JobId(job_id);
    let already_marked = matches!(
        portal.mark_interest(&student, &job_id)?,
        InterestOutcome::AlreadyMarked
    );
    Ok(Json(json!({
        "job_id": job_id,
        "interested": true,
        "already_marked": already_marked,
    }))
    .into_response())
}

async fn student_applications_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
) -> Result<Json<Vec<StudentApplicationView>>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let student = current_student(&portal, &headers)?;
    portal.applications().student_applications(&student).map(Json)
}

async fn student_interviews_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Query(query): Query<InterviewQuery>,
) -> Result<Json<Vec<StudentInterviewView>>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let student = current_student(&portal, &headers)?;
    let filter = InterviewFilter {
        status: parse_label::<InterviewStatus>("status", query.status)?,
        search: query.search,
    };
    portal
        .interviews()
        .student_interviews(&student.id, &filter)
        .map(Json)
}

async fn load_profile_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
) -> Result<Json<Student>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    current_student(&portal, &headers).map(Json)
}

async fn save_profile_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Json(edits): Json<ProfileEdits>,
) -> Result<Json<Student>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let student = current_student(&portal, &headers)?;
    portal.profiles().save(&student, edits).map(Json)
}

async fn notifications_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
) -> Result<Json<NotificationFeed>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let session = portal.authorize(bearer_token(&headers).as_ref(), ANY_ROLE)?;
    portal.notifications().feed(&session.profile.id).map(Json)
}

async fn mark_read_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Path(notification_id): Path<String>,
) -> Result<Response, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let session = portal.authorize(bearer_token(&headers).as_ref(), ANY_ROLE)?;
    portal
        .notifications()
        .mark_read(&NotificationId(notification_id), &session.profile.id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn company_jobs_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
) -> Result<Json<Vec<Job>>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let company = current_company(&portal, &headers)?;
    portal.catalog().company_jobs(&company.id).map(Json)
}

async fn post_job_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Json(posting): Json<JobPosting>,
) -> Result<Response, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let company = current_company(&portal, &headers)?;
    let job = portal.catalog().post_job(&company, posting)?;
    Ok((StatusCode::CREATED, Json(job)).into_response())
}

async fn company_applicants_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
) -> Result<Json<Vec<ApplicantView>>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let company = current_company(&portal, &headers)?;
    portal.applications().company_applicants(&company.id).map(Json)
}

async fn review_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(review): Json<ReviewRequest>,
) -> Result<Json<Application>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let company = current_company(&portal, &headers)?;
    portal
        .review_application(&company, &ApplicationId(application_id), review.decision)
        .map(Json)
}

async fn candidate_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Path((student_id, job_id)): Path<(String, String)>,
) -> Result<Json<CandidateView>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let company = current_company(&portal, &headers)?;
    portal
        .candidate_view(&company, &StudentId(student_id), &JobId(job_id))
        .map(Json)
}

async fn candidate_status_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Path((student_id, job_id)): Path<(String, String)>,
    Json(update): Json<StatusUpdate<ApplicationStatus>>,
) -> Result<Json<Application>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let company = current_company(&portal, &headers)?;
    portal
        .set_candidate_status(&company, &StudentId(student_id), &JobId(job_id), update.status)
        .map(Json)
}

async fn candidate_interview_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Path((student_id, job_id)): Path<(String, String)>,
    Json(slot): Json<InterviewSlot>,
) -> Result<Response, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let company = current_company(&portal, &headers)?;
    let interview: Interview = portal.schedule_candidate_interview(
        &company,
        &StudentId(student_id),
        &JobId(job_id),
        slot,
    )?;
    Ok((StatusCode::CREATED, Json(interview)).into_response())
}

async fn analytics_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
) -> Result<Json<PlacementAnalytics>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    portal.authorize(bearer_token(&headers).as_ref(), STAFF)?;
    portal.analytics().snapshot().map(Json)
}

async fn staff_status_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(update): Json<StatusUpdate<ApplicationStatus>>,
) -> Result<Json<Application>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    portal.authorize(bearer_token(&headers).as_ref(), STAFF)?;
    portal
        .applications()
        .set_status(&ApplicationId(application_id), update.status)
        .map(Json)
}

async fn company_status_handler<S, P>(
    State(portal): PortalState<S, P>,
    headers: HeaderMap,
    Path(company_id): Path<String>,
    Json(update): Json<StatusUpdate<CompanyStatus>>,
) -> Result<Json<Company>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    portal.authorize(bearer_token(&headers).as_ref(), STAFF)?;
    portal
        .analytics()
        .set_company_status(&CompanyId(company_id), update.status)
        .map(Json)
}
