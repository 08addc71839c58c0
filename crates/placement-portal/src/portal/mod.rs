//! Campus placement workflows: accounts, the job board, applications, interviews,
//! student profiles, notifications and staff analytics.
//!
//! Services are synchronous and generic over the repository traits; [`PlacementPortal`]
//! wires them to one store and one identity provider and is what the HTTP router serves.

pub mod accounts;
pub mod analytics;
pub mod applications;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod identity;
pub mod interviews;
pub mod memory;
pub mod notifications;
pub mod profile;
pub mod repository;
pub mod router;
pub mod session;

#[cfg(test)]
mod tests;

use std::sync::Arc;

pub use accounts::{
    AccountService, CompanyDetails, SignInRequest, SignInResult, SignUpRequest, SignUpResult,
    StudentDetails,
};
pub use analytics::{AnalyticsService, PlacementAnalytics};
pub use applications::{
    ApplicantView, ApplicationWorkflow, ApplyOutcome, InterestOutcome, ReviewDecision,
    StudentApplicationView,
};
pub use catalog::{
    CtcBand, CtcRange, EligibilityBadge, EligibilityPolicy, FilterOptions, JobCatalog, JobDetails,
    JobFilter, JobPage, JobPosting,
};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, AuthUserId, Company, CompanyId, CompanyMember,
    CompanyStatus, Interest, Interview, InterviewId, InterviewMode, InterviewStatus, Job, JobId,
    Notification, NotificationId, NotificationKind, ProfileId, Role, Student, StudentId,
    UserProfile,
};
pub use error::{PortalError, ValidationError};
pub use identity::{
    AuthError, Identity, IdentityProvider, MemoryIdentityProvider, Session, SessionToken,
    SignUpOptions, SignUpOutcome,
};
pub use interviews::{InterviewFilter, InterviewScheduler, InterviewSlot, StudentInterviewView};
pub use memory::MemoryStore;
pub use notifications::{NotificationCenter, NotificationFeed};
pub use profile::{ProfileEdits, ProfileManager};
pub use repository::{
    NotificationError, NotificationPublisher, PortalStore, RepositoryError,
};
pub use router::portal_router;
pub use session::{GuardRejection, SessionContext, SessionGuard, ENTRY_PAGE};

use crate::config::PortalConfig;
use repository::{ApplicationRepository, CompanyRepository, InterviewRepository, StudentRepository};

/// Everything a company sees about one (student, job) pair.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CandidateView {
    pub student: Student,
    pub job: Job,
    pub application: Option<Application>,
    pub interviews: Vec<Interview>,
}

/// Portal services bound to a single store and identity provider.
pub struct PlacementPortal<S, P> {
    store: Arc<S>,
    guard: SessionGuard<S, P>,
    accounts: AccountService<S, P>,
    catalog: JobCatalog<S>,
    applications: ApplicationWorkflow<S, S>,
    interviews: InterviewScheduler<S, S>,
    profiles: ProfileManager<S>,
    notifications: NotificationCenter<S>,
    analytics: AnalyticsService<S>,
}

impl<S, P> PlacementPortal<S, P>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    pub fn new(store: Arc<S>, identity: Arc<P>, config: &PortalConfig) -> Self {
        Self {
            guard: SessionGuard::new(store.clone(), identity.clone()),
            accounts: AccountService::new(store.clone(), identity, config.site_url.clone()),
            catalog: JobCatalog::new(
                store.clone(),
                EligibilityPolicy::from_config(config),
                config.jobs_per_page,
            ),
            applications: ApplicationWorkflow::new(store.clone(), store.clone()),
            interviews: InterviewScheduler::new(store.clone(), store.clone()),
            profiles: ProfileManager::new(store.clone()),
            notifications: NotificationCenter::new(store.clone()),
            analytics: AnalyticsService::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn accounts(&self) -> &AccountService<S, P> {
        &self.accounts
    }

    pub fn catalog(&self) -> &JobCatalog<S> {
        &self.catalog
    }

    pub fn applications(&self) -> &ApplicationWorkflow<S, S> {
        &self.applications
    }

    pub fn interviews(&self) -> &InterviewScheduler<S, S> {
        &self.interviews
    }

    pub fn profiles(&self) -> &ProfileManager<S> {
        &self.profiles
    }

    pub fn notifications(&self) -> &NotificationCenter<S> {
        &self.notifications
    }

    pub fn analytics(&self) -> &AnalyticsService<S> {
        &self.analytics
    }

    pub fn authorize(
        &self,
        token: Option<&SessionToken>,
        allowed: &[Role],
    ) -> Result<SessionContext, PortalError> {
        Ok(self.guard.require_role(token, allowed)?)
    }

    /// The caller's student row, created blank on first use.
    pub fn student_for(&self, session: &SessionContext) -> Result<Student, PortalError> {
        self.profiles.load_or_create(&session.profile)
    }

    pub fn company_for(&self, session: &SessionContext) -> Result<Company, PortalError> {
        let member = self
            .store
            .membership_for_profile(&session.profile.id)?
            .ok_or(PortalError::CompanyUnlinked)?;
        self.store
            .fetch_company(&member.company_id)?
            .ok_or(PortalError::CompanyUnlinked)
    }

    pub fn browse_jobs(
        &self,
        student: &Student,
        filter: &JobFilter,
        page: usize,
    ) -> Result<JobPage, PortalError> {
        let applied = self.applications.applied_job_ids(&student.id)?;
        let interested = self.applications.interested_job_ids(&student.id)?;
        self.catalog
            .browse(student, filter, page, &applied, &interested)
    }

    pub fn job_details(&self, student: &Student, job_id: &JobId) -> Result<JobDetails, PortalError> {
        let applied = self.store.application_for(&student.id, job_id)?.is_some();
        self.catalog.job_details(student, job_id, applied)
    }

    /// Applying is limited to jobs the student is eligible for. An existing application
    /// wins over eligibility, so a later profile edit never turns a repeat into a failure.
    pub fn apply_to_job(&self, student: &Student, job_id: &JobId) -> Result<ApplyOutcome, PortalError> {
        let job = self.catalog.job(job_id)?;
        if self.store.application_for(&student.id, &job.id)?.is_some() {
            return Ok(ApplyOutcome::AlreadyApplied(job.id));
        }
        if !self.catalog.policy().is_eligible(student, &job) {
            return Err(PortalError::NotEligible(job.id));
        }
        self.applications.apply(student, &job)
    }

    pub fn mark_interest(
        &self,
        student: &Student,
        job_id: &JobId,
    ) -> Result<InterestOutcome, PortalError> {
        let job = self.catalog.job(job_id)?;
        self.applications.mark_interest(student, &job)
    }

    /// The job, provided it was posted by `company`.
    pub fn owned_job(&self, company: &Company, job_id: &JobId) -> Result<Job, PortalError> {
        let job = self.catalog.job(job_id)?;
        if job.company_id != company.id {
            tracing::warn!(company = %company.id, job = %job.id, "company touched a foreign job");
            return Err(PortalError::ForeignJob(job.id));
        }
        Ok(job)
    }

    pub fn review_application(
        &self,
        company: &Company,
        application_id: &ApplicationId,
        decision: ReviewDecision,
    ) -> Result<Application, PortalError> {
        let application = self.applications.fetch(application_id)?;
        self.owned_job(company, &application.job_id)?;
        self.applications.review(application_id, decision)
    }

    pub fn candidate_view(
        &self,
        company: &Company,
        student_id: &StudentId,
        job_id: &JobId,
    ) -> Result<CandidateView, PortalError> {
        let job = self.owned_job(company, job_id)?;
        let student = self
            .store
            .fetch_student(student_id)?
            .ok_or_else(|| PortalError::not_found("student", student_id))?;
        let application = self.store.application_for(student_id, job_id)?;
        let interviews = match &application {
            Some(application) => self.store.interviews_for_application(&application.id)?,
            None => Vec::new(),
        };
        Ok(CandidateView {
            student,
            job,
            application,
            interviews,
        })
    }

    pub fn set_candidate_status(
        &self,
        company: &Company,
        student_id: &StudentId,
        job_id: &JobId,
        status: ApplicationStatus,
    ) -> Result<Application, PortalError> {
        self.owned_job(company, job_id)?;
        self.require_student(student_id)?;
        let application =
            self.applications
                .resolve_or_create(student_id, job_id, ApplicationStatus::Shortlisted)?;
        self.applications.set_status(&application.id, status)
    }

    pub fn schedule_candidate_interview(
        &self,
        company: &Company,
        student_id: &StudentId,
        job_id: &JobId,
        slot: InterviewSlot,
    ) -> Result<Interview, PortalError> {
        self.owned_job(company, job_id)?;
        self.require_student(student_id)?;
        self.interviews
            .schedule_for_pair(student_id, job_id, &company.id, slot)
    }

    fn require_student(&self, student_id: &StudentId) -> Result<Student, PortalError> {
        self.store
            .fetch_student(student_id)?
            .ok_or_else(|| PortalError::not_found("student", student_id))
    }
}
