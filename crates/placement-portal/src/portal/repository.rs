use super::domain::{
    Application, ApplicationId, ApplicationStatus, AuthUserId, Company, CompanyId, CompanyMember,
    CompanyStatus, Interest, Interview, InterviewId, InterviewStatus, Job, JobId, Notification,
    NotificationId, ProfileId, Student, StudentId, UserProfile,
};

/// Postgres `unique_violation`, surfaced verbatim by the hosted data API.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Classify a raw store failure; only a unique violation counts as a conflict.
    pub fn from_store(code: Option<&str>, message: impl Into<String>) -> Self {
        match code {
            Some(UNIQUE_VIOLATION) => RepositoryError::Conflict,
            _ => RepositoryError::Unavailable(message.into()),
        }
    }
}

pub trait ProfileRepository: Send + Sync {
    /// Fails with `Conflict` when the auth user already has a profile.
    fn insert_profile(&self, profile: UserProfile) -> Result<UserProfile, RepositoryError>;
    fn profile_for_auth_user(
        &self,
        auth_user_id: &AuthUserId,
    ) -> Result<Option<UserProfile>, RepositoryError>;
    fn fetch_profile(&self, id: &ProfileId) -> Result<Option<UserProfile>, RepositoryError>;
    fn rename_profile(&self, id: &ProfileId, full_name: &str) -> Result<(), RepositoryError>;
}

pub trait StudentRepository: Send + Sync {
    /// Fails with `Conflict` when the profile already owns a student row.
    fn insert_student(&self, student: Student) -> Result<Student, RepositoryError>;
    fn fetch_student(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError>;
    fn student_for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Option<Student>, RepositoryError>;
    fn update_student(&self, student: Student) -> Result<(), RepositoryError>;
    fn list_students(&self) -> Result<Vec<Student>, RepositoryError>;
}

pub trait CompanyRepository: Send + Sync {
    /// Fails with `Conflict` when the company name is taken.
    fn insert_company(&self, company: Company) -> Result<Company, RepositoryError>;
    fn fetch_company(&self, id: &CompanyId) -> Result<Option<Company>, RepositoryError>;
    fn company_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError>;
    fn set_company_status(
        &self,
        id: &CompanyId,
        status: CompanyStatus,
    ) -> Result<Company, RepositoryError>;
    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError>;
    fn link_member(&self, member: CompanyMember) -> Result<CompanyMember, RepositoryError>;
    fn membership_for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Option<CompanyMember>, RepositoryError>;
}

pub trait JobRepository: Send + Sync {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError>;
    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    /// All postings, newest first.
    fn list_jobs(&self) -> Result<Vec<Job>, RepositoryError>;
    fn jobs_for_company(&self, company_id: &CompanyId) -> Result<Vec<Job>, RepositoryError>;
}

pub trait ApplicationRepository: Send + Sync {
    /// Fails with `Conflict` when the (student, job) pair already applied.
    fn insert_application(&self, application: Application)
        -> Result<Application, RepositoryError>;
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn application_for(
        &self,
        student_id: &StudentId,
        job_id: &JobId,
    ) -> Result<Option<Application>, RepositoryError>;
    fn update_application_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, RepositoryError>;
    fn applications_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<Application>, RepositoryError>;
    fn applications_for_job(&self, job_id: &JobId) -> Result<Vec<Application>, RepositoryError>;
    fn list_applications(&self) -> Result<Vec<Application>, RepositoryError>;
}

pub trait InterestRepository: Send + Sync {
    /// Fails with `Conflict` when the pair is already marked.
    fn insert_interest(&self, interest: Interest) -> Result<Interest, RepositoryError>;
    fn interests_for_student(&self, student_id: &StudentId)
        -> Result<Vec<Interest>, RepositoryError>;
}

pub trait InterviewRepository: Send + Sync {
    fn insert_interview(&self, interview: Interview) -> Result<Interview, RepositoryError>;
    fn interviews_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<Interview>, RepositoryError>;
    fn update_interview_status(
        &self,
        id: &InterviewId,
        status: InterviewStatus,
    ) -> Result<Interview, RepositoryError>;
}

pub trait NotificationRepository: Send + Sync {
    /// Newest first.
    fn notifications_for(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<Notification>, RepositoryError>;
    /// `NotFound` unless the notification belongs to `profile_id`.
    fn mark_read(&self, id: &NotificationId, profile_id: &ProfileId)
        -> Result<(), RepositoryError>;
}

/// Outbound notification hook; delivery is best-effort for every caller.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Every table the portal reads or writes.
pub trait PortalStore:
    ProfileRepository
    + StudentRepository
    + CompanyRepository
    + JobRepository
    + ApplicationRepository
    + InterestRepository
    + InterviewRepository
    + NotificationRepository
    + NotificationPublisher
{
}

impl<T> PortalStore for T where
    T: ProfileRepository
        + StudentRepository
        + CompanyRepository
        + JobRepository
        + ApplicationRepository
        + InterestRepository
        + InterviewRepository
        + NotificationRepository
        + NotificationPublisher
{
}
