use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, CompanyId, Interest, Job, JobId,
    Notification, NotificationKind, Student, StudentId,
};
use super::error::PortalError;
use super::notifications::deliver;
use super::repository::{
    ApplicationRepository, InterestRepository, JobRepository, NotificationPublisher,
    RepositoryError, StudentRepository,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(Application),
    /// The pair already had an application; nothing was written.
    AlreadyApplied(JobId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterestOutcome {
    Marked,
    AlreadyMarked,
}

/// Company verdict on an applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub const fn status(self) -> ApplicationStatus {
        match self {
            ReviewDecision::Approve => ApplicationStatus::Shortlisted,
            ReviewDecision::Reject => ApplicationStatus::Rejected,
        }
    }
}

/// Application as the student sees it on the applications page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub job_title: String,
    pub company_name: String,
    pub location: String,
    pub ctc: String,
}

/// Application as the company sees it on the applicants page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantView {
    #[serde(flatten)]
    pub application: Application,
    pub job_title: String,
    pub student_name: String,
    pub email: String,
    pub branch: Option<String>,
    pub cgpa: Option<f32>,
}

fn new_application(student_id: &StudentId, job_id: &JobId, status: ApplicationStatus) -> Application {
    Application {
        id: ApplicationId::next(),
        student_id: student_id.clone(),
        job_id: job_id.clone(),
        status,
        applied_at: Utc::now(),
    }
}

/// Return the pair's application, inserting one with `default_status` when there is none.
pub fn resolve_or_create<R>(
    repository: &R,
    student_id: &StudentId,
    job_id: &JobId,
    default_status: ApplicationStatus,
) -> Result<Application, RepositoryError>
where
    R: ApplicationRepository + ?Sized,
{
    if let Some(existing) = repository.application_for(student_id, job_id)? {
        return Ok(existing);
    }
    match repository.insert_application(new_application(student_id, job_id, default_status)) {
        Ok(application) => Ok(application),
        Err(RepositoryError::Conflict) => repository
            .application_for(student_id, job_id)?
            .ok_or(RepositoryError::NotFound),
        Err(err) => Err(err),
    }
}

fn status_message(status: ApplicationStatus, job: &Job) -> (NotificationKind, String) {
    match status {
        ApplicationStatus::Shortlisted => (
            NotificationKind::Shortlist,
            format!("You have been shortlisted for {} position", job.title),
        ),
        other => (
            NotificationKind::Application,
            format!(
                "Your application for {} at {} is now {}",
                job.title,
                job.company_name,
                other.display_name()
            ),
        ),
    }
}

/// Student-side application lifecycle and the status changes companies and staff make.
pub struct ApplicationWorkflow<S, N> {
    store: Arc<S>,
    notifications: Arc<N>,
}

impl<S, N> ApplicationWorkflow<S, N>
where
    S: ApplicationRepository + InterestRepository + JobRepository + StudentRepository,
    N: NotificationPublisher,
{
    pub fn new(store: Arc<S>, notifications: Arc<N>) -> Self {
        Self {
            store,
            notifications,
        }
    }

    pub fn apply(&self, student: &Student, job: &Job) -> Result<ApplyOutcome, PortalError> {
        if self.store.application_for(&student.id, &job.id)?.is_some() {
            return Ok(ApplyOutcome::AlreadyApplied(job.id.clone()));
        }

        let application = new_application(&student.id, &job.id, ApplicationStatus::Pending);
        let stored = match self.store.insert_application(application) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                tracing::warn!(student = %student.id, job = %job.id, "concurrent duplicate application");
                return Ok(ApplyOutcome::AlreadyApplied(job.id.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        tracing::info!(application = %stored.id, student = %student.id, job = %job.id, "application submitted");

        deliver(
            self.notifications.as_ref(),
            Notification::new(
                student.profile_id.clone(),
                NotificationKind::Application,
                format!(
                    "Your application for {} at {} has been submitted successfully.",
                    job.title, job.company_name
                ),
            ),
        );
        Ok(ApplyOutcome::Applied(stored))
    }

    pub fn fetch(&self, id: &ApplicationId) -> Result<Application, PortalError> {
        self.store
            .fetch_application(id)?
            .ok_or_else(|| PortalError::not_found("application", id))
    }

    /// Overwrites the status whatever it was before; last writer wins.
    pub fn set_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, PortalError> {
        let updated = match self.store.update_application_status(id, status) {
            Ok(updated) => updated,
            Err(RepositoryError::NotFound) => return Err(PortalError::not_found("application", id)),
            Err(err) => return Err(err.into()),
        };
        tracing::info!(application = %id, status = status.label(), "application status changed");
        self.notify_status(&updated);
        Ok(updated)
    }

    pub fn review(
        &self,
        id: &ApplicationId,
        decision: ReviewDecision,
    ) -> Result<Application, PortalError> {
        self.set_status(id, decision.status())
    }

    pub fn resolve_or_create(
        &self,
        student_id: &StudentId,
        job_id: &JobId,
        default_status: ApplicationStatus,
    ) -> Result<Application, PortalError> {
        Ok(resolve_or_create(
            self.store.as_ref(),
            student_id,
            job_id,
            default_status,
        )?)
    }

    pub fn mark_interest(
        &self,
        student: &Student,
        job: &Job,
    ) -> Result<InterestOutcome, PortalError> {
        let interest = Interest {
            student_id: student.id.clone(),
            job_id: job.id.clone(),
            created_at: Utc::now(),
        };
        match self.store.insert_interest(interest) {
            Ok(_) => Ok(InterestOutcome::Marked),
            Err(RepositoryError::Conflict) => Ok(InterestOutcome::AlreadyMarked),
            Err(err) => Err(err.into()),
        }
    }

    pub fn applied_job_ids(&self, student_id: &StudentId) -> Result<HashSet<JobId>, PortalError> {
        Ok(self
            .store
            .applications_for_student(student_id)?
            .into_iter()
            .map(|application| application.job_id)
            .collect())
    }

    pub fn interested_job_ids(&self, student_id: &StudentId) -> Result<HashSet<JobId>, PortalError> {
        Ok(self
            .store
            .interests_for_student(student_id)?
            .into_iter()
            .map(|interest| interest.job_id)
            .collect())
    }

    /// Newest first. Applications whose job has been removed are skipped.
    pub fn student_applications(
        &self,
        student: &Student,
    ) -> Result<Vec<StudentApplicationView>, PortalError> {
        let mut applications = self.store.applications_for_student(&student.id)?;
        applications.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));

        let mut views = Vec::with_capacity(applications.len());
        for application in applications {
            let Some(job) = self.store.fetch_job(&application.job_id)? else {
                continue;
            };
            views.push(StudentApplicationView {
                application,
                job_title: job.title,
                company_name: job.company_name,
                location: job.location,
                ctc: job.ctc,
            });
        }
        Ok(views)
    }

    /// Every applicant across the company's postings, newest first.
    pub fn company_applicants(
        &self,
        company_id: &CompanyId,
    ) -> Result<Vec<ApplicantView>, PortalError> {
        let mut views = Vec::new();
        for job in self.store.jobs_for_company(company_id)? {
            for application in self.store.applications_for_job(&job.id)? {
                let Some(student) = self.store.fetch_student(&application.student_id)? else {
                    continue;
                };
                views.push(ApplicantView {
                    application,
                    job_title: job.title.clone(),
                    student_name: student.full_name,
                    email: student.email,
                    branch: student.branch,
                    cgpa: student.cgpa,
                });
            }
        }
        views.sort_by(|a, b| b.application.applied_at.cmp(&a.application.applied_at));
        Ok(views)
    }

    fn notify_status(&self, application: &Application) {
        let recipient = match self.store.fetch_student(&application.student_id) {
            Ok(Some(student)) => student.profile_id,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(application = %application.id, "status notification skipped: {err}");
                return;
            }
        };
        let job = match self.store.fetch_job(&application.job_id) {
            Ok(Some(job)) => job,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(application = %application.id, "status notification skipped: {err}");
                return;
            }
        };

        let (kind, message) = status_message(application.status, &job);
        deliver(
            self.notifications.as_ref(),
            Notification::new(recipient, kind, message),
        );
    }
}
