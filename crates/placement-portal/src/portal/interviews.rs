use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::applications::resolve_or_create;
use super::domain::{
    Application, ApplicationStatus, CompanyId, Interview, InterviewId, InterviewMode,
    InterviewStatus, JobId, Notification, NotificationKind, StudentId,
};
use super::error::PortalError;
use super::notifications::deliver;
use super::profile::non_blank;
use super::repository::{
    ApplicationRepository, InterviewRepository, JobRepository, NotificationPublisher,
    RepositoryError, StudentRepository,
};

/// Accepts `HH:MM` as sent by time pickers as well as `HH:MM:SS`.
fn deserialize_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_time(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time `{raw}`")))
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewSlot {
    pub date: NaiveDate,
    #[serde(deserialize_with = "deserialize_time")]
    pub time: NaiveTime,
    #[serde(default)]
    pub mode: InterviewMode,
    #[serde(default)]
    pub interviewer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewFilter {
    #[serde(default)]
    pub status: Option<InterviewStatus>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentInterviewView {
    #[serde(flatten)]
    pub interview: Interview,
    pub job_id: JobId,
    pub job_title: String,
    pub company_name: String,
    pub location: String,
}

pub struct InterviewScheduler<S, N> {
    store: Arc<S>,
    notifications: Arc<N>,
}

impl<S, N> InterviewScheduler<S, N>
where
    S: InterviewRepository + ApplicationRepository + JobRepository + StudentRepository,
    N: NotificationPublisher,
{
    pub fn new(store: Arc<S>, notifications: Arc<N>) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Inserts a new interview on every call; earlier slots for the application are kept.
    pub fn schedule(
        &self,
        application: &Application,
        company_id: &CompanyId,
        slot: InterviewSlot,
    ) -> Result<Interview, PortalError> {
        let interview = Interview {
            id: InterviewId::next(),
            application_id: application.id.clone(),
            company_id: company_id.clone(),
            scheduled_date: slot.date,
            scheduled_time: slot.time,
            mode: slot.mode,
            interviewer: non_blank(slot.interviewer),
            status: InterviewStatus::Scheduled,
            created_at: Utc::now(),
        };
        let stored = self.store.insert_interview(interview)?;
        tracing::info!(
            interview = %stored.id,
            application = %application.id,
            date = %stored.scheduled_date,
            "interview scheduled"
        );
        Ok(stored)
    }

    /// Company flow: shortlists the pair when it never applied, then schedules.
    pub fn schedule_for_pair(
        &self,
        student_id: &StudentId,
        job_id: &JobId,
        company_id: &CompanyId,
        slot: InterviewSlot,
    ) -> Result<Interview, PortalError> {
        let application = resolve_or_create(
            self.store.as_ref(),
            student_id,
            job_id,
            ApplicationStatus::Shortlisted,
        )?;
        let interview = self.schedule(&application, company_id, slot)?;
        self.notify_student(student_id, job_id, &interview);
        Ok(interview)
    }

    /// Most recent date first, optionally narrowed by status and a title/company search.
    pub fn student_interviews(
        &self,
        student_id: &StudentId,
        filter: &InterviewFilter,
    ) -> Result<Vec<StudentInterviewView>, PortalError> {
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
            .map(str::to_lowercase);

        let mut views = Vec::new();
        for application in self.store.applications_for_student(student_id)? {
            let Some(job) = self.store.fetch_job(&application.job_id)? else {
                continue;
            };
            for interview in self.store.interviews_for_application(&application.id)? {
                if filter.status.is_some_and(|status| status != interview.status) {
                    continue;
                }
                if let Some(needle) = &needle {
                    if !job.title.to_lowercase().contains(needle)
                        && !job.company_name.to_lowercase().contains(needle)
                    {
                        continue;
                    }
                }
                views.push(StudentInterviewView {
                    interview,
                    job_id: job.id.clone(),
                    job_title: job.title.clone(),
                    company_name: job.company_name.clone(),
                    location: job.location.clone(),
                });
            }
        }

        views.sort_by(|a, b| {
            (b.interview.scheduled_date, b.interview.scheduled_time)
                .cmp(&(a.interview.scheduled_date, a.interview.scheduled_time))
        });
        Ok(views)
    }

    pub fn set_interview_status(
        &self,
        id: &InterviewId,
        status: InterviewStatus,
    ) -> Result<Interview, PortalError> {
        match self.store.update_interview_status(id, status) {
            Ok(interview) => Ok(interview),
            Err(RepositoryError::NotFound) => Err(PortalError::not_found("interview", id)),
            Err(err) => Err(err.into()),
        }
    }

    fn notify_student(&self, student_id: &StudentId, job_id: &JobId, interview: &Interview) {
        let student = self.store.fetch_student(student_id);
        let job = self.store.fetch_job(job_id);
        let (Ok(Some(student)), Ok(Some(job))) = (student, job) else {
            tracing::warn!(interview = %interview.id, "interview notification skipped");
            return;
        };
        deliver(
            self.notifications.as_ref(),
            Notification::new(
                student.profile_id,
                NotificationKind::Interview,
                format!(
                    "Interview scheduled for {} role on {}",
                    job.title,
                    interview.scheduled_date.format("%B %-d, %Y")
                ),
            ),
        );
    }
}
