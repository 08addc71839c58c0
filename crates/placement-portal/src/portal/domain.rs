use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! sequenced_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Allocate the next identifier in this table's sequence.
            pub fn next() -> Self {
                static SEQUENCE: std::sync::atomic::AtomicU64 =
                    std::sync::atomic::AtomicU64::new(1);
                let id = SEQUENCE.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                Self(format!(concat!($prefix, "-{:06}"), id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

sequenced_id!(
    /// Identity issued by the authentication provider.
    AuthUserId,
    "auth"
);
sequenced_id!(ProfileId, "usr");
sequenced_id!(StudentId, "stu");
sequenced_id!(CompanyId, "co");
sequenced_id!(JobId, "job");
sequenced_id!(
    /// Identifier wrapper for submitted applications.
    ApplicationId,
    "app"
);
sequenced_id!(InterviewId, "ivw");
sequenced_id!(NotificationId, "ntf");

/// Portal roles; each sees a different dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Company,
    Staff,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Company => "company",
            Role::Staff => "staff",
        }
    }

    pub const fn dashboard(self) -> &'static str {
        match self {
            Role::Student => "dashboard-student.html",
            Role::Company => "dashboard-company.html",
            Role::Staff => "dashboard-staff.html",
        }
    }
}

/// Account-level record shared by every role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: ProfileId,
    pub auth_user_id: AuthUserId,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub profile_id: ProfileId,
    pub full_name: String,
    pub email: String,
    pub branch: Option<String>,
    pub passing_year: Option<u16>,
    pub cgpa: Option<f32>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub resume_url: Option<String>,
    pub profile_complete: u8,
}

impl Student {
    /// Empty row for a profile that has never filled in student details.
    pub fn blank(profile: &UserProfile) -> Self {
        Self {
            id: StudentId::next(),
            profile_id: profile.id.clone(),
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
            branch: None,
            passing_year: None,
            cgpa: None,
            phone: None,
            skills: Vec::new(),
            resume_url: None,
            profile_complete: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub status: CompanyStatus,
}

/// Links a company-role profile to the company it recruits for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyMember {
    pub profile_id: ProfileId,
    pub company_id: CompanyId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub company_id: CompanyId,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    /// Compensation range as advertised, e.g. `6-8 LPA`.
    pub ctc: String,
    pub location: String,
    pub job_type: String,
    pub deadline: NaiveDate,
    pub min_cgpa: f32,
    pub eligible_branches: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Status tracked throughout the placement pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Shortlisted,
    InterviewScheduled,
    Selected,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::Selected,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::InterviewScheduled => "interview_scheduled",
            ApplicationStatus::Selected => "selected",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending Review",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::InterviewScheduled => "Interview Scheduled",
            ApplicationStatus::Selected => "Selected",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub student_id: StudentId,
    pub job_id: JobId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

/// Lightweight "interested" marker, independent of any application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub student_id: StudentId,
    pub job_id: JobId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterviewMode {
    #[default]
    #[serde(rename = "online")]
    Online,
    #[serde(rename = "on_site", alias = "on-site")]
    OnSite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

impl InterviewStatus {
    pub const fn display_name(self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "Scheduled",
            InterviewStatus::Completed => "Completed",
            InterviewStatus::Cancelled => "Cancelled",
            InterviewStatus::Rescheduled => "Rescheduled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interview {
    pub id: InterviewId,
    pub application_id: ApplicationId,
    pub company_id: CompanyId,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub mode: InterviewMode,
    pub interviewer: Option<String>,
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Application,
    Interview,
    Shortlist,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub profile_id: ProfileId,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(profile_id: ProfileId, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: NotificationId::next(),
            profile_id,
            message: message.into(),
            kind,
            read: false,
            created_at: Utc::now(),
        }
    }
}
