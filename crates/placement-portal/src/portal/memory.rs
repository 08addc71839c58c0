//! Process-local store honoring the same uniqueness rules as the hosted tables.

use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, AuthUserId, Company, CompanyId, CompanyMember,
    CompanyStatus, Interest, Interview, InterviewId, InterviewStatus, Job, JobId, Notification,
    NotificationId, ProfileId, Student, StudentId, UserProfile,
};
use super::repository::{
    ApplicationRepository, CompanyRepository, InterestRepository, InterviewRepository,
    JobRepository, NotificationError, NotificationPublisher, NotificationRepository,
    ProfileRepository, RepositoryError, StudentRepository,
};

#[derive(Default)]
struct Tables {
    profiles: Mutex<Vec<UserProfile>>,
    students: Mutex<Vec<Student>>,
    companies: Mutex<Vec<Company>>,
    members: Mutex<Vec<CompanyMember>>,
    jobs: Mutex<Vec<Job>>,
    applications: Mutex<Vec<Application>>,
    interests: Mutex<Vec<Interest>>,
    interviews: Mutex<Vec<Interview>>,
    notifications: Mutex<Vec<Notification>>,
}

/// In-memory implementation of every portal table. Clones share the same tables.
#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

fn lock<T>(table: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    table
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every interview on record, in insertion order.
    pub fn interviews(&self) -> Result<Vec<Interview>, RepositoryError> {
        Ok(lock(&self.tables.interviews)?.clone())
    }
}

impl ProfileRepository for MemoryStore {
    fn insert_profile(&self, profile: UserProfile) -> Result<UserProfile, RepositoryError> {
        let mut guard = lock(&self.tables.profiles)?;
        if guard
            .iter()
            .any(|existing| existing.auth_user_id == profile.auth_user_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(profile.clone());
        Ok(profile)
    }

    fn profile_for_auth_user(
        &self,
        auth_user_id: &AuthUserId,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        let guard = lock(&self.tables.profiles)?;
        Ok(guard
            .iter()
            .find(|profile| &profile.auth_user_id == auth_user_id)
            .cloned())
    }

    fn fetch_profile(&self, id: &ProfileId) -> Result<Option<UserProfile>, RepositoryError> {
        let guard = lock(&self.tables.profiles)?;
        Ok(guard.iter().find(|profile| &profile.id == id).cloned())
    }

    fn rename_profile(&self, id: &ProfileId, full_name: &str) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.tables.profiles)?;
        let profile = guard
            .iter_mut()
            .find(|profile| &profile.id == id)
            .ok_or(RepositoryError::NotFound)?;
        profile.full_name = full_name.to_string();
        Ok(())
    }
}

impl StudentRepository for MemoryStore {
    fn insert_student(&self, student: Student) -> Result<Student, RepositoryError> {
        let mut guard = lock(&self.tables.students)?;
        if guard
            .iter()
            .any(|existing| existing.profile_id == student.profile_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(student.clone());
        Ok(student)
    }

    fn fetch_student(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError> {
        let guard = lock(&self.tables.students)?;
        Ok(guard.iter().find(|student| &student.id == id).cloned())
    }

    fn student_for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Option<Student>, RepositoryError> {
        let guard = lock(&self.tables.students)?;
        Ok(guard
            .iter()
            .find(|student| &student.profile_id == profile_id)
            .cloned())
    }

    fn update_student(&self, student: Student) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.tables.students)?;
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == student.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = student;
        Ok(())
    }

    fn list_students(&self) -> Result<Vec<Student>, RepositoryError> {
        Ok(lock(&self.tables.students)?.clone())
    }
}

impl CompanyRepository for MemoryStore {
    fn insert_company(&self, company: Company) -> Result<Company, RepositoryError> {
        let mut guard = lock(&self.tables.companies)?;
        if guard
            .iter()
            .any(|existing| existing.name.eq_ignore_ascii_case(&company.name))
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(company.clone());
        Ok(company)
    }

    fn fetch_company(&self, id: &CompanyId) -> Result<Option<Company>, RepositoryError> {
        let guard = lock(&self.tables.companies)?;
        Ok(guard.iter().find(|company| &company.id == id).cloned())
    }

    fn company_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError> {
        let guard = lock(&self.tables.companies)?;
        Ok(guard
            .iter()
            .find(|company| company.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    fn set_company_status(
        &self,
        id: &CompanyId,
        status: CompanyStatus,
    ) -> Result<Company, RepositoryError> {
        let mut guard = lock(&self.tables.companies)?;
        let company = guard
            .iter_mut()
            .find(|company| &company.id == id)
            .ok_or(RepositoryError::NotFound)?;
        company.status = status;
        Ok(company.clone())
    }

    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        Ok(lock(&self.tables.companies)?.clone())
    }

    fn link_member(&self, member: CompanyMember) -> Result<CompanyMember, RepositoryError> {
        let mut guard = lock(&self.tables.members)?;
        if guard
            .iter()
            .any(|existing| existing.profile_id == member.profile_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(member.clone());
        Ok(member)
    }

    fn membership_for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Option<CompanyMember>, RepositoryError> {
        let guard = lock(&self.tables.members)?;
        Ok(guard
            .iter()
            .find(|member| &member.profile_id == profile_id)
            .cloned())
    }
}

impl JobRepository for MemoryStore {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut guard = lock(&self.tables.jobs)?;
        if guard.iter().any(|existing| existing.id == job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(job.clone());
        Ok(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = lock(&self.tables.jobs)?;
        Ok(guard.iter().find(|job| &job.id == id).cloned())
    }

    fn list_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        let mut jobs = lock(&self.tables.jobs)?.clone();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    fn jobs_for_company(&self, company_id: &CompanyId) -> Result<Vec<Job>, RepositoryError> {
        Ok(self
            .list_jobs()?
            .into_iter()
            .filter(|job| &job.company_id == company_id)
            .collect())
    }
}

impl ApplicationRepository for MemoryStore {
    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        let mut guard = lock(&self.tables.applications)?;
        if guard.iter().any(|existing| {
            existing.id == application.id
                || (existing.student_id == application.student_id
                    && existing.job_id == application.job_id)
        }) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(application.clone());
        Ok(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = lock(&self.tables.applications)?;
        Ok(guard.iter().find(|application| &application.id == id).cloned())
    }

    fn application_for(
        &self,
        student_id: &StudentId,
        job_id: &JobId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = lock(&self.tables.applications)?;
        Ok(guard
            .iter()
            .find(|application| {
                &application.student_id == student_id && &application.job_id == job_id
            })
            .cloned())
    }

    fn update_application_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, RepositoryError> {
        let mut guard = lock(&self.tables.applications)?;
        let application = guard
            .iter_mut()
            .find(|application| &application.id == id)
            .ok_or(RepositoryError::NotFound)?;
        application.status = status;
        Ok(application.clone())
    }

    fn applications_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let guard = lock(&self.tables.applications)?;
        Ok(guard
            .iter()
            .filter(|application| &application.student_id == student_id)
            .cloned()
            .collect())
    }

    fn applications_for_job(&self, job_id: &JobId) -> Result<Vec<Application>, RepositoryError> {
        let guard = lock(&self.tables.applications)?;
        Ok(guard
            .iter()
            .filter(|application| &application.job_id == job_id)
            .cloned()
            .collect())
    }

    fn list_applications(&self) -> Result<Vec<Application>, RepositoryError> {
        Ok(lock(&self.tables.applications)?.clone())
    }
}

impl InterestRepository for MemoryStore {
    fn insert_interest(&self, interest: Interest) -> Result<Interest, RepositoryError> {
        let mut guard = lock(&self.tables.interests)?;
        if guard.iter().any(|existing| {
            existing.student_id == interest.student_id && existing.job_id == interest.job_id
        }) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(interest.clone());
        Ok(interest)
    }

    fn interests_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<Interest>, RepositoryError> {
        let guard = lock(&self.tables.interests)?;
        Ok(guard
            .iter()
            .filter(|interest| &interest.student_id == student_id)
            .cloned()
            .collect())
    }
}

impl InterviewRepository for MemoryStore {
    fn insert_interview(&self, interview: Interview) -> Result<Interview, RepositoryError> {
        let mut guard = lock(&self.tables.interviews)?;
        if guard.iter().any(|existing| existing.id == interview.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(interview.clone());
        Ok(interview)
    }

    fn interviews_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        let guard = lock(&self.tables.interviews)?;
        Ok(guard
            .iter()
            .filter(|interview| &interview.application_id == application_id)
            .cloned()
            .collect())
    }

    fn update_interview_status(
        &self,
        id: &InterviewId,
        status: InterviewStatus,
    ) -> Result<Interview, RepositoryError> {
        let mut guard = lock(&self.tables.interviews)?;
        let interview = guard
            .iter_mut()
            .find(|interview| &interview.id == id)
            .ok_or(RepositoryError::NotFound)?;
        interview.status = status;
        Ok(interview.clone())
    }
}

impl NotificationRepository for MemoryStore {
    fn notifications_for(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let guard = lock(&self.tables.notifications)?;
        let mut notifications: Vec<Notification> = guard
            .iter()
            .filter(|notification| &notification.profile_id == profile_id)
            .cloned()
            .collect();
        notifications.reverse();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    fn mark_read(
        &self,
        id: &NotificationId,
        profile_id: &ProfileId,
    ) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.tables.notifications)?;
        let notification = guard
            .iter_mut()
            .find(|notification| &notification.id == id && &notification.profile_id == profile_id)
            .ok_or(RepositoryError::NotFound)?;
        notification.read = true;
        Ok(())
    }
}

impl NotificationPublisher for MemoryStore {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        let mut guard = self
            .tables
            .notifications
            .lock()
            .map_err(|_| NotificationError::Transport("store mutex poisoned".to_string()))?;
        guard.push(notification);
        Ok(())
    }
}
