use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Company, CompanyId, Job, JobId, Student};
use super::error::{PortalError, ValidationError};
use super::profile::check_cgpa;
use super::repository::JobRepository;
use crate::config::PortalConfig;

/// Decides which postings a student may see and apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityPolicy {
    enforce_branch: bool,
}

impl EligibilityPolicy {
    pub const fn new(enforce_branch: bool) -> Self {
        Self { enforce_branch }
    }

    pub fn from_config(config: &PortalConfig) -> Self {
        Self::new(config.enforce_branch_eligibility)
    }

    pub const fn enforces_branch(&self) -> bool {
        self.enforce_branch
    }

    /// CGPA floor always applies; a student without a CGPA is treated as 0.0. An empty branch
    /// list on the posting means every branch qualifies.
    pub fn is_eligible(&self, student: &Student, job: &Job) -> bool {
        if student.cgpa.unwrap_or(0.0) < job.min_cgpa {
            return false;
        }
        if !self.enforce_branch || job.eligible_branches.is_empty() {
            return true;
        }
        student.branch.as_deref().is_some_and(|branch| {
            let branch = branch.trim();
            job.eligible_branches
                .iter()
                .any(|eligible| eligible.trim().eq_ignore_ascii_case(branch))
        })
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Advertised compensation in lakhs per annum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CtcRange {
    pub low: f32,
    /// `None` for open-ended figures such as `10+ LPA`.
    pub high: Option<f32>,
}

impl CtcRange {
    /// Reads the first one or two numbers out of strings like `6-8 LPA`, `10+ LPA` or `12 LPA`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut numbers = Vec::with_capacity(2);
        let mut current = String::new();
        let mut open_ended = false;
        for ch in raw.chars().chain(std::iter::once(' ')) {
            if ch.is_ascii_digit() || (ch == '.' && !current.is_empty()) {
                current.push(ch);
                continue;
            }
            if !current.is_empty() {
                numbers.push(current.trim_end_matches('.').parse::<f32>().ok()?);
                current.clear();
                if numbers.len() == 2 {
                    break;
                }
            }
            if ch == '+' && numbers.len() == 1 {
                open_ended = true;
                break;
            }
        }

        match numbers.as_slice() {
            [low] if open_ended => Some(Self {
                low: *low,
                high: None,
            }),
            [single] => Some(Self {
                low: *single,
                high: Some(*single),
            }),
            [low, high] => Some(Self {
                low: low.min(*high),
                high: Some(low.max(*high)),
            }),
            _ => None,
        }
    }

    pub fn midpoint(&self) -> f32 {
        match self.high {
            Some(high) => (self.low + high) / 2.0,
            None => self.low,
        }
    }
}

/// Compensation bands offered by the job search filter; each is `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CtcBand {
    #[serde(rename = "0-5")]
    UpToFive,
    #[serde(rename = "5-7")]
    FiveToSeven,
    #[serde(rename = "7-10")]
    SevenToTen,
    #[serde(rename = "10+")]
    TenPlus,
}

impl CtcBand {
    pub fn contains(self, lpa: f32) -> bool {
        match self {
            CtcBand::UpToFive => lpa < 5.0,
            CtcBand::FiveToSeven => (5.0..7.0).contains(&lpa),
            CtcBand::SevenToTen => (7.0..10.0).contains(&lpa),
            CtcBand::TenPlus => lpa >= 10.0,
        }
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Job search predicate; unset or blank fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub ctc: Option<CtcBand>,
}

impl JobFilter {
    pub fn is_empty(&self) -> bool {
        active(&self.search).is_none()
            && active(&self.company).is_none()
            && active(&self.branch).is_none()
            && active(&self.job_type).is_none()
            && active(&self.location).is_none()
            && self.ctc.is_none()
    }

    pub fn matches(&self, job: &Job) -> bool {
        if let Some(search) = active(&self.search) {
            let needle = search.to_lowercase();
            if !(contains_ignore_case(&job.title, &needle)
                || contains_ignore_case(&job.company_name, &needle)
                || contains_ignore_case(&job.description, &needle))
            {
                return false;
            }
        }
        if let Some(company) = active(&self.company) {
            if !job.company_name.trim().eq_ignore_ascii_case(company) {
                return false;
            }
        }
        if let Some(branch) = active(&self.branch) {
            if !job
                .eligible_branches
                .iter()
                .any(|eligible| eligible.trim().eq_ignore_ascii_case(branch))
            {
                return false;
            }
        }
        if let Some(job_type) = active(&self.job_type) {
            if !job.job_type.trim().eq_ignore_ascii_case(job_type) {
                return false;
            }
        }
        if let Some(location) = active(&self.location) {
            if !job.location.trim().eq_ignore_ascii_case(location) {
                return false;
            }
        }
        if let Some(band) = self.ctc {
            // Unparseable compensation never matches a band.
            match CtcRange::parse(&job.ctc) {
                Some(range) if band.contains(range.midpoint()) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Order-preserving selection of the jobs that satisfy `predicate`.
pub fn filter(jobs: &[Job], predicate: &JobFilter) -> Vec<Job> {
    jobs.iter()
        .filter(|job| predicate.matches(job))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobCard {
    #[serde(flatten)]
    pub job: Job,
    pub applied: bool,
    pub interested: bool,
}

/// "Load more" window: page `n` carries the first `(n + 1) * page_size` matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobPage {
    pub jobs: Vec<JobCard>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub has_more: bool,
}

pub fn load_more_window(total: usize, page: usize, page_size: usize) -> (usize, bool) {
    let shown = page
        .saturating_add(1)
        .saturating_mul(page_size)
        .min(total);
    (shown, shown < total)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub locations: Vec<String>,
    pub companies: Vec<String>,
}

pub fn filter_options(jobs: &[Job]) -> FilterOptions {
    let locations: BTreeSet<String> = jobs
        .iter()
        .map(|job| job.location.trim().to_string())
        .filter(|location| !location.is_empty())
        .collect();
    let companies: BTreeSet<String> = jobs
        .iter()
        .map(|job| job.company_name.trim().to_string())
        .filter(|company| !company.is_empty())
        .collect();
    FilterOptions {
        locations: locations.into_iter().collect(),
        companies: companies.into_iter().collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityBadge {
    Applied,
    Eligible,
    NotEligible,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDetails {
    pub job: Job,
    pub eligibility: EligibilityBadge,
}

pub const DEFAULT_JOB_TYPE: &str = "Full-time";

fn default_job_type() -> String {
    DEFAULT_JOB_TYPE.to_string()
}

/// New posting as submitted by a company member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub ctc: String,
    pub location: String,
    #[serde(default = "default_job_type")]
    pub job_type: String,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub min_cgpa: f32,
    #[serde(default)]
    pub eligible_branches: Vec<String>,
}

fn trimmed_entries(entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

impl JobPosting {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("location", &self.location),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::Required { field });
            }
        }
        check_cgpa(self.min_cgpa).map_err(|_| ValidationError::OutOfRange {
            field: "min_cgpa",
            min: super::profile::CGPA_MIN,
            max: super::profile::CGPA_MAX,
            found: self.min_cgpa,
        })
    }

    fn into_job(self, company: &Company) -> Job {
        let job_type = match self.job_type.trim() {
            "" => default_job_type(),
            other => other.to_string(),
        };
        Job {
            id: JobId::next(),
            company_id: company.id.clone(),
            company_name: company.name.clone(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            requirements: trimmed_entries(self.requirements),
            ctc: self.ctc.trim().to_string(),
            location: self.location.trim().to_string(),
            job_type,
            deadline: self.deadline,
            min_cgpa: self.min_cgpa,
            eligible_branches: trimmed_entries(self.eligible_branches),
            created_at: Utc::now(),
        }
    }
}

/// Read side of the job board plus company posting.
pub struct JobCatalog<S> {
    store: Arc<S>,
    policy: EligibilityPolicy,
    page_size: usize,
}

impl<S> JobCatalog<S>
where
    S: JobRepository,
{
    pub fn new(store: Arc<S>, policy: EligibilityPolicy, page_size: usize) -> Self {
        Self {
            store,
            policy,
            page_size: page_size.max(1),
        }
    }

    pub fn policy(&self) -> EligibilityPolicy {
        self.policy
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn job(&self, id: &JobId) -> Result<Job, PortalError> {
        self.store
            .fetch_job(id)?
            .ok_or_else(|| PortalError::not_found("job", id))
    }

    /// Newest first; ties keep store order.
    pub fn list_eligible_jobs(&self, student: &Student) -> Result<Vec<Job>, PortalError> {
        let jobs = self.store.list_jobs()?;
        Ok(jobs
            .into_iter()
            .filter(|job| self.policy.is_eligible(student, job))
            .collect())
    }

    pub fn browse(
        &self,
        student: &Student,
        predicate: &JobFilter,
        page: usize,
        applied: &HashSet<JobId>,
        interested: &HashSet<JobId>,
    ) -> Result<JobPage, PortalError> {
        let matches = filter(&self.list_eligible_jobs(student)?, predicate);
        let total = matches.len();
        let (shown, has_more) = load_more_window(total, page, self.page_size);

        let jobs = matches
            .into_iter()
            .take(shown)
            .map(|job| JobCard {
                applied: applied.contains(&job.id),
                interested: interested.contains(&job.id),
                job,
            })
            .collect();

        Ok(JobPage {
            jobs,
            page,
            page_size: self.page_size,
            total,
            has_more,
        })
    }

    pub fn filter_options(&self, student: &Student) -> Result<FilterOptions, PortalError> {
        Ok(filter_options(&self.list_eligible_jobs(student)?))
    }

    pub fn job_details(
        &self,
        student: &Student,
        id: &JobId,
        already_applied: bool,
    ) -> Result<JobDetails, PortalError> {
        let job = self.job(id)?;
        let eligibility = if already_applied {
            EligibilityBadge::Applied
        } else if self.policy.is_eligible(student, &job) {
            EligibilityBadge::Eligible
        } else {
            EligibilityBadge::NotEligible
        };
        Ok(JobDetails { job, eligibility })
    }

    pub fn post_job(&self, company: &Company, posting: JobPosting) -> Result<Job, PortalError> {
        posting.validate()?;
        let job = self.store.insert_job(posting.into_job(company))?;
        tracing::info!(job = %job.id, company = %company.id, title = %job.title, "job posted");
        Ok(job)
    }

    pub fn company_jobs(&self, company_id: &CompanyId) -> Result<Vec<Job>, PortalError> {
        Ok(self.store.jobs_for_company(company_id)?)
    }
}
