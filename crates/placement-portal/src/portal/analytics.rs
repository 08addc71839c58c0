use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use super::catalog::CtcRange;
use super::domain::{Application, ApplicationStatus, Company, CompanyId, CompanyStatus, Job, Student};
use super::error::PortalError;
use super::repository::{
    ApplicationRepository, CompanyRepository, JobRepository, RepositoryError, StudentRepository,
};

const TOP_COMPANIES: usize = 3;
const UNSPECIFIED_BRANCH: &str = "Unspecified";

/// Salary buckets in display order.
pub const SALARY_BUCKETS: [&str; 5] = ["<3 LPA", "3-5 LPA", "5-7 LPA", "7-10 LPA", "10+ LPA"];

pub fn salary_bucket(lpa: f32) -> &'static str {
    if lpa < 3.0 {
        SALARY_BUCKETS[0]
    } else if lpa < 5.0 {
        SALARY_BUCKETS[1]
    } else if lpa < 7.0 {
        SALARY_BUCKETS[2]
    } else if lpa < 10.0 {
        SALARY_BUCKETS[3]
    } else {
        SALARY_BUCKETS[4]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementAnalytics {
    pub total_students: usize,
    pub total_companies: usize,
    pub total_jobs: usize,
    pub total_applications: usize,
    /// Percent of students holding at least one selected application.
    pub placement_rate: u8,
    pub status_breakdown: BTreeMap<ApplicationStatus, usize>,
    pub branch_wise_placements: BTreeMap<String, usize>,
    pub top_recruiting_companies: Vec<String>,
    /// Mean CTC midpoint of selected offers, in LPA, one decimal place.
    pub average_ctc: Option<f32>,
    pub salary_distribution: BTreeMap<&'static str, usize>,
}

pub fn summarize(
    students: &[Student],
    companies: &[Company],
    jobs: &[Job],
    applications: &[Application],
) -> PlacementAnalytics {
    let jobs_by_id: HashMap<_, _> = jobs.iter().map(|job| (&job.id, job)).collect();

    let mut status_breakdown: BTreeMap<ApplicationStatus, usize> =
        ApplicationStatus::ALL.into_iter().map(|status| (status, 0)).collect();
    for application in applications {
        *status_breakdown.entry(application.status).or_default() += 1;
    }

    let selected: Vec<&Application> = applications
        .iter()
        .filter(|application| application.status == ApplicationStatus::Selected)
        .collect();
    let placed: HashSet<_> = selected
        .iter()
        .map(|application| &application.student_id)
        .collect();

    let placement_rate = if students.is_empty() {
        0
    } else {
        let placed_students = students
            .iter()
            .filter(|student| placed.contains(&student.id))
            .count();
        ((placed_students as f32 / students.len() as f32) * 100.0).round() as u8
    };

    let mut branch_wise_placements = BTreeMap::new();
    for student in students.iter().filter(|student| placed.contains(&student.id)) {
        let branch = student
            .branch
            .as_deref()
            .map(str::trim)
            .filter(|branch| !branch.is_empty())
            .unwrap_or(UNSPECIFIED_BRANCH);
        *branch_wise_placements.entry(branch.to_string()).or_insert(0) += 1;
    }

    let mut selections: HashMap<&str, usize> = HashMap::new();
    let mut offers = Vec::new();
    for application in &selected {
        let Some(job) = jobs_by_id.get(&application.job_id) else {
            continue;
        };
        *selections.entry(job.company_name.as_str()).or_insert(0) += 1;
        if let Some(range) = CtcRange::parse(&job.ctc) {
            offers.push(range.midpoint());
        }
    }
    let mut ranked: Vec<(&str, usize)> = selections.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top_recruiting_companies = ranked
        .into_iter()
        .take(TOP_COMPANIES)
        .map(|(name, _)| name.to_string())
        .collect();

    let average_ctc = if offers.is_empty() {
        None
    } else {
        let mean = offers.iter().sum::<f32>() / offers.len() as f32;
        Some((mean * 10.0).round() / 10.0)
    };

    let mut salary_distribution: BTreeMap<&'static str, usize> =
        SALARY_BUCKETS.into_iter().map(|bucket| (bucket, 0)).collect();
    for offer in &offers {
        *salary_distribution.entry(salary_bucket(*offer)).or_default() += 1;
    }

    PlacementAnalytics {
        total_students: students.len(),
        total_companies: companies.len(),
        total_jobs: jobs.len(),
        total_applications: applications.len(),
        placement_rate,
        status_breakdown,
        branch_wise_placements,
        top_recruiting_companies,
        average_ctc,
        salary_distribution,
    }
}

/// Staff dashboard queries.
pub struct AnalyticsService<S> {
    store: Arc<S>,
}

impl<S> AnalyticsService<S>
where
    S: StudentRepository + CompanyRepository + JobRepository + ApplicationRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn snapshot(&self) -> Result<PlacementAnalytics, PortalError> {
        let students = self.store.list_students()?;
        let companies = self.store.list_companies()?;
        let jobs = self.store.list_jobs()?;
        let applications = self.store.list_applications()?;
        Ok(summarize(&students, &companies, &jobs, &applications))
    }

    pub fn set_company_status(
        &self,
        id: &CompanyId,
        status: CompanyStatus,
    ) -> Result<Company, PortalError> {
        match self.store.set_company_status(id, status) {
            Ok(company) => {
                tracing::info!(company = %company.id, status = ?status, "company status changed");
                Ok(company)
            }
            Err(RepositoryError::NotFound) => Err(PortalError::not_found("company", id)),
            Err(err) => Err(err.into()),
        }
    }
}
