use chrono::{Duration, NaiveDate};
use metrics_exporter_prometheus::PrometheusHandle;
use placement_portal::portal::domain::{Company, CompanyId, CompanyStatus, Job};
use placement_portal::portal::profile::{CGPA_MAX, CGPA_MIN};
use placement_portal::portal::repository::{CompanyRepository, PortalStore};
use placement_portal::portal::{IdentityProvider, JobPosting, PlacementPortal, PortalError};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) struct SeedCompany {
    pub(crate) name: &'static str,
    pub(crate) industry: &'static str,
    pub(crate) website: &'static str,
    pub(crate) status: CompanyStatus,
}

pub(crate) struct SeedJob {
    pub(crate) company: &'static str,
    pub(crate) title: &'static str,
    pub(crate) description: &'static str,
    pub(crate) requirements: &'static [&'static str],
    pub(crate) ctc: &'static str,
    pub(crate) location: &'static str,
    pub(crate) open_days: i64,
    pub(crate) min_cgpa: f32,
    pub(crate) eligible_branches: &'static [&'static str],
}

pub(crate) const SEED_COMPANIES: &[SeedCompany] = &[
    SeedCompany {
        name: "TechCorp Solutions",
        industry: "Software",
        website: "techcorp.com",
        status: CompanyStatus::Approved,
    },
    SeedCompany {
        name: "DataFlow Inc",
        industry: "Data Analytics",
        website: "dataflow.com",
        status: CompanyStatus::Pending,
    },
    SeedCompany {
        name: "CloudSys Ltd",
        industry: "Cloud Computing",
        website: "cloudsys.com",
        status: CompanyStatus::Approved,
    },
    SeedCompany {
        name: "FinTech Pro",
        industry: "Financial Technology",
        website: "fintechpro.com",
        status: CompanyStatus::Approved,
    },
];

pub(crate) const SEED_JOBS: &[SeedJob] = &[
    SeedJob {
        company: "TechCorp Solutions",
        title: "Software Developer",
        description: "Full stack development role",
        requirements: &["Python", "React", "SQL"],
        ctc: "6-8 LPA",
        location: "Bangalore",
        open_days: 30,
        min_cgpa: 7.5,
        eligible_branches: &["Computer Science", "Information Technology"],
    },
    SeedJob {
        company: "DataFlow Inc",
        title: "Data Analyst",
        description: "Analyze business data and create insights",
        requirements: &["Python", "SQL", "Excel", "Tableau"],
        ctc: "5-7 LPA",
        location: "Hyderabad",
        open_days: 35,
        min_cgpa: 7.0,
        eligible_branches: &["Computer Science", "Electronics", "Mathematics"],
    },
    SeedJob {
        company: "CloudSys Ltd",
        title: "Cloud Engineer",
        description: "Manage cloud infrastructure and deployments",
        requirements: &["AWS", "Docker", "Kubernetes", "Linux"],
        ctc: "7-9 LPA",
        location: "Mumbai",
        open_days: 40,
        min_cgpa: 7.5,
        eligible_branches: &["Computer Science", "Information Technology"],
    },
    SeedJob {
        company: "FinTech Pro",
        title: "Backend Developer",
        description: "Build scalable backend systems",
        requirements: &["Java", "Spring Boot", "MySQL", "Redis"],
        ctc: "6-8 LPA",
        location: "Pune",
        open_days: 33,
        min_cgpa: 7.0,
        eligible_branches: &["Computer Science", "Information Technology", "Electronics"],
    },
];

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn seed_company<S: CompanyRepository + ?Sized>(
    store: &S,
    seed: &SeedCompany,
) -> Result<Company, PortalError> {
    if let Some(existing) = store.company_by_name(seed.name)? {
        return Ok(existing);
    }
    Ok(store.insert_company(Company {
        id: CompanyId::next(),
        name: seed.name.to_string(),
        industry: Some(seed.industry.to_string()),
        website: Some(seed.website.to_string()),
        status: seed.status,
    })?)
}

/// Loads the sample companies and postings; deadlines are relative to `today`.
pub(crate) fn seed_catalog<S, P>(
    portal: &PlacementPortal<S, P>,
    today: NaiveDate,
) -> Result<Vec<Job>, PortalError>
where
    S: PortalStore + 'static,
    P: IdentityProvider + 'static,
{
    let mut companies = Vec::with_capacity(SEED_COMPANIES.len());
    for seed in SEED_COMPANIES {
        companies.push(seed_company(portal.store().as_ref(), seed)?);
    }

    let mut jobs = Vec::with_capacity(SEED_JOBS.len());
    for seed in SEED_JOBS {
        let Some(company) = companies.iter().find(|company| company.name == seed.company) else {
            continue;
        };
        let posting = JobPosting {
            title: seed.title.to_string(),
            description: seed.description.to_string(),
            requirements: owned(seed.requirements),
            ctc: seed.ctc.to_string(),
            location: seed.location.to_string(),
            job_type: "Full-time".to_string(),
            deadline: today + Duration::days(seed.open_days),
            min_cgpa: seed.min_cgpa,
            eligible_branches: owned(seed.eligible_branches),
        };
        jobs.push(portal.catalog().post_job(company, posting)?);
    }

    info!(
        companies = companies.len(),
        jobs = jobs.len(),
        "seeded placement catalog"
    );
    Ok(jobs)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_cgpa(raw: &str) -> Result<f32, String> {
    let value: f32 = raw
        .trim()
        .parse()
        .map_err(|err| format!("failed to parse '{raw}' as a grade point average ({err})"))?;
    if !(CGPA_MIN..=CGPA_MAX).contains(&value) {
        return Err(format!("cgpa must be between {CGPA_MIN} and {CGPA_MAX}"));
    }
    Ok(value)
}
