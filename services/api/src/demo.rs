use crate::infra::{parse_cgpa, parse_date, seed_catalog};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime};
use clap::Args;
use placement_portal::config::PortalConfig;
use placement_portal::error::AppError;
use placement_portal::portal::catalog::filter;
use placement_portal::portal::{
    ApplicationStatus, ApplyOutcome, CompanyDetails, InterviewMode, InterviewSlot, JobFilter,
    MemoryIdentityProvider, MemoryStore, PlacementAnalytics, PlacementPortal, PortalError,
    ProfileEdits, ProfileId, ReviewDecision, Role, SessionContext, SessionToken, SignInRequest,
    SignUpRequest, Student, StudentDetails, StudentId,
};
use std::sync::Arc;

const DEMO_PASSWORD: &str = "placement-demo";

type DemoPortal = PlacementPortal<MemoryStore, MemoryIdentityProvider>;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Date the demo treats as today (YYYY-MM-DD). Defaults to the local date.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Branch recorded for the demo student
    #[arg(long, default_value = "Computer Science")]
    pub(crate) branch: String,
    /// Grade point average recorded for the demo student
    #[arg(long, default_value = "8.5", value_parser = parse_cgpa)]
    pub(crate) cgpa: f32,
}

#[derive(Args, Debug)]
pub(crate) struct CatalogArgs {
    /// Student grade point average on the ten point scale
    #[arg(long, value_parser = parse_cgpa)]
    pub(crate) cgpa: f32,
    /// Student branch, matched against each job's eligible branches
    #[arg(long)]
    pub(crate) branch: String,
    /// Only list jobs whose title, company or description contains this text
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Ignore branch restrictions and gate on grade point average alone
    #[arg(long)]
    pub(crate) any_branch: bool,
}

fn demo_portal(config: &PortalConfig) -> Arc<DemoPortal> {
    Arc::new(PlacementPortal::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryIdentityProvider::new(false)),
        config,
    ))
}

fn register(
    portal: &DemoPortal,
    request: SignUpRequest,
    role: Role,
) -> Result<SessionContext, PortalError> {
    let email = request.email.clone();
    portal.accounts().sign_up(request)?;
    let signed_in = portal.accounts().sign_in(&SignInRequest {
        email,
        password: DEMO_PASSWORD.to_string(),
    })?;
    session(portal, &signed_in.token, role)
}

fn session(
    portal: &DemoPortal,
    token: &SessionToken,
    role: Role,
) -> Result<SessionContext, PortalError> {
    portal.authorize(Some(token), &[role])
}

fn account(full_name: &str, email: &str, role: Role) -> SignUpRequest {
    SignUpRequest {
        full_name: full_name.to_string(),
        email: email.to_string(),
        password: DEMO_PASSWORD.to_string(),
        role,
        student: None,
        company: None,
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        branch,
        cgpa,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let portal = demo_portal(&PortalConfig::default());
    let seeded = seed_catalog(portal.as_ref(), today)?;
    println!("Placement portal demo ({today})");
    println!("- {} sample postings loaded", seeded.len());

    let staff = register(
        &portal,
        account("Admin User", "admin@college.edu", Role::Staff),
        Role::Staff,
    )?;
    let recruiter = register(
        &portal,
        SignUpRequest {
            company: Some(CompanyDetails {
                name: "TechCorp Solutions".to_string(),
                industry: Some("Software".to_string()),
                website: Some("techcorp.com".to_string()),
            }),
            ..account("TechCorp HR", "hr@techcorp.com", Role::Company)
        },
        Role::Company,
    )?;
    let passing_year = u16::try_from(today.year()).unwrap_or(2025);
    let student_session = register(
        &portal,
        SignUpRequest {
            student: Some(StudentDetails {
                branch: branch.clone(),
                passing_year,
                cgpa,
            }),
            ..account("John Doe", "john.doe@college.edu", Role::Student)
        },
        Role::Student,
    )?;

    let student = portal.student_for(&student_session)?;
    let student = portal.profiles().save(
        &student,
        ProfileEdits {
            full_name: student.full_name.clone(),
            phone: Some("+91-9876543210".to_string()),
            branch: Some(branch.clone()),
            passing_year: Some(passing_year),
            cgpa: Some(cgpa),
            skills: vec![
                "Python".to_string(),
                "React".to_string(),
                "SQL".to_string(),
            ],
            resume_url: None,
        },
    )?;
    println!(
        "\nStudent {} ({}, cgpa {:.2}) profile {}% complete",
        student.full_name, branch, cgpa, student.profile_complete
    );

    let page = portal.browse_jobs(&student, &JobFilter::default(), 0)?;
    println!("Eligible postings: {}", page.total);
    for card in &page.jobs {
        println!(
            "  - {} at {} | {} | {} | apply by {}",
            card.job.title,
            card.job.company_name,
            card.job.ctc,
            card.job.location,
            card.job.deadline
        );
    }

    let Some(target) = page
        .jobs
        .iter()
        .find(|card| card.job.company_name == "TechCorp Solutions")
        .map(|card| card.job.clone())
    else {
        println!("\nNo TechCorp Solutions posting is open to this student; stopping here.");
        return Ok(());
    };

    let application = match portal.apply_to_job(&student, &target.id)? {
        ApplyOutcome::Applied(application) => application,
        ApplyOutcome::AlreadyApplied(job_id) => {
            println!("Already applied to {job_id}; stopping here.");
            return Ok(());
        }
    };
    println!(
        "\nApplied to {} ({})",
        target.title,
        application.status.display_name()
    );
    if let ApplyOutcome::AlreadyApplied(_) = portal.apply_to_job(&student, &target.id)? {
        println!("A second submission is reported as already applied");
    }
    for card in page.jobs.iter().filter(|card| card.job.id != target.id).take(1) {
        portal.mark_interest(&student, &card.job.id)?;
        println!("Marked interest in {} at {}", card.job.title, card.job.company_name);
    }

    let company = portal.company_for(&recruiter)?;
    let reviewed =
        portal.review_application(&company, &application.id, ReviewDecision::Approve)?;
    println!(
        "\n{} reviewed the application: {}",
        company.name,
        reviewed.status.display_name()
    );
    let interview = portal.schedule_candidate_interview(
        &company,
        &student.id,
        &target.id,
        InterviewSlot {
            date: today + Duration::days(7),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            mode: InterviewMode::Online,
            interviewer: Some("Tech Lead".to_string()),
        },
    )?;
    println!(
        "Interview booked for {} at {}",
        interview.scheduled_date,
        interview.scheduled_time.format("%H:%M")
    );

    session(&portal, &staff.token, Role::Staff)?;
    let selected = portal
        .applications()
        .set_status(&application.id, ApplicationStatus::Selected)?;
    println!(
        "Placement cell recorded the outcome: {}",
        selected.status.display_name()
    );

    let feed = portal.notifications().feed(&student.profile_id)?;
    println!("\nStudent notifications ({} unread)", feed.unread);
    for notification in &feed.notifications {
        println!("  - {}", notification.message);
    }

    render_analytics(&portal.analytics().snapshot()?);
    Ok(())
}

fn render_analytics(analytics: &PlacementAnalytics) {
    println!("\nPlacement analytics");
    println!(
        "- {} students | {} companies | {} jobs | {} applications",
        analytics.total_students,
        analytics.total_companies,
        analytics.total_jobs,
        analytics.total_applications
    );
    println!("- placement rate {}%", analytics.placement_rate);
    match analytics.average_ctc {
        Some(ctc) => println!("- average offer {ctc:.1} LPA"),
        None => println!("- no offers recorded yet"),
    }
    for (status, count) in &analytics.status_breakdown {
        println!("  - {}: {}", status.display_name(), count);
    }
    if !analytics.top_recruiting_companies.is_empty() {
        println!(
            "- top recruiters: {}",
            analytics.top_recruiting_companies.join(", ")
        );
    }
}

pub(crate) fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let CatalogArgs {
        cgpa,
        branch,
        search,
        any_branch,
    } = args;

    let config = PortalConfig {
        enforce_branch_eligibility: !any_branch,
        ..PortalConfig::default()
    };
    let portal = demo_portal(&config);
    seed_catalog(portal.as_ref(), Local::now().date_naive())?;

    let student = Student {
        id: StudentId::next(),
        profile_id: ProfileId::next(),
        full_name: "Catalog preview".to_string(),
        email: String::new(),
        branch: Some(branch.clone()),
        passing_year: None,
        cgpa: Some(cgpa),
        phone: None,
        skills: Vec::new(),
        resume_url: None,
        profile_complete: 0,
    };

    let eligible = portal.catalog().list_eligible_jobs(&student)?;
    let jobs = filter(
        &eligible,
        &JobFilter {
            search,
            ..JobFilter::default()
        },
    );

    println!("Jobs open to {branch} with cgpa {cgpa:.2}: {}", jobs.len());
    for job in &jobs {
        println!(
            "  - {} at {} | {} | {} | min cgpa {:.1} | {}",
            job.title,
            job.company_name,
            job.ctc,
            job.location,
            job.min_cgpa,
            if job.eligible_branches.is_empty() {
                "all branches".to_string()
            } else {
                job.eligible_branches.join(", ")
            }
        );
    }
    Ok(())
}
