use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use placement_portal::config::PortalConfig;
use placement_portal::portal::repository::{ApplicationRepository, CompanyRepository};
use placement_portal::portal::{
    ApplicationStatus, ApplicationWorkflow, ApplyOutcome, Company, CompanyDetails, CompanyId,
    CompanyStatus, InterviewMode, InterviewSlot, JobFilter, JobPosting, MemoryIdentityProvider,
    MemoryStore, Notification, NotificationError, NotificationKind, NotificationPublisher,
    PlacementPortal, PortalError, ProfileEdits, ReviewDecision, Role, SessionContext,
    SignInRequest, SignUpRequest, StudentDetails,
};

const PASSWORD: &str = "campus-hiring";

type Portal = PlacementPortal<MemoryStore, MemoryIdentityProvider>;

fn portal_with(config: PortalConfig) -> (Portal, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let portal = PlacementPortal::new(
        store.clone(),
        Arc::new(MemoryIdentityProvider::new(false)),
        &config,
    );
    (portal, store)
}

fn sign_up(portal: &Portal, request: SignUpRequest) -> SessionContext {
    let email = request.email.clone();
    let role = request.role;
    portal.accounts().sign_up(request).expect("sign up");
    let signed_in = portal
        .accounts()
        .sign_in(&SignInRequest {
            email,
            password: PASSWORD.to_string(),
        })
        .expect("sign in");
    portal
        .authorize(Some(&signed_in.token), &[role])
        .expect("session admitted")
}

fn student_request(name: &str, email: &str, branch: &str, cgpa: f32) -> SignUpRequest {
    SignUpRequest {
        full_name: name.to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
        role: Role::Student,
        student: Some(StudentDetails {
            branch: branch.to_string(),
            passing_year: 2025,
            cgpa,
        }),
        company: None,
    }
}

fn recruiter_request(email: &str, company: &str) -> SignUpRequest {
    SignUpRequest {
        full_name: "Campus Recruiter".to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
        role: Role::Company,
        student: None,
        company: Some(CompanyDetails {
            name: company.to_string(),
            industry: Some("Software".to_string()),
            website: None,
        }),
    }
}

fn posting(title: &str, ctc: &str, min_cgpa: f32, branches: &[&str]) -> JobPosting {
    JobPosting {
        title: title.to_string(),
        description: format!("{title} for the graduating batch"),
        requirements: vec!["SQL".to_string()],
        ctc: ctc.to_string(),
        location: "Bangalore".to_string(),
        job_type: String::new(),
        deadline: NaiveDate::from_ymd_opt(2026, 12, 15).expect("valid deadline"),
        min_cgpa,
        eligible_branches: branches.iter().map(|branch| branch.to_string()).collect(),
    }
}

#[test]
fn hiring_round_from_posting_to_placement() {
    let (portal, store) = portal_with(PortalConfig::default());
    let recruiter = sign_up(&portal, recruiter_request("hr@techcorp.com", "TechCorp Solutions"));
    let company = portal.company_for(&recruiter).expect("linked company");
    portal
        .analytics()
        .set_company_status(&company.id, CompanyStatus::Approved)
        .expect("approved");

    let developer = portal
        .catalog()
        .post_job(
            &company,
            posting("Software Developer", "6-8 LPA", 7.5, &["Computer Science"]),
        )
        .expect("posted");
    assert_eq!(developer.job_type, "Full-time");
    portal
        .catalog()
        .post_job(&company, posting("Research Engineer", "10+ LPA", 9.0, &[]))
        .expect("posted");

    let session = sign_up(
        &portal,
        student_request("John Doe", "john.doe@college.edu", "Computer Science", 8.5),
    );
    let student = portal.student_for(&session).expect("student row");

    let page = portal
        .browse_jobs(&student, &JobFilter::default(), 0)
        .expect("browse");
    assert_eq!(page.total, 1);
    assert_eq!(page.jobs[0].job.title, "Software Developer");

    let application = match portal.apply_to_job(&student, &developer.id).expect("apply") {
        ApplyOutcome::Applied(application) => application,
        other => panic!("expected a new application, got {other:?}"),
    };
    assert!(matches!(
        portal.apply_to_job(&student, &developer.id).expect("reapply"),
        ApplyOutcome::AlreadyApplied(_)
    ));

    let shortlisted = portal
        .review_application(&company, &application.id, ReviewDecision::Approve)
        .expect("review");
    assert_eq!(shortlisted.status, ApplicationStatus::Shortlisted);

    portal
        .schedule_candidate_interview(
            &company,
            &student.id,
            &developer.id,
            InterviewSlot {
                date: NaiveDate::from_ymd_opt(2026, 11, 20).expect("valid date"),
                time: NaiveTime::from_hms_opt(10, 0, 0).expect("valid time"),
                mode: InterviewMode::Online,
                interviewer: Some("Tech Lead".to_string()),
            },
        )
        .expect("interview");

    let placed = portal
        .set_candidate_status(&company, &student.id, &developer.id, ApplicationStatus::Selected)
        .expect("selected");
    assert_eq!(placed.id, application.id);
    assert_eq!(store.list_applications().expect("applications").len(), 1);

    let feed = portal
        .notifications()
        .feed(&student.profile_id)
        .expect("feed");
    let kinds: Vec<NotificationKind> = feed.notifications.iter().map(|item| item.kind).collect();
    assert_eq!(feed.unread, 4);
    assert!(kinds.contains(&NotificationKind::Interview));

    let analytics = portal.analytics().snapshot().expect("analytics");
    assert_eq!(analytics.placement_rate, 100);
    assert_eq!(analytics.average_ctc, Some(7.0));
    assert_eq!(analytics.branch_wise_placements["Computer Science"], 1);
    assert_eq!(analytics.top_recruiting_companies, vec!["TechCorp Solutions"]);
}

#[test]
fn companies_cannot_touch_each_others_candidates() {
    let (portal, _) = portal_with(PortalConfig::default());
    let owner = sign_up(&portal, recruiter_request("hr@techcorp.com", "TechCorp Solutions"));
    let rival = sign_up(&portal, recruiter_request("hr@rival.io", "Rival Systems"));
    let owner = portal.company_for(&owner).expect("owner company");
    let rival = portal.company_for(&rival).expect("rival company");
    let job = portal
        .catalog()
        .post_job(&owner, posting("Data Analyst", "5-7 LPA", 7.0, &[]))
        .expect("posted");
    let session = sign_up(
        &portal,
        student_request("Jane Smith", "jane@college.edu", "Electronics", 8.8),
    );
    let student = portal.student_for(&session).expect("student");

    match portal.set_candidate_status(&rival, &student.id, &job.id, ApplicationStatus::Rejected) {
        Err(PortalError::ForeignJob(id)) => assert_eq!(id, job.id),
        other => panic!("expected a foreign job rejection, got {other:?}"),
    }
    assert!(portal
        .candidate_view(&owner, &student.id, &job.id)
        .expect("owner view")
        .application
        .is_none());
}

#[test]
fn a_lowered_cgpa_does_not_undo_an_existing_application() {
    let (portal, store) = portal_with(PortalConfig::default());
    let recruiter = sign_up(&portal, recruiter_request("hr@techcorp.com", "TechCorp Solutions"));
    let company = portal.company_for(&recruiter).expect("company");
    let job = portal
        .catalog()
        .post_job(&company, posting("Software Developer", "6-8 LPA", 7.5, &[]))
        .expect("posted");
    let session = sign_up(
        &portal,
        student_request("Rahul Verma", "rahul@college.edu", "Computer Science", 8.0),
    );
    let student = portal.student_for(&session).expect("student");
    assert!(matches!(
        portal.apply_to_job(&student, &job.id).expect("apply"),
        ApplyOutcome::Applied(_)
    ));

    let lowered = portal
        .profiles()
        .save(
            &student,
            ProfileEdits {
                full_name: student.full_name.clone(),
                branch: student.branch.clone(),
                cgpa: Some(7.0),
                ..ProfileEdits::default()
            },
        )
        .expect("profile saved");

    match portal.apply_to_job(&lowered, &job.id) {
        Ok(ApplyOutcome::AlreadyApplied(id)) => assert_eq!(id, job.id),
        other => panic!("expected already applied, got {other:?}"),
    }
    assert_eq!(store.list_applications().expect("applications").len(), 1);
}

#[test]
fn company_decisions_on_students_who_never_applied_open_a_shortlist() {
    let (portal, store) = portal_with(PortalConfig::default());
    let recruiter = sign_up(&portal, recruiter_request("hr@dataflow.io", "DataFlow Inc"));
    let company = portal.company_for(&recruiter).expect("company");
    let job = portal
        .catalog()
        .post_job(&company, posting("Data Analyst", "5-7 LPA", 7.0, &[]))
        .expect("posted");
    let session = sign_up(
        &portal,
        student_request("Priya Nair", "priya@college.edu", "Electronics", 8.2),
    );
    let student = portal.student_for(&session).expect("student");

    let application = portal
        .set_candidate_status(&company, &student.id, &job.id, ApplicationStatus::Shortlisted)
        .expect("shortlisted");
    assert_eq!(application.status, ApplicationStatus::Shortlisted);
    assert_eq!(store.list_applications().expect("applications").len(), 1);

    let feed = portal
        .notifications()
        .feed(&student.profile_id)
        .expect("feed");
    assert_eq!(feed.notifications.len(), 1);
    assert_eq!(feed.notifications[0].kind, NotificationKind::Shortlist);
}

#[test]
fn branch_rules_can_be_relaxed_per_deployment() {
    let relaxed = PortalConfig {
        enforce_branch_eligibility: false,
        ..PortalConfig::default()
    };
    for (config, expected) in [(PortalConfig::default(), 0), (relaxed, 1)] {
        let (portal, _) = portal_with(config);
        let recruiter = sign_up(&portal, recruiter_request("hr@cloudsys.com", "CloudSys Ltd"));
        let company = portal.company_for(&recruiter).expect("company");
        portal
            .catalog()
            .post_job(
                &company,
                posting("Cloud Engineer", "7-9 LPA", 7.5, &["Information Technology"]),
            )
            .expect("posted");
        let session = sign_up(
            &portal,
            student_request("Mike Johnson", "mike@college.edu", "Mechanical", 7.9),
        );
        let student = portal.student_for(&session).expect("student");

        let jobs = portal
            .catalog()
            .list_eligible_jobs(&student)
            .expect("eligible jobs");
        assert_eq!(jobs.len(), expected);
    }
}

struct OfflinePublisher;

impl NotificationPublisher for OfflinePublisher {
    fn publish(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("mail relay unreachable".to_string()))
    }
}

#[test]
fn applications_survive_notification_outages() {
    let (portal, store) = portal_with(PortalConfig::default());
    let company = store
        .insert_company(Company {
            id: CompanyId::next(),
            name: "FinTech Pro".to_string(),
            industry: None,
            website: None,
            status: CompanyStatus::Approved,
        })
        .expect("company");
    let job = portal
        .catalog()
        .post_job(&company, posting("Backend Developer", "6-8 LPA", 7.0, &[]))
        .expect("posted");
    let session = sign_up(
        &portal,
        student_request("Sarah Davis", "sarah@college.edu", "Computer Science", 9.1),
    );
    let student = portal.student_for(&session).expect("student");

    let workflow = ApplicationWorkflow::new(store.clone(), Arc::new(OfflinePublisher));
    let started = Utc::now();
    match workflow.apply(&student, &job).expect("apply despite outage") {
        ApplyOutcome::Applied(application) => {
            assert_eq!(application.status, ApplicationStatus::Pending);
            assert!(application.applied_at >= started);
        }
        other => panic!("expected a new application, got {other:?}"),
    }
    assert!(store
        .application_for(&student.id, &job.id)
        .expect("lookup")
        .is_some());
}
