use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{
    Company, CompanyId, CompanyMember, CompanyStatus, ProfileId, Role, Student, StudentId,
    UserProfile,
};
use super::error::{PortalError, ValidationError};
use super::identity::{
    normalize_email, AuthError, Identity, IdentityProvider, SessionToken, SignUpOptions,
    SignUpOutcome,
};
use super::profile::{check_cgpa, completion, non_blank};
use super::repository::{
    CompanyRepository, ProfileRepository, RepositoryError, StudentRepository,
};

/// Title given to the account that registers a company.
pub const DEFAULT_MEMBER_TITLE: &str = "HR Manager";
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignInResult {
    pub token: SessionToken,
    pub role: Role,
    pub full_name: String,
    pub redirect: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDetails {
    pub branch: String,
    pub passing_year: u16,
    pub cgpa: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDetails {
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub student: Option<StudentDetails>,
    #[serde(default)]
    pub company: Option<CompanyDetails>,
}

impl SignUpRequest {
    /// Checked before the identity provider is contacted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::Required { field: "full_name" });
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ValidationError::Required { field: "email" });
        }
        if !email.contains('@') {
            return Err(ValidationError::Invalid {
                field: "email",
                reason: "expected an address like name@college.edu".to_string(),
            });
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::Invalid {
                field: "password",
                reason: format!("must be at least {MIN_PASSWORD_LEN} characters"),
            });
        }

        match self.role {
            Role::Student => {
                let details = self
                    .student
                    .as_ref()
                    .ok_or(ValidationError::Required { field: "student" })?;
                if details.branch.trim().is_empty() {
                    return Err(ValidationError::Required { field: "branch" });
                }
                if details.passing_year == 0 {
                    return Err(ValidationError::Required {
                        field: "passing_year",
                    });
                }
                check_cgpa(details.cgpa)?;
            }
            Role::Company => {
                let name = self.company.as_ref().map(|company| company.name.trim());
                if name.map_or(true, str::is_empty) {
                    return Err(ValidationError::Required {
                        field: "company_name",
                    });
                }
            }
            Role::Staff => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignUpResult {
    pub profile: UserProfile,
    pub token: Option<SessionToken>,
    pub pending_verification: bool,
    pub redirect: &'static str,
}

/// Sign-in, sign-up, and the role-specific onboarding rows behind them.
pub struct AccountService<S, P> {
    store: Arc<S>,
    identity: Arc<P>,
    site_url: String,
}

impl<S, P> AccountService<S, P>
where
    S: ProfileRepository + StudentRepository + CompanyRepository,
    P: IdentityProvider,
{
    pub fn new(store: Arc<S>, identity: Arc<P>, site_url: impl Into<String>) -> Self {
        Self {
            store,
            identity,
            site_url: site_url.into(),
        }
    }

    pub fn sign_in(&self, request: &SignInRequest) -> Result<SignInResult, PortalError> {
        let session = self
            .identity
            .sign_in(&normalize_email(&request.email), &request.password)?;
        let profile = match self
            .store
            .profile_for_auth_user(&session.identity.auth_user_id)?
        {
            Some(profile) => profile,
            None => {
                self.identity.sign_out(&session.token);
                return Err(AuthError::ProfileMissing.into());
            }
        };

        tracing::info!(profile = %profile.id, role = profile.role.label(), "signed in");
        Ok(SignInResult {
            token: session.token,
            role: profile.role,
            full_name: profile.full_name,
            redirect: profile.role.dashboard(),
        })
    }

    pub fn sign_up(&self, request: SignUpRequest) -> Result<SignUpResult, PortalError> {
        request.validate()?;

        let options = SignUpOptions {
            email_redirect_to: Some(self.site_url.clone()),
        };
        let email = normalize_email(&request.email);
        let outcome = match self.identity.sign_up(&email, &request.password, &options) {
            Ok(outcome) => outcome,
            Err(AuthError::AlreadyRegistered) => self.resume_orphaned(&email, &request.password)?,
            Err(err) => return Err(err.into()),
        };
        let profile = match self.onboard(outcome.identity(), &request) {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(
                    auth_user = %outcome.identity().auth_user_id,
                    "account has no profile after failed onboarding: {err}"
                );
                return Err(err);
            }
        };

        let (token, pending_verification) = match outcome {
            SignUpOutcome::Session(session) => (Some(session.token), false),
            SignUpOutcome::PendingVerification(_) => (None, true),
        };
        tracing::info!(
            profile = %profile.id,
            role = profile.role.label(),
            pending_verification,
            "account created"
        );

        let redirect = if pending_verification {
            super::session::ENTRY_PAGE
        } else {
            profile.role.dashboard()
        };
        Ok(SignUpResult {
            profile,
            token,
            pending_verification,
            redirect,
        })
    }

    pub fn sign_out(&self, token: &SessionToken) {
        self.identity.sign_out(token);
    }

    /// A registered account without a profile row is a sign-up that failed halfway.
    /// The same credentials may finish it; anything else stays `AlreadyRegistered`.
    fn resume_orphaned(&self, email: &str, password: &str) -> Result<SignUpOutcome, PortalError> {
        let session = self
            .identity
            .sign_in(email, password)
            .map_err(|_| AuthError::AlreadyRegistered)?;
        if self
            .store
            .profile_for_auth_user(&session.identity.auth_user_id)?
            .is_some()
        {
            self.identity.sign_out(&session.token);
            return Err(AuthError::AlreadyRegistered.into());
        }
        tracing::info!(auth_user = %session.identity.auth_user_id, "resuming interrupted sign-up");
        Ok(SignUpOutcome::Session(session))
    }

    fn onboard(
        &self,
        identity: &Identity,
        request: &SignUpRequest,
    ) -> Result<UserProfile, PortalError> {
        let profile = self.store.insert_profile(UserProfile {
            id: ProfileId::next(),
            auth_user_id: identity.auth_user_id.clone(),
            email: identity.email.clone(),
            full_name: request.full_name.trim().to_string(),
            role: request.role,
        })?;

        match request.role {
            Role::Student => {
                if let Some(details) = &request.student {
                    self.create_student(&profile, details)?;
                }
            }
            Role::Company => {
                if let Some(details) = &request.company {
                    let company = self.upsert_company(details)?;
                    self.store.link_member(CompanyMember {
                        profile_id: profile.id.clone(),
                        company_id: company.id,
                        title: DEFAULT_MEMBER_TITLE.to_string(),
                    })?;
                }
            }
            Role::Staff => {}
        }
        Ok(profile)
    }

    fn create_student(
        &self,
        profile: &UserProfile,
        details: &StudentDetails,
    ) -> Result<Student, PortalError> {
        let skills = Vec::new();
        let student = Student {
            id: StudentId::next(),
            profile_id: profile.id.clone(),
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
            branch: Some(details.branch.trim().to_string()),
            passing_year: Some(details.passing_year),
            cgpa: Some(details.cgpa),
            phone: None,
            profile_complete: completion(None, Some(details.cgpa), &skills),
            skills,
            resume_url: None,
        };
        Ok(self.store.insert_student(student)?)
    }

    /// Reuse a company registered under the same name; new companies start pending approval.
    fn upsert_company(&self, details: &CompanyDetails) -> Result<Company, PortalError> {
        let name = details.name.trim();
        if let Some(existing) = self.store.company_by_name(name)? {
            return Ok(existing);
        }

        let company = Company {
            id: CompanyId::next(),
            name: name.to_string(),
            industry: non_blank(details.industry.clone()),
            website: non_blank(details.website.clone()),
            status: CompanyStatus::Pending,
        };
        match self.store.insert_company(company) {
            Ok(company) => Ok(company),
            Err(RepositoryError::Conflict) => self
                .store
                .company_by_name(name)?
                .ok_or_else(|| PortalError::not_found("company", name)),
            Err(err) => Err(err.into()),
        }
    }
}
