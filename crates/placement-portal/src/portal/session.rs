use std::sync::Arc;

use super::domain::{Role, UserProfile};
use super::identity::{Identity, IdentityProvider, SessionToken};
use super::repository::ProfileRepository;

/// Page every rejected visitor is sent back to.
pub const ENTRY_PAGE: &str = "index.html";

/// Why a page or endpoint refused the caller. Every variant redirects to the entry page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardRejection {
    #[error("sign in required")]
    Unauthenticated,
    #[error("profile missing for signed-in user")]
    ProfileMissing,
    #[error("{} accounts cannot access this page", .role.label())]
    RoleNotPermitted { role: Role },
    #[error("session lookup failed: {0}")]
    Unavailable(String),
}

impl GuardRejection {
    pub const fn redirect_to(&self) -> &'static str {
        ENTRY_PAGE
    }
}

/// Caller that passed the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub token: SessionToken,
    pub identity: Identity,
    pub profile: UserProfile,
}

impl SessionContext {
    pub fn role(&self) -> Role {
        self.profile.role
    }
}

/// Resolves a bearer token into a profile and checks it against the roles a page admits.
pub struct SessionGuard<S, P> {
    profiles: Arc<S>,
    identity: Arc<P>,
}

impl<S, P> SessionGuard<S, P>
where
    S: ProfileRepository,
    P: IdentityProvider,
{
    pub fn new(profiles: Arc<S>, identity: Arc<P>) -> Self {
        Self { profiles, identity }
    }

    pub fn require_role(
        &self,
        token: Option<&SessionToken>,
        allowed: &[Role],
    ) -> Result<SessionContext, GuardRejection> {
        let Some(token) = token else {
            tracing::debug!("no session token presented");
            return Err(GuardRejection::Unauthenticated);
        };
        let Some(identity) = self.identity.get_user(token) else {
            tracing::debug!("session token not recognised");
            return Err(GuardRejection::Unauthenticated);
        };

        let profile = self
            .profiles
            .profile_for_auth_user(&identity.auth_user_id)
            .map_err(|err| GuardRejection::Unavailable(err.to_string()))?
            .ok_or_else(|| {
                tracing::warn!(auth_user = %identity.auth_user_id, "signed-in user has no profile");
                GuardRejection::ProfileMissing
            })?;

        if !allowed.contains(&profile.role) {
            tracing::warn!(
                profile = %profile.id,
                role = profile.role.label(),
                "role not permitted"
            );
            return Err(GuardRejection::RoleNotPermitted { role: profile.role });
        }

        Ok(SessionContext {
            token: token.clone(),
            identity,
            profile,
        })
    }
}
