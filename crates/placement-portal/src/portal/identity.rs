use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::domain::AuthUserId;

/// Opaque bearer token handed out on sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

/// Signed-in user as known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub auth_user_id: AuthUserId,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub identity: Identity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpOptions {
    /// Where confirmation links should land.
    pub email_redirect_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    Session(Session),
    /// Account exists but the email has to be confirmed before signing in.
    PendingVerification(Identity),
}

impl SignUpOutcome {
    pub fn identity(&self) -> &Identity {
        match self {
            SignUpOutcome::Session(session) => &session.identity,
            SignUpOutcome::PendingVerification(identity) => identity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("email not confirmed")]
    EmailNotConfirmed,
    #[error("user already registered")]
    AlreadyRegistered,
    #[error("profile missing for signed-in user")]
    ProfileMissing,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Hosted authentication boundary.
pub trait IdentityProvider: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    fn sign_up(
        &self,
        email: &str,
        password: &str,
        options: &SignUpOptions,
    ) -> Result<SignUpOutcome, AuthError>;
    fn get_user(&self, token: &SessionToken) -> Option<Identity>;
    fn sign_out(&self, token: &SessionToken);
}

struct Account {
    identity: Identity,
    password: String,
    confirmed: bool,
}

/// Process-local identity provider used by the service and tests. Credentials never leave
/// memory; a hosted provider owns hashing and confirmation mail in production.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    require_confirmation: bool,
    accounts: Mutex<HashMap<String, Account>>,
    sessions: Mutex<HashMap<SessionToken, Identity>>,
}

impl MemoryIdentityProvider {
    pub fn new(require_confirmation: bool) -> Self {
        Self {
            require_confirmation,
            ..Self::default()
        }
    }

    /// Confirm a pending account; returns false when the email is unknown.
    pub fn confirm_email(&self, email: &str) -> bool {
        let Ok(mut accounts) = self.accounts.lock() else {
            return false;
        };
        match accounts.get_mut(&normalize_email(email)) {
            Some(account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    fn open_session(&self, identity: Identity) -> Result<Session, AuthError> {
        let token = SessionToken::generate();
        self.sessions
            .lock()
            .map_err(|_| AuthError::Unavailable("session table poisoned".to_string()))?
            .insert(token.clone(), identity.clone());
        Ok(Session { token, identity })
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl IdentityProvider for MemoryIdentityProvider {
    fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let identity = {
            let accounts = self
                .accounts
                .lock()
                .map_err(|_| AuthError::Unavailable("account table poisoned".to_string()))?;
            let account = accounts
                .get(&normalize_email(email))
                .filter(|account| account.password == password)
                .ok_or(AuthError::InvalidCredentials)?;
            if !account.confirmed {
                return Err(AuthError::EmailNotConfirmed);
            }
            account.identity.clone()
        };
        self.open_session(identity)
    }

    fn sign_up(
        &self,
        email: &str,
        password: &str,
        _options: &SignUpOptions,
    ) -> Result<SignUpOutcome, AuthError> {
        let email = normalize_email(email);
        let identity = {
            let mut accounts = self
                .accounts
                .lock()
                .map_err(|_| AuthError::Unavailable("account table poisoned".to_string()))?;
            if accounts.contains_key(&email) {
                return Err(AuthError::AlreadyRegistered);
            }
            let identity = Identity {
                auth_user_id: AuthUserId::next(),
                email: email.clone(),
            };
            accounts.insert(
                email,
                Account {
                    identity: identity.clone(),
                    password: password.to_string(),
                    confirmed: !self.require_confirmation,
                },
            );
            identity
        };

        if self.require_confirmation {
            return Ok(SignUpOutcome::PendingVerification(identity));
        }
        self.open_session(identity).map(SignUpOutcome::Session)
    }

    fn get_user(&self, token: &SessionToken) -> Option<Identity> {
        self.sessions.lock().ok()?.get(token).cloned()
    }

    fn sign_out(&self, token: &SessionToken) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(token);
        }
    }
}
