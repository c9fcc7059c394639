//! Accounts and sessions
//!
//! Credentials are checked by the upstream identity provider; this module
//! only maps an email to a profile and hands out [`Session`] values.

mod session;

pub use session::{Session, SessionCache};

use tracing::info;

use crate::domain::{Profile, Role};
use crate::store::{CampusDb, ProfileRepository, is_unique_violation};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("name must not be empty")]
    EmptyName,

    #[error("an account with email {0} already exists")]
    EmailTaken(String),

    #[error("no account found for {0}")]
    UnknownAccount(String),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("only admins can do that")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Registration, login and session resolution
#[derive(Clone)]
pub struct Accounts {
    db: CampusDb,
    admin_emails: Vec<String>,
    cache: Option<SessionCache>,
}

impl Accounts {
    pub fn new(db: CampusDb, admin_emails: Vec<String>) -> Self {
        Self {
            db,
            admin_emails,
            cache: None,
        }
    }

    /// Mirror logins into a session file (CLI use)
    pub fn with_cache(mut self, cache: SessionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn profiles(&self) -> ProfileRepository {
        ProfileRepository::new(self.db.clone())
    }

    /// Create a profile with zeroed counters.
    ///
    /// Emails listed in `settings.admin_emails` receive the admin role.
    pub fn register(&self, email: &str, name: &str) -> Result<Profile, AccountError> {
        let email = email.trim();
        let name = name.trim();
        if !is_plausible_email(email) {
            return Err(AccountError::InvalidEmail(email.to_string()));
        }
        if name.is_empty() {
            return Err(AccountError::EmptyName);
        }

        let role = if self
            .admin_emails
            .iter()
            .any(|a| a.trim().eq_ignore_ascii_case(email))
        {
            Role::Admin
        } else {
            Role::Student
        };

        let profile = Profile::new(email, name, role);
        if let Err(e) = self.profiles().create(&profile) {
            let duplicate = e
                .downcast_ref::<rusqlite::Error>()
                .is_some_and(is_unique_violation);
            if duplicate {
                return Err(AccountError::EmailTaken(email.to_string()));
            }
            return Err(e.into());
        }

        info!(user_id = %profile.id, role = %profile.role, "Registered profile");
        Ok(profile)
    }

    /// Start a session for an already-authenticated email
    pub fn login(&self, email: &str) -> Result<Session, AccountError> {
        let profile = self
            .profiles()
            .get_by_email(email.trim())?
            .ok_or_else(|| AccountError::UnknownAccount(email.trim().to_string()))?;

        let session = Session::for_profile(&profile);
        if let Some(cache) = &self.cache {
            cache.clear()?;
            cache.store(&session)?;
        }
        info!(user_id = %session.user_id, "Logged in");
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), AccountError> {
        if let Some(cache) = &self.cache {
            cache.clear()?;
        }
        Ok(())
    }

    /// Session from the cache, re-validated against the store.
    ///
    /// A cached session whose profile disappeared is cleared. The role is
    /// always taken from the store, never from the cache.
    pub fn current(&self) -> Result<Option<Session>, AccountError> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let Some(cached) = cache.load()? else {
            return Ok(None);
        };

        match self.profiles().get(&cached.user_id)? {
            Some(profile) => Ok(Some(Session {
                role: profile.role,
                email: profile.email,
                ..cached
            })),
            None => {
                cache.clear()?;
                Ok(None)
            }
        }
    }

    /// Like [`Self::current`] but an error when nobody is logged in
    pub fn require_current(&self) -> Result<Session, AccountError> {
        self.current()?.ok_or(AccountError::NotLoggedIn)
    }

    /// Resolve a session from a user ID supplied by request context
    pub fn session_for(&self, user_id: &str) -> Result<Session, AccountError> {
        self.profiles()
            .get(user_id)?
            .map(|p| Session::for_profile(&p))
            .ok_or_else(|| AccountError::UnknownAccount(user_id.to_string()))
    }

    /// Fresh copy of the session's profile
    pub fn profile(&self, session: &Session) -> Result<Profile, AccountError> {
        self.profiles()
            .get(&session.user_id)?
            .ok_or_else(|| AccountError::UnknownAccount(session.email.clone()))
    }

    /// Grant or revoke the admin role
    pub fn set_role(&self, admin: &Session, email: &str, role: Role) -> Result<Profile, AccountError> {
        if !admin.is_admin() {
            return Err(AccountError::Forbidden);
        }
        let profiles = self.profiles();
        let mut profile = profiles
            .get_by_email(email.trim())?
            .ok_or_else(|| AccountError::UnknownAccount(email.trim().to_string()))?;
        profiles.set_role(&profile.id, role)?;
        profile.role = role;
        info!(user_id = %profile.id, role = %role, by = %admin.user_id, "Changed role");
        Ok(profile)
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
