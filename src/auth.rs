//! Mock authentication
//!
//! There is no authentication server. Credentials are checked against a fixed
//! demo table and the result resolves after a fixed delay, the way the
//! original mocked a backend call. At most one request is in flight: a new
//! login replaces (and thereby cancels) the previous one, and teardown calls
//! [`Authenticator::cancel`] so a stale resolution can never land after
//! navigating away.

use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::store::{LOGGED_IN_KEY, StateStore, StoreError, USER_ROLE_KEY};

/// Access role of a logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Regular storefront user.
    User,

    /// Administrator.
    Admin,
}

impl Role {
    /// The persisted representation (`"user"` / `"admin"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse the persisted representation; anything else is no role.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// The demo contact address shown on invoices.
    pub fn contact_email(self) -> &'static str {
        match self {
            Self::User => "user@freshmart.com",
            Self::Admin => "admin@freshmart.com",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An active session, projected to the store as the
/// `isLoggedIn`/`userRole` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// Role granted at login.
    pub role: Role,
}

impl Session {
    /// Read the session from the store.
    ///
    /// Returns `None` unless the logged-in flag is exactly `"true"` and the
    /// role parses; a malformed session reads as "not logged in" rather than
    /// an error.
    pub fn load<S: StateStore + ?Sized>(store: &S) -> Option<Self> {
        if store.get(LOGGED_IN_KEY)? != "true" {
            return None;
        }

        let role = Role::parse(&store.get(USER_ROLE_KEY)?)?;

        Some(Self { role })
    }

    /// Persist the session.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if either key cannot be written.
    pub fn save<S: StateStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        store.set(LOGGED_IN_KEY, "true")?;
        store.set(USER_ROLE_KEY, self.role.as_str())
    }

    /// Log out: remove both session keys.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if either removal cannot be persisted.
    pub fn clear<S: StateStore + ?Sized>(store: &mut S) -> Result<(), StoreError> {
        store.remove(LOGGED_IN_KEY)?;
        store.remove(USER_ROLE_KEY)
    }
}

/// Login form contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Email address.
    pub email: String,

    /// Password.
    pub password: String,
}

/// Form validation failure: blocks submission, no request is started.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    /// Both fields are required.
    #[error("please enter both email and password")]
    MissingFields,
}

/// Outcome of polling the authenticator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPoll {
    /// No request in flight.
    Idle,

    /// The request has not resolved yet.
    Pending,

    /// The request resolved. `None` means invalid credentials — a plain
    /// failure flag, never an error.
    Resolved(Option<Role>),
}

#[derive(Debug)]
struct InFlight {
    resolve_at: Instant,
    outcome: Option<Role>,
}

/// The mock authenticator: fixed credential table, fixed delay, at most one
/// request in flight.
///
/// Time is passed in by the caller, so tests drive resolution without
/// sleeping.
#[derive(Debug)]
pub struct Authenticator {
    delay: Duration,
    in_flight: Option<InFlight>,
}

impl Authenticator {
    /// The delay the original mock used.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    /// Create an authenticator with the given resolution delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: None,
        }
    }

    /// Start a login attempt at `now`.
    ///
    /// Any request already in flight is cancelled and replaced; its result
    /// will never be observed.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::MissingFields`] if either field is empty;
    /// no request is started in that case.
    pub fn login(&mut self, credentials: &Credentials, now: Instant) -> Result<(), CredentialsError> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(CredentialsError::MissingFields);
        }

        self.in_flight = Some(InFlight {
            resolve_at: now + self.delay,
            outcome: check(credentials),
        });

        Ok(())
    }

    /// Poll the in-flight request at `now`.
    ///
    /// A resolved outcome is handed out exactly once; afterwards the
    /// authenticator is idle again.
    pub fn poll(&mut self, now: Instant) -> AuthPoll {
        match &self.in_flight {
            None => AuthPoll::Idle,
            Some(request) if now < request.resolve_at => AuthPoll::Pending,
            Some(_) => {
                let resolved = self.in_flight.take().map(|request| request.outcome);

                AuthPoll::Resolved(resolved.flatten())
            }
        }
    }

    /// Cancel any in-flight request (component teardown).
    pub fn cancel(&mut self) {
        self.in_flight = None;
    }

    /// Whether a request is currently in flight.
    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

/// The fixed demo credential table.
fn check(credentials: &Credentials) -> Option<Role> {
    match (credentials.email.as_str(), credentials.password.as_str()) {
        ("admin@example.com", "admin123") => Some(Role::Admin),
        ("user@example.com", "user123") => Some(Role::User),
        _ => None,
    }
}
