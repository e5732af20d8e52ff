//! Login page use-cases: first run, registration, session and password
//! recovery.
//!
//! # Invariants
//! - E-mails are unique across `users`, compared case-insensitively after
//!   trimming.
//! - Logging out removes `currentUser` and nothing else.

use crate::bus::ChangeKind;
use crate::model::user::{NewUser, User};
use crate::model::validation::{require, ValidationError};
use crate::service::{insert_row, ServiceError, ServiceResult};
use crate::store::{BootstrapReport, ChangeSet, RecordStore, Table, TableName};
use log::{info, warn};
use std::sync::Arc;

pub struct AuthService {
    store: Arc<RecordStore>,
}

impl AuthService {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Initializes absent tables, seeding the demonstration accounts when
    /// requested. Safe to call on every start.
    pub fn bootstrap(&self, seed_demo_accounts: bool) -> ServiceResult<BootstrapReport> {
        Ok(self.store.bootstrap(seed_demo_accounts)?)
    }

    /// Self-service registration. Does not log the new user in.
    pub fn register(&self, request: NewUser) -> ServiceResult<User> {
        create_user(&self.store, request, User::validate)
    }

    /// Checks credentials and stores the matching user as the session.
    pub fn login(&self, email: &str, password: &str) -> ServiceResult<User> {
        require("email", email)?;
        require("password", password)?;
        if self.store.raw(TableName::Users.key())?.is_none() {
            return Err(ServiceError::Uninitialized);
        }

        let users = self.store.load::<User>();
        let Some(user) = users
            .find(|user| same_email(&user.email, email) && user.password == password)
            .cloned()
        else {
            warn!("event=auth_login module=service status=error reason=invalid_credentials");
            return Err(ServiceError::InvalidCredentials);
        };

        self.store.set_session_user(&user)?;
        info!(
            "event=auth_login module=service status=ok user_id={} role={}",
            user.id,
            user.role.as_str()
        );
        Ok(user)
    }

    pub fn logout(&self) -> ServiceResult<()> {
        self.store.clear_session()?;
        info!("event=auth_logout module=service status=ok");
        Ok(())
    }

    pub fn current_user(&self) -> Option<User> {
        self.store.session_user()
    }

    /// Returns the stored password for `email`; passwords are kept in
    /// plaintext.
    pub fn recover_password(&self, email: &str) -> ServiceResult<String> {
        require("email", email)?;
        let users = self.store.load::<User>();
        users
            .find(|user| same_email(&user.email, email))
            .map(|user| user.password.clone())
            .ok_or_else(|| ServiceError::NotFound {
                entity: "usuario",
                id: email.trim().to_string(),
            })
    }
}

/// Validates and stores a new account; shared by registration and the
/// coordinator.
pub(crate) fn create_user(
    store: &RecordStore,
    request: NewUser,
    validate: fn(&User) -> Result<(), ValidationError>,
) -> ServiceResult<User> {
    let user = request.into_user(store.next_id());
    validate(&user)?;

    let mut users = store.load::<User>();
    ensure_email_available(&users, &user.email, None)?;
    let user = insert_row(&mut users, user)?;

    let mut changes = ChangeSet::new();
    changes.stage(&users, ChangeKind::Created, &user.id)?;
    store.commit(changes)?;

    info!(
        "event=user_create module=service status=ok user_id={} role={}",
        user.id,
        user.role.as_str()
    );
    Ok(user)
}

/// Fails when another user (other than `except_id`) already owns `email`.
pub(crate) fn ensure_email_available(
    users: &Table<User>,
    email: &str,
    except_id: Option<&str>,
) -> ServiceResult<()> {
    let taken = users
        .iter()
        .any(|user| same_email(&user.email, email) && Some(user.id.as_str()) != except_id);
    if taken {
        return Err(ServiceError::Duplicate {
            entity: "usuario",
            field: "email",
            value: email.trim().to_string(),
        });
    }
    Ok(())
}

fn same_email(stored: &str, candidate: &str) -> bool {
    stored.trim().eq_ignore_ascii_case(candidate.trim())
}
