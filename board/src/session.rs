// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::Utc;
use common::{User, UserRole};
use thiserror::Error;
use tracing::{debug, info};

use crate::ids::LocalIds;

/// Supplies the signed-in user, if any.
///
/// The board never reads or writes identity storage itself; hosts decide
/// where a user is remembered between runs.
pub trait IdentityProvider {
    fn current_user(&self) -> Option<User>;
}

/// The identity a board works on behalf of.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user: User,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    /// Returns `None` when nobody is signed in.
    pub fn from_provider(provider: &impl IdentityProvider) -> Option<Self> {
        provider.current_user().map(Self::new)
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already exists")]
    EmailTaken,
}

const DEMO_PASSWORD: &str = "password123";

/// In-memory sign-in state backed by a fixed directory of demo accounts.
#[derive(Debug)]
pub struct SessionStore {
    user: Option<User>,
    directory: Vec<User>,
    ids: LocalIds,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let now = Utc::now();
        let account = |id: i64, name: &str, email: &str, role: UserRole| User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            avatar_url: None,
            role,
            created_at: now,
        };
        Self {
            user: None,
            directory: vec![
                account(1, "Alice Johnson", "alice@example.com", UserRole::Admin),
                account(2, "Bob Smith", "bob@example.com", UserRole::Member),
            ],
            ids: LocalIds::new(),
        }
    }

    /// Resumes a session for a user the host remembered from an earlier run.
    pub fn restore(&mut self, user: User) {
        debug!("Restoring session for user {}", user.id);
        self.user = Some(user);
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<&User, AuthError> {
        let found = self
            .directory
            .iter()
            .find(|u| u.email == email)
            .filter(|_| password == DEMO_PASSWORD)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;
        info!("User {} signed in.", found.id);
        Ok(&*self.user.insert(found))
    }

    pub fn signup(&mut self, name: &str, email: &str, _password: &str) -> Result<&User, AuthError> {
        if self.directory.iter().any(|u| u.email == email) {
            return Err(AuthError::EmailTaken);
        }
        let now = Utc::now();
        let user = User {
            id: self.ids.next(now),
            name: name.to_string(),
            email: email.to_string(),
            avatar_url: None,
            role: UserRole::Member,
            created_at: now,
        };
        info!("Signed up new user {}.", user.id);
        Ok(&*self.user.insert(user))
    }

    /// Signs in a throwaway member account without credentials.
    pub fn demo_login(&mut self) -> &User {
        let now = Utc::now();
        let user = User {
            id: self.ids.next(now),
            name: "Demo User".to_string(),
            email: "demo@example.com".to_string(),
            avatar_url: None,
            role: UserRole::Member,
            created_at: now,
        };
        info!("Started demo session for user {}.", user.id);
        self.user.insert(user)
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!("User {} signed out.", user.id);
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl IdentityProvider for SessionStore {
    fn current_user(&self) -> Option<User> {
        self.user.clone()
    }
}
