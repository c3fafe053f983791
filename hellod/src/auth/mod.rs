/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Login handling backed by the local key-value store.
//!
//! Passwords are kept as blake3 hashes in the `users` tree. A successful
//! login issues an opaque bearer token and records it in the `sessions`
//! tree. The token is returned to the client but is not required on
//! subsequent calls on the same channel; the transport has already proven
//! peer identity, and no call-level token check is done.

use anyhow::Context;
use constant_time_eq::constant_time_eq;
use thiserror::Error;
use uuid::Uuid;

const USERS_TREE: &str = "users";
const SESSIONS_TREE: &str = "sessions";

pub const DEFAULT_USERNAME: &str = "kelseyhightower";
pub const DEFAULT_PASSWORD: &str = "password";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    Rejected,
    #[error("store error: {0}")]
    Store(#[from] sled::Error),
}

pub struct AuthService {
    users: sled::Tree,
    sessions: sled::Tree,
}

impl AuthService {
    pub fn new(db: &sled::Db) -> anyhow::Result<Self> {
        let users = db
            .open_tree(USERS_TREE)
            .context("failed to open users tree")?;
        let sessions = db
            .open_tree(SESSIONS_TREE)
            .context("failed to open sessions tree")?;
        Ok(AuthService { users, sessions })
    }

    /// Insert the demo user when no user exists yet, so a fresh install
    /// accepts the well known demo credentials.
    pub fn seed_default_user(&self) -> anyhow::Result<bool> {
        if !self.users.is_empty() {
            return Ok(false);
        }
        self.add_user(DEFAULT_USERNAME, DEFAULT_PASSWORD)?;
        Ok(true)
    }

    pub fn add_user(&self, username: &str, password: &str) -> anyhow::Result<()> {
        self.users
            .insert(username.as_bytes(), &hash_password(password)[..])
            .context(format!("failed to store user {username}"))?;
        Ok(())
    }

    /// Verify the credentials and issue a session token.
    ///
    /// Retries are safe: each successful call issues a fresh independent
    /// token and has no other effect on server state.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let Some(stored) = self.users.get(username.as_bytes())? else {
            return Err(AuthError::Rejected);
        };
        if !constant_time_eq(stored.as_ref(), &hash_password(password)) {
            return Err(AuthError::Rejected);
        }

        let token = Uuid::new_v4().simple().to_string();
        self.sessions
            .insert(token.as_bytes(), username.as_bytes())?;
        Ok(token)
    }
}

fn hash_password(password: &str) -> [u8; 32] {
    *blake3::hash(password.as_bytes()).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_auth() -> AuthService {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let auth = AuthService::new(&db).unwrap();
        assert!(auth.seed_default_user().unwrap());
        auth
    }

    #[test]
    fn login_default_user() {
        let auth = temp_auth();
        let token = auth.login(DEFAULT_USERNAME, DEFAULT_PASSWORD).unwrap();
        assert!(!token.is_empty());
    }

    #[test]
    fn independent_logins_both_succeed() {
        let auth = temp_auth();
        let t1 = auth.login(DEFAULT_USERNAME, DEFAULT_PASSWORD).unwrap();
        let t2 = auth.login(DEFAULT_USERNAME, DEFAULT_PASSWORD).unwrap();
        assert!(!t1.is_empty());
        assert!(!t2.is_empty());
    }

    #[test]
    fn wrong_password_rejected() {
        let auth = temp_auth();
        let err = auth.login(DEFAULT_USERNAME, "nope").unwrap_err();
        assert!(matches!(err, AuthError::Rejected));
    }

    #[test]
    fn unknown_user_rejected() {
        let auth = temp_auth();
        let err = auth.login("nobody", DEFAULT_PASSWORD).unwrap_err();
        assert!(matches!(err, AuthError::Rejected));
    }

    #[test]
    fn seed_runs_once() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let auth = AuthService::new(&db).unwrap();
        assert!(auth.seed_default_user().unwrap());
        assert!(!auth.seed_default_user().unwrap());
    }
}
