// ABOUTME: Identity gateway issuing principals: sign-up, sign-in and privileged deletion
// ABOUTME: LocalIdentity keeps argon2 password hashes in the principals table

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::principal;
use crate::error::{AppError, ForbiddenReason, Result};
use crate::storage::Storage;

pub const MIN_PASSWORD_LEN: usize = 6;
const MAX_USERNAME_LEN: usize = 32;

#[async_trait]
pub trait IdentityGateway: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, username: &str)
        -> Result<principal::Model>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<principal::Model>;

    /// Remove the principal together with its profile and role assignment.
    async fn delete_identity(&self, user_id: Uuid) -> Result<()>;
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PersistenceFailed(format!("password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn is_valid_email(email: &str) -> bool {
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

fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

pub struct LocalIdentity {
    storage: Arc<Storage>,
}

impl LocalIdentity {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl IdentityGateway for LocalIdentity {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<principal::Model> {
        let email = normalize_email(email);
        let username = username.trim();

        if !is_valid_email(&email) {
            return Err(AppError::Validation("A valid email address is required".into()));
        }
        if !is_valid_username(username) {
            return Err(AppError::Validation(format!(
                "Username must be 1-{} characters of letters, digits, '.', '_' or '-'",
                MAX_USERNAME_LEN
            )));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        if self.storage.find_principal_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".into()));
        }
        if self
            .storage
            .find_principal_by_username(username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username is already taken".into()));
        }

        let password_hash = hash_password(password)?;
        let principal = self
            .storage
            .create_principal(&email, username, &password_hash)
            .await?;

        tracing::info!(user_id = %principal.id, username = %principal.username, "Principal registered");
        Ok(principal)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<principal::Model> {
        let email = normalize_email(email);
        let principal = self
            .storage
            .find_principal_by_email(&email)
            .await?
            .filter(|principal| verify_password(password, &principal.password_hash))
            .ok_or(AppError::InvalidCredentials)?;

        let blocked = self
            .storage
            .find_profile(principal.id)
            .await?
            .map(|profile| profile.blocked)
            .unwrap_or(false);
        if blocked {
            return Err(AppError::Forbidden(ForbiddenReason::AccountBlocked));
        }

        Ok(principal)
    }

    async fn delete_identity(&self, user_id: Uuid) -> Result<()> {
        if !self.storage.delete_principal(user_id).await? {
            return Err(AppError::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }
}
