use std::sync::Arc;

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::user::{User, UserId},
};

/// Username to password-hash mapping backed by the `users` table.
#[derive(Clone)]
pub struct CredentialStore {
    db: SqlitePool,
    // Verified against when the username is unknown, so a miss costs the same
    // as a wrong password.
    decoy_hash: Arc<str>,
}

impl CredentialStore {
    pub fn new(db: SqlitePool) -> Result<Self, AppError> {
        let decoy_hash = hash_password("decoy-password-never-matches")?;
        Ok(Self {
            db,
            decoy_hash: decoy_hash.into(),
        })
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<UserId, AppError> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO users (id, username, password_hash) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(username)
            .bind(&password_hash)
            .execute(&self.db)
            .await
            .map_err(|e| {
                let duplicate = e
                    .as_database_error()
                    .is_some_and(|db_err| db_err.is_unique_violation());
                if duplicate {
                    AppError::DuplicateUsername
                } else {
                    AppError::Sqlx(e)
                }
            })?;

        tracing::info!(user_id = %id, "user registered");
        Ok(id)
    }

    pub async fn verify(&self, username: &str, password: &str) -> Result<UserId, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        let stored_hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.decoy_hash.to_string(),
        };
        let password = password.to_owned();
        let matches =
            tokio::task::spawn_blocking(move || password_matches(&password, &stored_hash))
                .await??;

        match user {
            Some(user) if matches => Ok(user.id),
            _ => Err(AppError::InvalidCredentials),
        }
    }
}

fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

fn password_matches(password: &str, stored_hash: &str) -> Result<bool, password_hash::Error> {
    let parsed_hash = PasswordHash::new(stored_hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}
