//! Credential store: one-way password hashing and verification.
//!
//! Hashes are argon2id PHC strings. Verification goes through
//! [`argon2::PasswordVerifier`], which compares digests in constant time and
//! takes its cost parameters from the stored string, so rows hashed under an
//! older [`HashingConfig`] keep verifying after the config changes.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};
use sqlx::SqliteConnection;

use crate::{config::HashingConfig, error::AppError, models::user::User, queries};

#[derive(Debug, Clone)]
pub struct CredentialStore {
    params: Params,
}

impl CredentialStore {
    pub fn new(config: &HashingConfig) -> Result<Self, AppError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|err| AppError::Config(format!("invalid argon2 parameters: {err}")))?;
        Ok(Self { params })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| anyhow::anyhow!("password hashing failed: {err}"))?;
        Ok(hash.to_string())
    }

    pub fn matches(&self, plaintext: &str, password_hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|err| anyhow::anyhow!("stored password hash is unreadable: {err}"))?;
        match self.hasher().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(anyhow::anyhow!("password verification failed: {err}").into()),
        }
    }

    /// Stores a fresh credential record for `username`.
    pub async fn register(
        &self,
        conn: &mut SqliteConnection,
        username: &str,
        plaintext: &str,
    ) -> Result<User, AppError> {
        if queries::user_exists(&mut *conn, username).await? {
            return Err(AppError::DuplicateIdentity);
        }
        let password_hash = self.hash(plaintext)?;
        match queries::insert_user(&mut *conn, username, &password_hash).await {
            Ok(()) => {}
            // Lost a race against a concurrent registration of the same name.
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Err(AppError::DuplicateIdentity);
            }
            Err(err) => return Err(err.into()),
        }
        Ok(User {
            username: username.to_string(),
            password_hash,
        })
    }

    /// `None` when no such user exists.
    pub async fn verify(
        &self,
        conn: &mut SqliteConnection,
        username: &str,
        plaintext: &str,
    ) -> Result<Option<bool>, AppError> {
        let Some(user) = queries::find_user(conn, username).await? else {
            return Ok(None);
        };
        self.matches(plaintext, &user.password_hash).map(Some)
    }

    /// Replaces the stored hash. Callers verify the current password first.
    pub async fn rotate(
        &self,
        conn: &mut SqliteConnection,
        username: &str,
        new_plaintext: &str,
    ) -> Result<(), AppError> {
        let password_hash = self.hash(new_plaintext)?;
        if queries::update_password_hash(conn, username, &password_hash).await? == 0 {
            return Err(AppError::UnknownUser);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn hash_is_salted_and_verifies() {
        let store = CredentialStore::new(&testing::cheap_hashing()).unwrap();
        let first = store.hash("korona").unwrap();
        let second = store.hash("korona").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(store.matches("korona", &first).unwrap());
        assert!(!store.matches("Korona", &first).unwrap());
    }

    #[test]
    fn verifies_hashes_made_with_other_params() {
        let store = CredentialStore::new(&testing::cheap_hashing()).unwrap();
        let old = CredentialStore::new(&HashingConfig {
            memory_kib: 16,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let hash = old.hash("pwd").unwrap();
        assert!(store.matches("pwd", &hash).unwrap());
    }

    #[test]
    fn rejects_invalid_params() {
        let err = CredentialStore::new(&HashingConfig {
            memory_kib: 0,
            iterations: 0,
            parallelism: 0,
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn garbage_hash_is_an_internal_error() {
        let store = CredentialStore::new(&testing::cheap_hashing()).unwrap();
        let err = store.matches("pwd", "not-a-phc-string").unwrap_err();
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn register_verify_rotate() {
        let ctx = testing::TestContext::new().await;
        let store = &ctx.state.credentials;
        let mut conn = ctx.state.db.acquire().await.unwrap();

        store.register(&mut conn, "iza", "korona").await.unwrap();
        let dup = store.register(&mut conn, "iza", "other").await.unwrap_err();
        assert!(matches!(dup, AppError::DuplicateIdentity));

        assert_eq!(store.verify(&mut conn, "iza", "korona").await.unwrap(), Some(true));
        assert_eq!(store.verify(&mut conn, "iza", "nope").await.unwrap(), Some(false));
        assert_eq!(store.verify(&mut conn, "ghost", "korona").await.unwrap(), None);

        store.rotate(&mut conn, "iza", "pwd").await.unwrap();
        assert_eq!(store.verify(&mut conn, "iza", "korona").await.unwrap(), Some(false));
        assert_eq!(store.verify(&mut conn, "iza", "pwd").await.unwrap(), Some(true));

        let missing = store.rotate(&mut conn, "ghost", "pwd").await.unwrap_err();
        assert!(matches!(missing, AppError::UnknownUser));
    }
}
