use sqlx::FromRow;

/// A registered account. Doubles as the credential record: the hash is an
/// argon2 PHC string and is never serialized towards clients.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub username: String,
    pub password_hash: String,
}
