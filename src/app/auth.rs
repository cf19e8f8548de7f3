use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::{local, version4::V4, Local};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::app::relationship::user_from_row;
use crate::domain::user::{User, UserRole};
use crate::infra::db::Db;

/// Principal decoded from a bearer token: user id plus role, nothing else.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct AuthToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, Error)]
pub enum SignupError {
    #[error("username already exists")]
    UsernameTaken,
    #[error("email already in use")]
    EmailTaken,
    #[error(transparent)]
    Store(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct AuthService {
    db: Db,
    access_key: [u8; 32],
    access_ttl_hours: u64,
}

impl AuthService {
    pub fn new(db: Db, access_key: [u8; 32], access_ttl_hours: u64) -> Self {
        Self {
            db,
            access_key,
            access_ttl_hours,
        }
    }

    pub async fn signup(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> Result<User, SignupError> {
        let mut tx = self.db.pool().begin().await?;

        let username_taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(&username)
                .fetch_one(&mut *tx)
                .await?;
        if username_taken {
            return Err(SignupError::UsernameTaken);
        }

        let email_taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(&email)
                .fetch_one(&mut *tx)
                .await?;
        if email_taken {
            return Err(SignupError::EmailTaken);
        }

        let password_hash = hash_password(&password)?;
        let row = sqlx::query(
            "INSERT INTO users (username, email, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING id, username, email, role, bio, avatar_url, created_at",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match &err {
            // The pre-checks can still lose a race to a concurrent signup.
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                if db_err.constraint() == Some("users_email_key") {
                    SignupError::EmailTaken
                } else {
                    SignupError::UsernameTaken
                }
            }
            _ => SignupError::Store(err),
        })?;

        let user = user_from_row(&row)?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<(User, AuthToken)>> {
        let row = sqlx::query(
            "SELECT id, username, email, role, bio, avatar_url, created_at, password_hash \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let password_hash: String = sqlx::Row::get(&row, "password_hash");
        if !verify_password(password, &password_hash)? {
            return Ok(None);
        }

        let user = user_from_row(&row)?;
        let token = self.issue_access_token(user.id, user.role)?;
        Ok(Some((user, token)))
    }

    /// Decode and validate a bearer access token. The token alone carries the
    /// principal; no store round-trip happens here.
    pub fn authenticate_access_token(&self, token: &str) -> Result<Option<AuthSession>> {
        let claims = match self.decrypt_claims(token)? {
            Some(claims) => claims,
            None => return Ok(None),
        };
        if !has_token_type(&claims, "access") {
            return Ok(None);
        }

        let user_id = claim_uuid(&claims, "sub")?;
        let role = claims
            .get_claim("role")
            .and_then(|value| value.as_str())
            .and_then(UserRole::from_db)
            .ok_or_else(|| anyhow!("missing role claim"))?;

        Ok(Some(AuthSession { user_id, role }))
    }

    pub fn issue_access_token(&self, user_id: Uuid, role: UserRole) -> Result<AuthToken> {
        let duration = std::time::Duration::from_secs(self.access_ttl_hours * 60 * 60);
        let mut claims = Claims::new_expires_in(&duration)?;
        claims.issuer("oneiro")?;
        claims.audience("oneiro")?;
        claims.subject(&user_id.to_string())?;
        claims.add_additional("role", role.as_db())?;
        claims.add_additional("typ", "access")?;

        let key = SymmetricKey::<V4>::from(&self.access_key)?;
        let token = local::encrypt(&key, &claims, None, None)?;
        let expires_at = OffsetDateTime::now_utc() + Duration::hours(self.access_ttl_hours as i64);

        Ok(AuthToken { token, expires_at })
    }

    pub async fn get_current_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, role, bio, avatar_url, created_at \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(|row| user_from_row(&row))
            .transpose()
            .map_err(Into::into)
    }

    /// `Ok(None)` if the user is gone, `Ok(Some(false))` if the old password
    /// did not verify, `Ok(Some(true))` on success.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<Option<bool>> {
        let current_hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(self.db.pool())
                .await?;

        let Some(current_hash) = current_hash else {
            return Ok(None);
        };
        if !verify_password(old_password, &current_hash)? {
            return Ok(Some(false));
        }

        let new_hash = hash_password(new_password)?;
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(new_hash)
            .execute(self.db.pool())
            .await?;

        Ok(Some(true))
    }

    fn decrypt_claims(&self, token: &str) -> Result<Option<Claims>> {
        let key = SymmetricKey::<V4>::from(&self.access_key)?;
        let mut rules = ClaimsValidationRules::new();
        rules.validate_issuer_with("oneiro");
        rules.validate_audience_with("oneiro");

        let untrusted = match UntrustedToken::<Local, V4>::try_from(token) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        let trusted = match local::decrypt(&key, &untrusted, &rules, None, None) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        Ok(trusted.payload_claims().cloned())
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn claim_uuid(claims: &Claims, name: &str) -> Result<Uuid> {
    let value = claims
        .get_claim(name)
        .and_then(|value| value.as_str())
        .ok_or_else(|| anyhow!("missing {} claim", name))?;
    Ok(Uuid::parse_str(value)?)
}

fn has_token_type(claims: &Claims, expected: &str) -> bool {
    claims
        .get_claim("typ")
        .and_then(|value| value.as_str())
        .map(|value| value == expected)
        .unwrap_or(false)
}
