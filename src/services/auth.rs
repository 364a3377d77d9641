// SPDX-License-Identifier: MIT

//! Account and token service: signup, login, and refresh token rotation.
//!
//! Access and refresh tokens are both HS256 JWTs. Refresh tokens are
//! additionally persisted, one row per (user, device) slot; presenting a
//! refresh token whose string the slot no longer holds fails, which is what
//! invalidates stale tokens after a rotation.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::NaiveDateTime;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, ErrorKind, Result};
use crate::models::user::{Role, User};

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Token id; present on refresh tokens so two issued in the same
    /// second never collide as strings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Signs and verifies the JWTs used for both token types.
#[derive(Clone)]
pub struct TokenIssuer {
    signing_key: Vec<u8>,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(config: &Config) -> Self {
        Self {
            signing_key: config.jwt_signing_key.clone(),
            access_ttl_secs: config.access_token_ttl_secs,
            refresh_ttl_secs: config.refresh_token_ttl_secs,
        }
    }

    pub fn issue_access_token(&self, user_id: i64) -> Result<String> {
        self.sign(user_id, self.access_ttl_secs, None)
    }

    /// Returns the refresh token together with its expiry, which is also
    /// written into the token's slot row.
    pub fn issue_refresh_token(&self, user_id: i64) -> Result<(String, NaiveDateTime)> {
        let mut buf = [0u8; 16];
        OsRng.fill_bytes(&mut buf);
        let jti = format!("{:032x}", u128::from_le_bytes(buf));

        let token = self.sign(user_id, self.refresh_ttl_secs, Some(jti))?;
        let expires_at =
            chrono::Utc::now().naive_utc() + chrono::Duration::seconds(self.refresh_ttl_secs);
        Ok((token, expires_at))
    }

    fn sign(&self, user_id: i64, ttl_secs: i64, jti: Option<String>) -> Result<String> {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + ttl_secs as usize,
            jti,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT signing failed: {}", e)))
    }

    /// Decode and validate signature + expiry. Fails closed: any parse,
    /// signature or expiry problem is `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let key = DecodingKey::from_secret(&self.signing_key);
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &key, &validation)
            .ok()
            .map(|data| data.claims)
    }

    /// User id from a verified token's claims.
    pub fn extract_user_id(claims: &Claims) -> Option<i64> {
        claims.sub.parse().ok()
    }
}

/// A freshly issued access + refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct AuthService {
    db: Arc<Database>,
    issuer: TokenIssuer,
    access_ttl_secs: i64,
}

impl AuthService {
    pub fn new(db: Arc<Database>, config: &Config) -> Self {
        Self {
            db,
            issuer: TokenIssuer::new(config),
            access_ttl_secs: config.access_token_ttl_secs,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Register a local username/password account.
    pub fn signup(
        &self,
        username: &str,
        password: &str,
        nickname: Option<&str>,
    ) -> Result<User> {
        if self.db.username_exists(username)? {
            return Err(ErrorKind::DuplicatedUsername.into());
        }

        let hash = hash_password(password)?;
        let user_id = self
            .db
            .create_local_user(username, &hash, nickname, Role::User)?;

        tracing::info!(user_id, "User registered");

        self.db
            .get_user(user_id)?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user vanished after insert")))
    }

    /// Username/password login. Issues a token pair into the (user, device)
    /// refresh slot, overwriting whatever the slot held before.
    pub fn login(
        &self,
        username: &str,
        password: &str,
        device_id: Option<&str>,
    ) -> Result<TokenPair> {
        let user = self
            .db
            .get_user_by_username(username)?
            .ok_or(ErrorKind::UserNotFound)?;

        let stored_hash = user
            .password
            .as_deref()
            .ok_or(ErrorKind::PasswordNotMatched)?;
        if !verify_password(password, stored_hash) {
            return Err(ErrorKind::PasswordNotMatched.into());
        }

        tracing::info!(user_id = user.id, "User logged in");
        self.issue_for(user.id, device_id)
    }

    /// Issue a fresh pair and write the refresh token into its slot.
    pub fn issue_for(&self, user_id: i64, device_id: Option<&str>) -> Result<TokenPair> {
        let access_token = self.issuer.issue_access_token(user_id)?;
        let (refresh_token, expires_at) = self.issuer.issue_refresh_token(user_id)?;

        self.db
            .upsert_refresh_slot(user_id, device_id, &refresh_token, expires_at)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_ttl_secs,
        })
    }

    /// Refresh token rotation. The presented token must pass signature
    /// verification and must be the exact string its slot currently holds;
    /// the slot is then overwritten in place with a new token, so the
    /// presented string can never be replayed.
    pub fn rotate(&self, presented: &str) -> Result<TokenPair> {
        let claims = self
            .issuer
            .verify(presented)
            .ok_or(ErrorKind::InvalidRefreshToken)?;
        let user_id =
            TokenIssuer::extract_user_id(&claims).ok_or(ErrorKind::InvalidRefreshToken)?;

        let row = self
            .db
            .find_refresh_token(presented)?
            .ok_or(ErrorKind::InvalidRefreshToken)?;

        if row.user_id != user_id {
            return Err(ErrorKind::InvalidRefreshToken.into());
        }
        if row.is_expired(chrono::Utc::now().naive_utc()) {
            return Err(ErrorKind::RefreshTokenExpired.into());
        }

        let access_token = self.issuer.issue_access_token(user_id)?;
        let (refresh_token, expires_at) = self.issuer.issue_refresh_token(user_id)?;
        self.db
            .rotate_refresh_token(row.id, &refresh_token, expires_at)?;

        tracing::debug!(user_id, "Refresh token rotated");

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_ttl_secs,
        })
    }

    /// Single-device logout: delete the row holding exactly this token.
    pub fn revoke(&self, presented: &str) -> Result<()> {
        if !self.db.delete_refresh_token(presented)? {
            return Err(ErrorKind::InvalidRefreshToken.into());
        }
        Ok(())
    }

    /// Global logout: delete every slot the user owns. Returns the count.
    pub fn revoke_all(&self, user_id: i64) -> Result<usize> {
        let revoked = self.db.delete_all_refresh_tokens(user_id)?;
        tracing::info!(user_id, revoked, "All refresh tokens revoked");
        Ok(revoked)
    }

    /// Verify an access token and load its user for request handling.
    pub fn authenticate(&self, access_token: &str) -> Result<User> {
        let claims = self
            .issuer
            .verify(access_token)
            .ok_or(ErrorKind::UnauthorizedUser)?;
        let user_id =
            TokenIssuer::extract_user_id(&claims).ok_or(ErrorKind::UnauthorizedUser)?;

        self.db
            .get_user(user_id)?
            .ok_or_else(|| ErrorKind::UnauthorizedUser.into())
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
