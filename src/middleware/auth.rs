use axum::{extract::FromRequestParts, http::header};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_USER: &str = "user";

#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthUser {
    /// Admins and managers run the back office.
    pub fn is_staff(&self) -> bool {
        self.role == ROLE_ADMIN || self.role == ROLE_MANAGER
    }
}

pub fn ensure_role(user: &AuthUser, role: &str) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden(format!("requires role {role}")));
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, ROLE_ADMIN)
}

pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_staff() {
        return Err(AppError::Forbidden("requires admin or manager role".into()));
    }
    Ok(())
}

/// Sign a bearer token for `user_id`. Used by the seed binary and tests;
/// interactive login lives outside this service.
pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    role: &str,
    ttl: Duration,
) -> Result<String, AppError> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_token(secret: &str, token: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        verify_token(&secret, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_identity_and_role() {
        let user_id = Uuid::new_v4();
        let token = issue_token("secret", user_id, ROLE_MANAGER, Duration::hours(1)).unwrap();
        let user = verify_token("secret", &token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert!(user.is_staff());
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = issue_token("secret", Uuid::new_v4(), ROLE_USER, Duration::hours(1)).unwrap();
        let err = verify_token("other", &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn staff_guard_rejects_plain_users() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            role: ROLE_USER.into(),
        };
        assert!(matches!(ensure_staff(&user), Err(AppError::Forbidden(_))));
        assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden(_))));

        let manager = AuthUser {
            user_id: Uuid::new_v4(),
            role: ROLE_MANAGER.into(),
        };
        assert!(ensure_staff(&manager).is_ok());
        assert!(ensure_admin(&manager).is_err());
    }
}
