//! Auth Gate
//!
//! Bearer-token role check for the admin routes. Login sessions are handled
//! elsewhere; this gate only maps a token to a role. Handlers opt in by
//! taking `RequireAdmin` or `RequireStaff`, which run before the body is read.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};

use crate::commands::ApiError;
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

/// Which roles a route group accepts
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const ADMIN_OR_STAFF: &[Role] = &[Role::Admin, Role::Staff];

#[derive(Clone)]
pub struct AuthGate {
    admin_token: blake3::Hash,
    staff_token: Option<blake3::Hash>,
}

impl AuthGate {
    pub fn new(admin_token: &str, staff_token: Option<&str>) -> Self {
        Self {
            admin_token: blake3::hash(admin_token.as_bytes()),
            staff_token: staff_token.map(|t| blake3::hash(t.as_bytes())),
        }
    }

    /// blake3::Hash compares in constant time
    pub fn role_for(&self, token: &str) -> Option<Role> {
        let presented = blake3::hash(token.as_bytes());
        if presented == self.admin_token {
            Some(Role::Admin)
        } else if self.staff_token == Some(presented) {
            Some(Role::Staff)
        } else {
            None
        }
    }

    /// Missing or unknown token -> Unauthorized, known token with the wrong role -> Forbidden
    pub fn authorize(&self, headers: &HeaderMap, allowed: &[Role]) -> DomainResult<Role> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DomainError::Unauthorized("Not signed in".to_string()))?;

        let role = self
            .role_for(token)
            .ok_or_else(|| DomainError::Unauthorized("Not signed in".to_string()))?;
        if !allowed.contains(&role) {
            return Err(DomainError::Forbidden("Not permitted".to_string()));
        }
        Ok(role)
    }
}

/// Extractor that lets only the admin through
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub Role);

/// Extractor for the reservation desk: admin or staff
#[derive(Debug, Clone, Copy)]
pub struct RequireStaff(pub Role);

fn check(parts: &Parts, gate: &AuthGate, allowed: &[Role]) -> Result<Role, ApiError> {
    gate.authorize(&parts.headers, allowed).map_err(|e| {
        tracing::warn!(path = %parts.uri.path(), error = %e, "Request rejected by auth gate");
        ApiError(e)
    })
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AuthGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        check(parts, &AuthGate::from_ref(state), ADMIN_ONLY).map(RequireAdmin)
    }
}

impl<S> FromRequestParts<S> for RequireStaff
where
    AuthGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        check(parts, &AuthGate::from_ref(state), ADMIN_OR_STAFF).map(RequireStaff)
    }
}
