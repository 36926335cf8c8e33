//! Admin gate: a shared-secret header checked by an extractor.
//!
//! Issuance and storage of the secret live outside this service; handlers
//! that take an [`AdminToken`] argument are unreachable without it.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::ServiceError;
use crate::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Proof that the request carried the configured admin secret.
#[derive(Debug, Clone, Copy)]
pub struct AdminToken;

#[async_trait]
impl FromRequestParts<AppState> for AdminToken {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        if !provided.is_empty() && constant_time_eq(provided, &state.config.admin_token) {
            Ok(AdminToken)
        } else {
            Err(ServiceError::Unauthorized(
                "Admin token missing or invalid".to_string(),
            ))
        }
    }
}

// Compares without an early exit on the first mismatching byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_matches_equality() {
        assert!(constant_time_eq("secret", "secret"));
        assert!(!constant_time_eq("secret", "secreT"));
        assert!(!constant_time_eq("secret", "secrets"));
        assert!(!constant_time_eq("", "secret"));
    }
}
