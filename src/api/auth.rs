use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::ApiError;
use crate::domain::{AccountId, Role};
use crate::services::{Claims, IdentityError, TokenIssuer};

// ============================================================================
// Middleware
// ============================================================================

/// Validates `Authorization: Bearer <token>` and stores the claims in the
/// request extensions for [`Principal`] to pick up.
pub async fn bearer_auth(
    State(tokens): State<Arc<TokenIssuer>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    let claims = tokens.validate(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::from(IdentityError::from(e))
    })?;

    tracing::Span::current().record("user_id", claims.sub.as_str());
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        let token = token.trim();
        return (!token.is_empty()).then_some(token);
    }

    None
}

// ============================================================================
// Extractor
// ============================================================================

/// The authenticated caller, read from claims set by [`bearer_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: AccountId,
    pub username: String,
    pub role: Role,
}

impl Principal {
    /// Fails with 403 unless the caller holds one of `allowed`.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "{} role is not permitted here",
                self.role
            )))
        }
    }
}

impl TryFrom<&Claims> for Principal {
    type Error = ApiError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let id = claims
            .account_id()
            .map_err(|e| ApiError::from(IdentityError::from(e)))?;

        Ok(Self {
            id,
            username: claims.name.clone(),
            role: claims.role,
        })
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

        Self::try_from(claims)
    }
}

/// Free-function form of [`Principal::require_role`].
pub fn require_role(principal: &Principal, allowed: &[Role]) -> Result<(), ApiError> {
    principal.require_role(allowed)
}
