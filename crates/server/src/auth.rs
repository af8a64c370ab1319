//! Staff bearer tokens.
//!
//! Every `/orgs/:org_id/...` route requires `Authorization: Bearer <jwt>`
//! signed with the configured secret (HS256). The token names the staff
//! member (`sub`) and the single organization they may act on (`org_id`).

use axum::{
    async_trait,
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::state::ServerState;

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffClaims {
    pub sub: String,
    pub org_id: Uuid,
    pub exp: usize,
}

/// Sign a staff token valid for `ttl_secs`.
pub fn issue_token(
    secret: &str,
    sub: &str,
    org_id: Uuid,
    ttl_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (Utc::now().timestamp() + ttl_secs).max(0) as usize;
    let claims = StaffClaims { sub: sub.to_string(), org_id, exp };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Reject requests without a valid staff token; a missing token is 400, an
/// invalid or expired one 401. Verified claims go into request extensions.
pub async fn require_staff_token(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    let token = match req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        None => {
            warn!(path = %path, "missing Authorization header");
            return Err(ApiError::MissingToken);
        }
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                warn!(path = %path, "invalid Authorization format (expect Bearer)");
                return Err(ApiError::Unauthorized);
            }
        },
    };

    let key = DecodingKey::from_secret(state.auth.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    match decode::<StaffClaims>(&token, &key, &validation) {
        Ok(data) => {
            req.extensions_mut().insert(data.claims);
            Ok(next.run(req).await)
        }
        Err(e) => {
            warn!(path = %path, err = %e, "token validation failed");
            Err(ApiError::Unauthorized)
        }
    }
}

/// The organization a request acts on, checked against the caller's token.
#[derive(Debug, Clone)]
pub struct OrgScope {
    pub org_id: Uuid,
    pub staff: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for OrgScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<StaffClaims>().cloned().ok_or(ApiError::Unauthorized)?;
        let params = RawPathParams::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let raw = params
            .iter()
            .find(|(name, _)| *name == "org_id")
            .map(|(_, value)| value.to_string())
            .ok_or_else(|| ApiError::BadRequest("missing org_id".into()))?;
        let org_id: Uuid = raw.parse().map_err(|_| ApiError::BadRequest(format!("invalid org_id: {raw}")))?;
        if claims.org_id != org_id {
            warn!(staff = %claims.sub, token_org = %claims.org_id, %org_id, "cross-organization request denied");
            return Err(ApiError::Forbidden);
        }
        Ok(OrgScope { org_id, staff: claims.sub })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_decodes_with_same_secret() {
        let org_id = Uuid::new_v4();
        let token = issue_token("s3cret", "front-desk", org_id, 60).unwrap();
        let data = decode::<StaffClaims>(
            &token,
            &DecodingKey::from_secret(b"s3cret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(data.claims.org_id, org_id);
        assert_eq!(data.claims.sub, "front-desk");
    }

    #[test]
    fn issued_token_fails_with_other_secret() {
        let token = issue_token("s3cret", "front-desk", Uuid::new_v4(), 60).unwrap();
        let res = decode::<StaffClaims>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(res.is_err());
    }
}
