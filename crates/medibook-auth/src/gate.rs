//! Request extractors that establish and check the caller's identity

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use medibook_db::Role;
use serde::Serialize;
use std::convert::Infallible;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::error::{AuthError, UnauthenticatedReason};
use crate::jwt::{Claims, TokenService};

/// Identity resolved from a verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Create from verified claims; a non-numeric subject is treated as a bad token
    pub fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| AuthError::Unauthenticated(UnauthenticatedReason::InvalidSignature))?;
        Ok(Self {
            id,
            email: claims.email.clone(),
            role: claims.role,
        })
    }
}

/// Pull the token out of an `Authorization` header value
pub fn bearer_token(header: &str) -> Result<&str, UnauthenticatedReason> {
    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(UnauthenticatedReason::MalformedHeader),
    }
}

fn reject(reason: UnauthenticatedReason) -> AuthError {
    metrics::counter!("medibook_auth_rejections_total", "reason" => reason.as_str()).increment(1);
    debug!("Request rejected: {}", reason.as_str());
    AuthError::Unauthenticated(reason)
}

/// Resolve the caller from request headers
pub fn authenticate(parts: &Parts, tokens: &TokenService) -> Result<AuthUser, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| reject(UnauthenticatedReason::MissingToken))?
        .to_str()
        .map_err(|_| reject(UnauthenticatedReason::MalformedHeader))?;

    let token = bearer_token(header).map_err(reject)?;
    let claims = tokens.verify(token).map_err(|e| reject(e.into()))?;
    let user = AuthUser::from_claims(&claims)?;

    debug!("Authenticated principal {} ({})", user.id, user.role);
    Ok(user)
}

/// Resolve the caller if a usable token is present
pub fn authenticate_optional(parts: &Parts, tokens: &TokenService) -> Option<AuthUser> {
    if !parts.headers.contains_key(AUTHORIZATION) {
        return None;
    }
    authenticate(parts, tokens).ok()
}

/// Role sets accepted by [`RequireRole`]
pub trait RolePolicy: Send + Sync + 'static {
    const ALLOWED: &'static [Role];
}

/// Check a caller's role against a policy
pub fn authorize<P: RolePolicy>(user: &AuthUser) -> Result<(), AuthError> {
    if P::ALLOWED.contains(&user.role) {
        Ok(())
    } else {
        debug!("Principal {} with role {} denied", user.id, user.role);
        metrics::counter!("medibook_auth_rejections_total", "reason" => "forbidden").increment(1);
        Err(AuthError::Forbidden)
    }
}

/// Doctors manage their own practice data
pub struct DoctorOnly;

impl RolePolicy for DoctorOnly {
    const ALLOWED: &'static [Role] = &[Role::Doctor];
}

pub struct AdminOnly;

impl RolePolicy for AdminOnly {
    const ALLOWED: &'static [Role] = &[Role::Admin];
}

/// Extractor for an authenticated caller (required)
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        authenticate(parts, &tokens).map(RequireAuth)
    }
}

/// Extractor that never rejects; `None` when no valid token was sent
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        Ok(OptionalAuth(authenticate_optional(parts, &tokens)))
    }
}

/// Extractor for an authenticated caller whose role satisfies `P`
pub struct RequireRole<P: RolePolicy>(pub AuthUser, PhantomData<P>);

impl<P: RolePolicy> RequireRole<P> {
    pub fn user(&self) -> &AuthUser {
        &self.0
    }

    pub fn into_user(self) -> AuthUser {
        self.0
    }
}

impl<S, P> FromRequestParts<S> for RequireRole<P>
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
    P: RolePolicy,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        authorize::<P>(&user)?;
        Ok(RequireRole(user, PhantomData))
    }
}

pub type RequireDoctor = RequireRole<DoctorOnly>;
pub type RequireAdmin = RequireRole<AdminOnly>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, body::Body, http::Request, http::StatusCode, routing::get};
    use chrono::{Duration, Utc};
    use medibook_db::Principal;
    use tower::ServiceExt;

    fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new("gate-test-secret", Duration::days(7)).unwrap())
    }

    fn principal(id: i64, role: Role) -> Principal {
        Principal {
            id,
            email: format!("p{id}@x.com"),
            password_hash: String::new(),
            name: "P".to_string(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn app(tokens: Arc<TokenService>) -> Router {
        Router::new()
            .route("/me", get(|RequireAuth(user): RequireAuth| async move { Json(user) }))
            .route(
                "/maybe",
                get(|OptionalAuth(user): OptionalAuth| async move {
                    user.map(|u| u.id.to_string()).unwrap_or_else(|| "anonymous".to_string())
                }),
            )
            .route("/doctor", get(|doctor: RequireDoctor| async move { doctor.user().id.to_string() }))
            .route("/admin", get(|_: RequireAdmin| async { "ok" }))
            .with_state(tokens)
    }

    async fn call(app: Router, path: &str, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri(path);
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Ok("abc.def.ghi"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), Err(UnauthenticatedReason::MalformedHeader));
        assert_eq!(bearer_token("Bearer "), Err(UnauthenticatedReason::MalformedHeader));
        assert_eq!(bearer_token("bearer abc"), Err(UnauthenticatedReason::MalformedHeader));
    }

    #[tokio::test]
    async fn test_missing_and_malformed_headers_are_401() {
        let app = app(tokens());

        let (status, body) = call(app.clone(), "/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Authentication required"));

        let (status, body) = call(app, "/me", Some("Token abc")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Invalid authorization header format"));
    }

    #[tokio::test]
    async fn test_valid_token_resolves_principal() {
        let tokens = tokens();
        let token = tokens.issue(&principal(7, Role::Patient)).unwrap();

        let (status, body) = call(app(tokens), "/me", Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
        let user: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(user["id"], 7);
        assert_eq!(user["role"], "patient");
    }

    #[tokio::test]
    async fn test_expired_token_has_its_own_message() {
        let tokens = tokens();
        let token = tokens
            .issue_at(&principal(7, Role::Patient), Utc::now() - Duration::days(8))
            .unwrap();

        let (status, body) = call(app(tokens), "/me", Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Session expired"));
    }

    #[tokio::test]
    async fn test_optional_auth_never_rejects() {
        let tokens = tokens();
        let token = tokens.issue(&principal(3, Role::Patient)).unwrap();
        let app = app(tokens);

        assert_eq!(call(app.clone(), "/maybe", None).await, (StatusCode::OK, "anonymous".to_string()));
        assert_eq!(
            call(app.clone(), "/maybe", Some("Bearer nonsense")).await,
            (StatusCode::OK, "anonymous".to_string())
        );
        assert_eq!(
            call(app, "/maybe", Some(&format!("Bearer {token}"))).await,
            (StatusCode::OK, "3".to_string())
        );
    }

    #[tokio::test]
    async fn test_role_mismatch_is_403() {
        let tokens = tokens();
        let patient = tokens.issue(&principal(1, Role::Patient)).unwrap();
        let doctor = tokens.issue(&principal(2, Role::Doctor)).unwrap();
        let app = app(tokens);

        let (status, _) = call(app.clone(), "/doctor", Some(&format!("Bearer {patient}"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(app.clone(), "/doctor", Some(&format!("Bearer {doctor}"))).await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "2"));

        let (status, _) = call(app.clone(), "/admin", Some(&format!("Bearer {doctor}"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Identity is checked before role
        let (status, _) = call(app, "/admin", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
