//! Account routes: registration, login, profile

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use medibook_auth::{AuthError, OptionalAuth, RequireAuth};
use medibook_db::{NewPrincipal, Principal, Role};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::response::{ApiJson, Envelope};
use crate::state::AppState;
use crate::validation::{MAX_NAME_LENGTH, Validator, normalize_email};

use super::types::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
};

fn record_login(outcome: &'static str) {
    metrics::counter!("medibook_auth_logins_total", "outcome" => outcome).increment(1);
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = normalize_email(&req.email);
    let role = req.role.unwrap_or(Role::Patient);
    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    Validator::new()
        .email("email", &email)
        .password("password", &req.password)
        .text("name", &name, MAX_NAME_LENGTH)
        .check(role != Role::Admin, "role", "Role must be patient or doctor")
        .finish()?;

    let password_hash = state.passwords.hash(&req.password).await?;
    let principal = state
        .db
        .insert_principal(NewPrincipal {
            email,
            password_hash,
            name,
            role,
        })
        .await?;

    let token = state.tokens.issue(&principal)?;
    info!("Registered {} {}", principal.role, principal.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "Registration successful".to_string(),
            user: principal,
            token,
        }),
    ))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = normalize_email(&req.email);

    let Some(principal) = state.db.find_principal_by_email(&email).await? else {
        state.passwords.verify_absent(&req.password).await?;
        record_login("failure");
        warn!("Login failed: unknown account");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !state
        .passwords
        .verify(&req.password, &principal.password_hash)
        .await?
    {
        record_login("failure");
        warn!("Login failed for principal {}", principal.id);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.tokens.issue(&principal)?;
    record_login("success");
    info!("Principal {} logged in", principal.id);

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        user: principal,
        token,
    }))
}

/// POST /api/v1/auth/logout
///
/// Tokens are stateless; the client discards its copy.
async fn logout(OptionalAuth(user): OptionalAuth) -> Json<Envelope<()>> {
    if let Some(user) = user {
        info!("Principal {} logged out", user.id);
    }
    Envelope::message("Logged out")
}

async fn load_principal(state: &AppState, id: i64) -> Result<Principal, ApiError> {
    state
        .db
        .find_principal_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))
}

/// GET /api/v1/auth/me
async fn get_me(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<Principal>>, ApiError> {
    let principal = load_principal(&state, user.id).await?;
    Ok(Envelope::ok("Profile retrieved", principal))
}

/// PUT /api/v1/auth/me
async fn update_me(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<Envelope<Principal>>, ApiError> {
    let name = req.name.trim();
    Validator::new().text("name", name, MAX_NAME_LENGTH).finish()?;

    if state.db.update_principal_name(user.id, name).await? == 0 {
        return Err(ApiError::NotFound("Account not found".to_string()));
    }

    let principal = load_principal(&state, user.id).await?;
    Ok(Envelope::ok("Profile updated", principal))
}

/// PUT /api/v1/auth/password
async fn change_password(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<Envelope<()>>, ApiError> {
    Validator::new()
        .password("new_password", &req.new_password)
        .finish()?;

    let principal = load_principal(&state, user.id).await?;
    if !state
        .passwords
        .verify(&req.current_password, &principal.password_hash)
        .await?
    {
        return Err(ApiError::invalid(
            "current_password",
            "Current password is incorrect",
        ));
    }

    let password_hash = state.passwords.hash(&req.new_password).await?;
    state
        .db
        .update_principal_password(principal.id, &password_hash)
        .await?;

    info!("Principal {} changed password", principal.id);
    Ok(Envelope::message("Password updated"))
}

/// Create account routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/me", get(get_me).put(update_me))
        .route("/api/v1/auth/password", put(change_password))
}
