// ABOUTME: Email and password authentication endpoints backed by the identity gateway
// ABOUTME: Handles registration, login, logout and the current-principal view

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_extra::extract::cookie::CookieJar;

use crate::authz::{self, Decision, Denial, Target};
use crate::error::{AppError, ForbiddenReason, Result};
use crate::identity::MIN_PASSWORD_LEN;
use crate::types::*;
use crate::{auth_helpers, roles, session, AppState};

fn start_session(state: &AppState, jar: CookieJar, user_id: uuid::Uuid) -> CookieJar {
    let session_id = state.sessions.create_session(user_id);
    let cookie = session::create_session_cookie(
        session_id,
        state.config.secure_cookies,
        state.sessions.max_age_seconds(),
    );
    jar.add(cookie)
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>)> {
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if req.password != req.confirm_password {
        return Err(AppError::Validation("Passwords do not match".into()));
    }

    let principal = state
        .identity
        .sign_up(&req.email, &req.password, &req.username)
        .await?;

    let jar = start_session(&state, jar, principal.id);
    let role = roles::resolve_role(&state.storage, principal.id).await?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            success: true,
            user_id: principal.id,
            username: principal.username,
            role,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let principal = match state.identity.sign_in(&req.email, &req.password).await {
        Ok(principal) => principal,
        Err(err) => {
            tracing::warn!(email = %req.email.trim(), "Login rejected: {}", err);
            return Err(err);
        }
    };

    let jar = start_session(&state, jar, principal.id);
    let role = roles::resolve_role(&state.storage, principal.id).await?;
    tracing::info!(user_id = %principal.id, "Signed in");

    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            user_id: principal.id,
            username: principal.username,
            role,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<serde_json::Value>) {
    if let Some(session_cookie) = jar.get(session::SESSION_COOKIE_NAME) {
        state.sessions.remove_session(session_cookie.value());
    }

    let jar = jar.add(session::create_logout_cookie(state.config.secure_cookies));
    (jar, Json(serde_json::json!({"success": true})))
}

pub async fn me(State(state): State<AppState>, jar: CookieJar) -> Result<Json<MeResponse>> {
    let actor = auth_helpers::require_actor(&jar, &state).await?;
    let user_id = actor.require_id()?;

    let profile = state
        .storage
        .find_profile(user_id)
        .await?
        .ok_or(AppError::NotAuthenticated)?;

    Ok(Json(MeResponse {
        user_id,
        username: profile.username,
        email: profile.email,
        role: actor.role,
        blocked: profile.blocked,
        capabilities: authz::capabilities(&actor),
    }))
}

/// Ask the gate whether the caller may perform a named action. Unknown action
/// names are refused with 403.
pub async fn check_permission(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(action): Path<String>,
) -> Result<Json<PermissionResponse>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    let target = Target::owned_by(actor.id);
    let decision = authz::authorize_named(&actor, &action, &target);

    if decision == Decision::Deny(Denial::Forbidden(ForbiddenReason::UnknownAction)) {
        return Err(AppError::Forbidden(ForbiddenReason::UnknownAction));
    }

    Ok(Json(PermissionResponse {
        action,
        allowed: decision.is_allowed(),
    }))
}
