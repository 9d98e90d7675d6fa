// ABOUTME: Authentication helper functions turning the session cookie into an actor context
// ABOUTME: Role and block state are loaded fresh so changes apply without re-login

use axum_extra::extract::cookie::CookieJar;

use crate::authz::Actor;
use crate::error::{AppError, Result};
use crate::{roles, session, AppState};

/// Anonymous when there is no live session. A session whose principal no
/// longer exists is dropped and treated as anonymous too.
pub async fn resolve_actor(jar: &CookieJar, state: &AppState) -> Result<Actor> {
    let Some(session_data) = session::session_from_jar(jar, &state.sessions) else {
        return Ok(Actor::anonymous());
    };

    let Some(profile) = state.storage.find_profile(session_data.user_id).await? else {
        state.sessions.remove_user_sessions(session_data.user_id);
        return Ok(Actor::anonymous());
    };

    let role = roles::resolve_role(&state.storage, session_data.user_id).await?;
    Ok(Actor::principal(session_data.user_id, role, profile.blocked))
}

/// Like `resolve_actor`, but anonymous callers are rejected up front.
pub async fn require_actor(jar: &CookieJar, state: &AppState) -> Result<Actor> {
    let actor = resolve_actor(jar, state).await?;
    if actor.id.is_none() {
        return Err(AppError::NotAuthenticated);
    }
    Ok(actor)
}
