// ABOUTME: User management for privileged roles: listing, blocking, promotion and deletion
// ABOUTME: Every operation goes through the authorization gate with the target's current role

use serde::Serialize;
use uuid::Uuid;

use crate::authz::{self, Action, Actor, Target};
use crate::entities::profile;
use crate::error::{AppError, Result};
use crate::identity::IdentityGateway;
use crate::roles::{self, Role};
use crate::storage::Storage;

#[derive(Debug, Clone, Serialize)]
pub struct UserWithRole {
    #[serde(flatten)]
    pub profile: profile::Model,
    pub role: Role,
}

pub async fn list_users(storage: &Storage, actor: &Actor) -> Result<Vec<UserWithRole>> {
    authz::authorize(actor, Action::ViewAllUsers, &Target::none()).into_result()?;

    let roles = storage.all_roles().await?;
    let users = storage
        .list_profiles()
        .await?
        .into_iter()
        .map(|profile| {
            let role = roles.get(&profile.user_id).copied().unwrap_or_default();
            UserWithRole { profile, role }
        })
        .collect();

    Ok(users)
}

/// The gate needs the target's role before we know whether it exists, so an
/// unknown id resolves to `user` and fails with NotFound after authorization.
async fn target_for(storage: &Storage, user_id: Uuid) -> Result<Target> {
    let role = roles::resolve_role(storage, user_id).await?;
    Ok(Target::user(user_id, role))
}

pub async fn block_user(
    storage: &Storage,
    actor: &Actor,
    target_user_id: Uuid,
    blocked: bool,
) -> Result<profile::Model> {
    let action = if blocked {
        Action::BlockUser
    } else {
        Action::UnblockUser
    };
    let target = target_for(storage, target_user_id).await?;
    authz::authorize(actor, action, &target).into_result()?;

    let profile = storage
        .set_blocked(target_user_id, blocked)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", target_user_id)))?;

    tracing::info!(target_user = %target_user_id, blocked, actor = ?actor.id, "User block state changed");
    Ok(profile)
}

pub async fn promote_to_admin(
    storage: &Storage,
    actor: &Actor,
    target_user_id: Uuid,
) -> Result<UserWithRole> {
    let target = target_for(storage, target_user_id).await?;
    authz::authorize(actor, Action::PromoteToAdmin, &target).into_result()?;

    let profile = storage
        .find_profile(target_user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", target_user_id)))?;

    let current = target.owner_role.unwrap_or_default();
    if current.at_least(Role::Admin) {
        return Ok(UserWithRole {
            profile,
            role: current,
        });
    }

    storage.set_role(target_user_id, Role::Admin).await?;
    tracing::info!(target_user = %target_user_id, actor = ?actor.id, "User promoted to admin");

    Ok(UserWithRole {
        profile,
        role: Role::Admin,
    })
}

pub async fn delete_user(
    storage: &Storage,
    identity: &dyn IdentityGateway,
    actor: &Actor,
    target_user_id: Uuid,
) -> Result<()> {
    let target = target_for(storage, target_user_id).await?;
    authz::authorize(actor, Action::DeleteUser, &target).into_result()?;

    // Orders and their payment proofs stay behind for the books.
    identity.delete_identity(target_user_id).await?;

    tracing::info!(target_user = %target_user_id, actor = ?actor.id, "User deleted");
    Ok(())
}

/// Grant super_admin to the principal registered under `email`. Returns false
/// when no such principal exists yet.
pub async fn bootstrap_super_admin(storage: &Storage, email: &str) -> Result<bool> {
    let email = email.trim().to_ascii_lowercase();
    let Some(principal) = storage.find_principal_by_email(&email).await? else {
        return Ok(false);
    };

    storage.set_role(principal.id, Role::SuperAdmin).await?;
    tracing::info!(user_id = %principal.id, email = %email, "Bootstrapped super_admin");
    Ok(true)
}
