// ABOUTME: Role resolution for principals, defaulting to plain user when no assignment exists
// ABOUTME: Resolved fresh on every request so promotions are visible immediately

use uuid::Uuid;

pub use crate::entities::Role;
use crate::error::Result;
use crate::storage::Storage;

pub async fn resolve_role(storage: &Storage, principal_id: Uuid) -> Result<Role> {
    Ok(storage.find_role(principal_id).await?.unwrap_or_default())
}
