// ABOUTME: Order workflow: submission with payment proof upload, listing, and admin review
// ABOUTME: Enforces pending -> active|rejected with at most one terminal transition per order

use sea_orm::Set;
use serde::Serialize;
use uuid::Uuid;

use crate::authz::{self, Action, Actor, Scope, Target};
use crate::blob::BlobStore;
use crate::entities::{order, OrderStatus};
use crate::error::{AppError, Result};
use crate::packages;
use crate::storage::Storage;

/// Image formats accepted as bank-transfer proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageKind {
    fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageKind::Png),
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/gif" => Some(ImageKind::Gif),
            "image/webp" => Some(ImageKind::Webp),
            _ => None,
        }
    }

    fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageKind::Png),
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "gif" => Some(ImageKind::Gif),
            "webp" => Some(ImageKind::Webp),
            _ => None,
        }
    }

    /// Declared content type wins; generic or missing types fall back to the
    /// file extension.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        content_type
            .and_then(Self::from_content_type)
            .or_else(|| file_name.and_then(Self::from_file_name))
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Gif => "image/gif",
            ImageKind::Webp => "image/webp",
        }
    }

    /// Check the leading magic bytes so a renamed non-image is refused.
    pub fn matches_signature(self, bytes: &[u8]) -> bool {
        match self {
            ImageKind::Png => bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
            ImageKind::Jpeg => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
            ImageKind::Gif => bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a"),
            ImageKind::Webp => bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProofUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct NewOrder {
    pub package_name: String,
    pub package_price: i64,
    pub domain_name: String,
    pub payment_proof: Option<ProofUpload>,
}

/// Admin read-model: an order joined with its owner's profile.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithOwner {
    #[serde(flatten)]
    pub order: order::Model,
    pub username: String,
    pub email: String,
}

fn is_valid_domain(domain: &str) -> bool {
    domain.len() <= 253
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

fn validate_proof(proof: Option<&ProofUpload>, max_bytes: usize) -> Result<ImageKind> {
    let proof = proof.ok_or_else(|| AppError::Validation("Payment proof is required".into()))?;

    if proof.bytes.is_empty() {
        return Err(AppError::Validation("Payment proof file is empty".into()));
    }
    if proof.bytes.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "Payment proof exceeds {} bytes",
            max_bytes
        )));
    }

    let kind = ImageKind::detect(proof.content_type.as_deref(), proof.file_name.as_deref())
        .ok_or_else(|| {
            AppError::Validation("Payment proof must be a PNG, JPEG, GIF or WebP image".into())
        })?;

    if !kind.matches_signature(&proof.bytes) {
        return Err(AppError::Validation(
            "Payment proof content does not match its image type".into(),
        ));
    }

    Ok(kind)
}

pub async fn submit_order(
    storage: &Storage,
    blobs: &dyn BlobStore,
    actor: &Actor,
    new_order: NewOrder,
    max_proof_bytes: usize,
) -> Result<order::Model> {
    authz::authorize(actor, Action::CreateOrder, &Target::owned_by(actor.id)).into_result()?;
    let user_id = actor.require_id()?;

    let package_name = new_order.package_name.trim();
    let domain_name = new_order.domain_name.trim().to_ascii_lowercase();
    if package_name.is_empty() || domain_name.is_empty() {
        return Err(AppError::Validation(
            "Package and domain name are required".into(),
        ));
    }
    if !is_valid_domain(&domain_name) {
        return Err(AppError::Validation(format!(
            "'{}' is not a valid domain name",
            domain_name
        )));
    }

    let package = packages::find(package_name)
        .ok_or_else(|| AppError::Validation(format!("Unknown package '{}'", package_name)))?;
    if package.price != new_order.package_price {
        return Err(AppError::Validation(format!(
            "Price {} does not match the current price of {}",
            new_order.package_price, package.name
        )));
    }

    let kind = validate_proof(new_order.payment_proof.as_ref(), max_proof_bytes)?;
    let proof_bytes = new_order
        .payment_proof
        .map(|proof| proof.bytes)
        .unwrap_or_default();

    let now = chrono::Utc::now();
    // Millisecond timestamps alone collide for back-to-back submissions.
    let key = format!(
        "{}/{}-{}.{}",
        user_id,
        now.timestamp_millis(),
        &Uuid::new_v4().simple().to_string()[..8],
        kind.extension()
    );
    let reference = blobs
        .upload(&key, &proof_bytes)
        .await
        .map_err(|err| AppError::UploadFailed(err.to_string()))?;

    let row = order::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        package_name: Set(package.name.to_string()),
        package_price: Set(package.price),
        domain_name: Set(domain_name),
        payment_proof: Set(Some(reference.clone())),
        status: Set(OrderStatus::Pending),
        created_at: Set(now.timestamp()),
        updated_at: Set(now.timestamp()),
    };

    match storage.insert_order(row).await {
        Ok(order) => {
            tracing::info!(order_id = %order.id, user_id = %user_id, package = %order.package_name, "Order submitted");
            Ok(order)
        }
        Err(err) => {
            if let Err(cleanup) = blobs.delete(&reference).await {
                tracing::warn!(reference = %reference, "Could not remove orphaned payment proof: {}", cleanup);
            }
            Err(err)
        }
    }
}

pub async fn list_orders(
    storage: &Storage,
    actor: &Actor,
    scope: Scope,
) -> Result<Vec<order::Model>> {
    match scope {
        Scope::Own => {
            authz::authorize(actor, Action::ViewOwnOrders, &Target::owned_by(actor.id))
                .into_result()?;
            storage.list_orders_for_user(actor.require_id()?).await
        }
        Scope::All => {
            authz::authorize(actor, Action::ViewAllOrders, &Target::none()).into_result()?;
            storage.list_all_orders().await
        }
    }
}

/// Join orders to their owners' profiles. Orders whose owner has no profile
/// show as "N/A".
pub async fn attach_owners(
    storage: &Storage,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderWithOwner>> {
    let mut user_ids: Vec<Uuid> = orders.iter().map(|o| o.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    let profiles = storage.profiles_by_user(&user_ids).await?;

    Ok(orders
        .into_iter()
        .map(|order| {
            let (username, email) = match profiles.get(&order.user_id) {
                Some(profile) => (profile.username.clone(), profile.email.clone()),
                None => ("N/A".to_string(), "N/A".to_string()),
            };
            OrderWithOwner {
                order,
                username,
                email,
            }
        })
        .collect())
}

pub async fn list_orders_with_owner(
    storage: &Storage,
    actor: &Actor,
) -> Result<Vec<OrderWithOwner>> {
    let orders = list_orders(storage, actor, Scope::All).await?;
    attach_owners(storage, orders).await
}

pub async fn set_order_status(
    storage: &Storage,
    actor: &Actor,
    order_id: Uuid,
    new_status: OrderStatus,
) -> Result<order::Model> {
    authz::authorize(actor, Action::UpdateOrderStatus, &Target::none()).into_result()?;

    if !new_status.is_terminal() {
        return Err(AppError::Validation(
            "An order can only be set to active or rejected".into(),
        ));
    }

    let changed = storage.transition_pending_order(order_id, new_status).await?;

    let current = storage
        .find_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {}", order_id)))?;

    if changed == 0 {
        return Err(AppError::InvalidTransition {
            from: current.status.as_str().to_string(),
            to: new_status.as_str().to_string(),
        });
    }

    tracing::info!(
        order_id = %order_id,
        status = new_status.as_str(),
        actor = ?actor.id,
        "Order reviewed"
    );
    Ok(current)
}

pub async fn view_payment_proof(
    blobs: &dyn BlobStore,
    actor: &Actor,
    order: &order::Model,
) -> Result<String> {
    authz::authorize(actor, Action::ViewPaymentProof, &Target::owned_by(Some(order.user_id)))
        .into_result()?;

    let reference = order
        .payment_proof
        .as_deref()
        .ok_or_else(|| AppError::NotFound(format!("payment proof for order {}", order.id)))?;

    Ok(blobs.public_url(reference))
}

/// Fetch proof bytes for the owner of the namespace or any admin-capable actor.
pub async fn read_payment_proof(
    blobs: &dyn BlobStore,
    actor: &Actor,
    reference: &str,
) -> Result<(Vec<u8>, &'static str)> {
    let owner = reference
        .split('/')
        .next()
        .and_then(|segment| Uuid::parse_str(segment).ok())
        .ok_or_else(|| AppError::NotFound(format!("payment proof {}", reference)))?;

    let target = Target::owned_by(Some(owner));
    let privileged = authz::authorize(actor, Action::ViewPaymentProof, &target);
    if !privileged.is_allowed() {
        authz::authorize(actor, Action::ViewOwnOrders, &target).into_result()?;
    }

    let bytes = blobs
        .get(reference)
        .await
        .map_err(|err| AppError::BackendUnavailable(err.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("payment proof {}", reference)))?;

    let content_type = ImageKind::detect(None, Some(reference))
        .map(ImageKind::content_type)
        .unwrap_or("application/octet-stream");

    Ok((bytes, content_type))
}
