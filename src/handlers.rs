// ABOUTME: HTTP handlers for orders, tickets, user management and reports
// ABOUTME: Each handler resolves the actor from the session and delegates to a workflow module

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::authz::{self, Action, Scope, Target};
use crate::entities::{order, profile, ticket};
use crate::error::{AppError, Result};
use crate::orders::{self, NewOrder, OrderWithOwner, ProofUpload};
use crate::packages::{self, HostingPackage};
use crate::reports::{self, AnalyticsSummary, DashboardSummary, UserOrderSummary};
use crate::types::*;
use crate::users::{self, UserWithRole};
use crate::{auth_helpers, tickets, AppState};

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn list_packages() -> Json<&'static [HostingPackage]> {
    Json(packages::PACKAGES)
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid {} id", what)))
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed form field: {}", e)))
}

// Orders

pub async fn submit_order(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<order::Model>)> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    // Refuse before reading the upload body.
    authz::authorize(&actor, Action::CreateOrder, &Target::owned_by(actor.id)).into_result()?;

    let mut new_order = NewOrder::default();
    let mut price_seen = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to parse multipart: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "package_name" => new_order.package_name = text_field(field).await?,
            "domain_name" => new_order.domain_name = text_field(field).await?,
            "package_price" => {
                let raw = text_field(field).await?;
                new_order.package_price = raw
                    .trim()
                    .parse()
                    .map_err(|_| AppError::Validation(format!("Invalid price '{}'", raw)))?;
                price_seen = true;
            }
            "payment_proof" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;
                new_order.payment_proof = Some(ProofUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    if !price_seen {
        return Err(AppError::Validation("Package price is required".into()));
    }

    let order = orders::submit_order(
        &state.storage,
        state.blobs.as_ref(),
        &actor,
        new_order,
        state.config.max_proof_bytes,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_own_orders(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<order::Model>>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    Ok(Json(orders::list_orders(&state.storage, &actor, Scope::Own).await?))
}

pub async fn user_dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<UserOrderSummary>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    Ok(Json(reports::load_user_dashboard(&state.storage, &actor).await?))
}

pub async fn list_all_orders(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<OrderWithOwner>>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    Ok(Json(orders::list_orders_with_owner(&state.storage, &actor).await?))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(order_id): Path<String>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<Json<order::Model>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    let order_id = parse_id(&order_id, "order")?;
    let order = orders::set_order_status(&state.storage, &actor, order_id, req.status).await?;
    Ok(Json(order))
}

pub async fn payment_proof_url(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(order_id): Path<String>,
) -> Result<Json<PaymentProofResponse>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    authz::authorize(&actor, Action::ViewPaymentProof, &Target::none()).into_result()?;

    let order_id = parse_id(&order_id, "order")?;
    let order = state
        .storage
        .find_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {}", order_id)))?;

    let url = orders::view_payment_proof(state.blobs.as_ref(), &actor, &order).await?;
    Ok(Json(PaymentProofResponse { order_id, url }))
}

pub async fn download_payment_proof(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(reference): Path<String>,
) -> Result<Response> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    let (bytes, content_type) =
        orders::read_payment_proof(state.blobs.as_ref(), &actor, &reference).await?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

// Tickets

pub async fn create_ticket(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<ticket::Model>)> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    let ticket = tickets::create_ticket(&state.storage, &actor, &req.subject, &req.message).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn list_own_tickets(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<ticket::Model>>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    Ok(Json(tickets::list_tickets(&state.storage, &actor, Scope::Own).await?))
}

pub async fn list_all_tickets(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<ticket::Model>>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    Ok(Json(tickets::list_tickets(&state.storage, &actor, Scope::All).await?))
}

pub async fn reply_ticket(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(ticket_id): Path<String>,
    Json(req): Json<ReplyTicketRequest>,
) -> Result<Json<ticket::Model>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    let ticket_id = parse_id(&ticket_id, "ticket")?;
    Ok(Json(
        tickets::reply_ticket(&state.storage, &actor, ticket_id, &req.reply).await?,
    ))
}

pub async fn close_ticket(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(ticket_id): Path<String>,
) -> Result<Json<ticket::Model>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    let ticket_id = parse_id(&ticket_id, "ticket")?;
    Ok(Json(tickets::close_ticket(&state.storage, &actor, ticket_id).await?))
}

// User management

pub async fn list_users(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<UserWithRole>>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    Ok(Json(users::list_users(&state.storage, &actor).await?))
}

pub async fn block_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(user_id): Path<String>,
    Json(req): Json<BlockUserRequest>,
) -> Result<Json<profile::Model>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    let user_id = parse_id(&user_id, "user")?;
    Ok(Json(
        users::block_user(&state.storage, &actor, user_id, req.blocked).await?,
    ))
}

pub async fn promote_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(user_id): Path<String>,
) -> Result<Json<UserWithRole>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    let user_id = parse_id(&user_id, "user")?;
    Ok(Json(users::promote_to_admin(&state.storage, &actor, user_id).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(user_id): Path<String>,
) -> Result<StatusCode> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    let user_id = parse_id(&user_id, "user")?;

    users::delete_user(
        &state.storage,
        state.identity.as_ref(),
        &actor,
        user_id,
    )
    .await?;
    state.sessions.remove_user_sessions(user_id);

    Ok(StatusCode::NO_CONTENT)
}

// Reports

pub async fn admin_dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<DashboardSummary>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    Ok(Json(reports::load_admin_dashboard(&state.storage, &actor).await?))
}

pub async fn analytics(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<AnalyticsSummary>> {
    let actor = auth_helpers::resolve_actor(&jar, &state).await?;
    Ok(Json(
        reports::load_analytics(&state.storage, &actor, chrono::Utc::now()).await?,
    ))
}
