// ABOUTME: Support ticket workflow: users open tickets, admins reply and close them
// ABOUTME: Replies never change status; closing is idempotent and terminal

use sea_orm::Set;
use uuid::Uuid;

use crate::authz::{self, Action, Actor, Scope, Target};
use crate::entities::{ticket, TicketStatus};
use crate::error::{AppError, Result};
use crate::storage::Storage;

pub async fn create_ticket(
    storage: &Storage,
    actor: &Actor,
    subject: &str,
    message: &str,
) -> Result<ticket::Model> {
    authz::authorize(actor, Action::CreateTicket, &Target::owned_by(actor.id)).into_result()?;
    let user_id = actor.require_id()?;

    let subject = subject.trim();
    let message = message.trim();
    if subject.is_empty() || message.is_empty() {
        return Err(AppError::Validation(
            "Subject and message are required".into(),
        ));
    }

    let now = chrono::Utc::now().timestamp();
    let ticket = storage
        .insert_ticket(ticket::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            subject: Set(subject.to_string()),
            message: Set(message.to_string()),
            status: Set(TicketStatus::Open),
            admin_reply: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .await?;

    tracing::info!(ticket_id = %ticket.id, user_id = %user_id, "Ticket opened");
    Ok(ticket)
}

pub async fn list_tickets(
    storage: &Storage,
    actor: &Actor,
    scope: Scope,
) -> Result<Vec<ticket::Model>> {
    match scope {
        Scope::Own => {
            authz::authorize(actor, Action::ViewOwnTickets, &Target::owned_by(actor.id))
                .into_result()?;
            storage.list_tickets_for_user(actor.require_id()?).await
        }
        Scope::All => {
            authz::authorize(actor, Action::ViewAllTickets, &Target::none()).into_result()?;
            storage.list_all_tickets().await
        }
    }
}

async fn load(storage: &Storage, ticket_id: Uuid) -> Result<ticket::Model> {
    storage
        .find_ticket(ticket_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ticket {}", ticket_id)))
}

/// Set or replace the admin reply.
pub async fn reply_ticket(
    storage: &Storage,
    actor: &Actor,
    ticket_id: Uuid,
    reply_text: &str,
) -> Result<ticket::Model> {
    authz::authorize(actor, Action::ReplyTicket, &Target::none()).into_result()?;

    let reply = reply_text.trim();
    if reply.is_empty() {
        return Err(AppError::Validation("Reply cannot be empty".into()));
    }

    if storage.set_ticket_reply(ticket_id, reply).await? == 0 {
        return Err(AppError::NotFound(format!("ticket {}", ticket_id)));
    }

    tracing::info!(ticket_id = %ticket_id, actor = ?actor.id, "Ticket replied");
    load(storage, ticket_id).await
}

pub async fn close_ticket(
    storage: &Storage,
    actor: &Actor,
    ticket_id: Uuid,
) -> Result<ticket::Model> {
    authz::authorize(actor, Action::CloseTicket, &Target::none()).into_result()?;

    if storage.close_open_ticket(ticket_id).await? > 0 {
        tracing::info!(ticket_id = %ticket_id, actor = ?actor.id, "Ticket closed");
    }

    // Already-closed tickets come back unchanged.
    load(storage, ticket_id).await
}
