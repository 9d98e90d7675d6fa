// ABOUTME: SQLite storage layer for principals, profiles, roles, orders, and tickets
// ABOUTME: Every state transition is a single conditional UPDATE so concurrent admins cannot both win

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::{
    order, principal, profile, role_assignment, ticket, OrderStatus, Role, TicketStatus,
};
use crate::error::{AppError, Result};
use crate::migration::Migrator;

pub struct Storage {
    pub db: DatabaseConnection,
}

fn write_failed(err: sea_orm::DbErr) -> AppError {
    AppError::PersistenceFailed(err.to_string())
}

impl Storage {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options.sqlx_logging(false);

        let db = Database::connect(options).await?;
        Migrator::up(&db, None).await?;

        tracing::info!("Connected to database and applied migrations");
        Ok(Self { db })
    }

    // Principals

    /// Insert the principal, its profile, and an explicit `user` role in one
    /// transaction.
    pub async fn create_principal(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<principal::Model> {
        let now = chrono::Utc::now().timestamp();
        let user_id = Uuid::new_v4();

        let txn = self.db.begin().await.map_err(write_failed)?;

        let principal = principal::ActiveModel {
            id: Set(user_id),
            email: Set(email.to_string()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(write_failed)?;

        profile::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            blocked: Set(false),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(write_failed)?;

        role_assignment::ActiveModel {
            user_id: Set(user_id),
            role: Set(Role::User),
        }
        .insert(&txn)
        .await
        .map_err(write_failed)?;

        txn.commit().await.map_err(write_failed)?;
        Ok(principal)
    }

    pub async fn find_principal_by_email(&self, email: &str) -> Result<Option<principal::Model>> {
        Ok(principal::Entity::find()
            .filter(principal::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    pub async fn find_principal_by_username(
        &self,
        username: &str,
    ) -> Result<Option<principal::Model>> {
        Ok(principal::Entity::find()
            .filter(principal::Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    /// Remove a principal with its profile and role assignment. Orders and
    /// tickets are kept. Returns false if the principal did not exist.
    pub async fn delete_principal(&self, user_id: Uuid) -> Result<bool> {
        let txn = self.db.begin().await.map_err(write_failed)?;

        role_assignment::Entity::delete_by_id(user_id)
            .exec(&txn)
            .await
            .map_err(write_failed)?;
        profile::Entity::delete_many()
            .filter(profile::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(write_failed)?;
        let removed = principal::Entity::delete_by_id(user_id)
            .exec(&txn)
            .await
            .map_err(write_failed)?
            .rows_affected;

        txn.commit().await.map_err(write_failed)?;
        Ok(removed > 0)
    }

    // Profiles

    pub async fn find_profile(&self, user_id: Uuid) -> Result<Option<profile::Model>> {
        Ok(profile::Entity::find()
            .filter(profile::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?)
    }

    pub async fn list_profiles(&self) -> Result<Vec<profile::Model>> {
        Ok(profile::Entity::find()
            .order_by_desc(profile::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Profiles keyed by principal id, for assembling owner projections.
    pub async fn profiles_by_user(
        &self,
        user_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, profile::Model>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let profiles = profile::Entity::find()
            .filter(profile::Column::UserId.is_in(user_ids.iter().copied()))
            .all(&self.db)
            .await?;

        Ok(profiles.into_iter().map(|p| (p.user_id, p)).collect())
    }

    pub async fn count_profiles(&self) -> Result<u64> {
        Ok(profile::Entity::find().count(&self.db).await?)
    }

    pub async fn set_blocked(&self, user_id: Uuid, blocked: bool) -> Result<Option<profile::Model>> {
        let Some(existing) = self.find_profile(user_id).await? else {
            return Ok(None);
        };

        let mut active: profile::ActiveModel = existing.into();
        active.blocked = Set(blocked);
        let updated = active.update(&self.db).await.map_err(write_failed)?;
        Ok(Some(updated))
    }

    // Role assignments

    pub async fn find_role(&self, user_id: Uuid) -> Result<Option<Role>> {
        Ok(role_assignment::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .map(|assignment| assignment.role))
    }

    pub async fn all_roles(&self) -> Result<HashMap<Uuid, Role>> {
        Ok(role_assignment::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|assignment| (assignment.user_id, assignment.role))
            .collect())
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) -> Result<()> {
        match role_assignment::Entity::find_by_id(user_id).one(&self.db).await? {
            Some(existing) => {
                let mut active: role_assignment::ActiveModel = existing.into();
                active.role = Set(role);
                active.update(&self.db).await.map_err(write_failed)?;
            }
            None => {
                role_assignment::ActiveModel {
                    user_id: Set(user_id),
                    role: Set(role),
                }
                .insert(&self.db)
                .await
                .map_err(write_failed)?;
            }
        }
        Ok(())
    }

    // Orders

    pub async fn insert_order(&self, order: order::ActiveModel) -> Result<order::Model> {
        order.insert(&self.db).await.map_err(write_failed)
    }

    pub async fn find_order(&self, order_id: Uuid) -> Result<Option<order::Model>> {
        Ok(order::Entity::find_by_id(order_id).one(&self.db).await?)
    }

    pub async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<order::Model>> {
        Ok(order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn list_all_orders(&self) -> Result<Vec<order::Model>> {
        Ok(order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Move a pending order that carries a payment proof to `to`. Returns the
    /// number of rows changed: 0 means the order is missing, already terminal,
    /// or has no proof.
    pub async fn transition_pending_order(&self, order_id: Uuid, to: OrderStatus) -> Result<u64> {
        let result = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(to.to_value()))
            .col_expr(
                order::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(OrderStatus::Pending))
            .filter(order::Column::PaymentProof.is_not_null())
            .exec(&self.db)
            .await
            .map_err(write_failed)?;

        Ok(result.rows_affected)
    }

    // Tickets

    pub async fn insert_ticket(&self, ticket: ticket::ActiveModel) -> Result<ticket::Model> {
        ticket.insert(&self.db).await.map_err(write_failed)
    }

    pub async fn find_ticket(&self, ticket_id: Uuid) -> Result<Option<ticket::Model>> {
        Ok(ticket::Entity::find_by_id(ticket_id).one(&self.db).await?)
    }

    pub async fn list_tickets_for_user(&self, user_id: Uuid) -> Result<Vec<ticket::Model>> {
        Ok(ticket::Entity::find()
            .filter(ticket::Column::UserId.eq(user_id))
            .order_by_desc(ticket::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn list_all_tickets(&self) -> Result<Vec<ticket::Model>> {
        Ok(ticket::Entity::find()
            .order_by_desc(ticket::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn count_open_tickets(&self) -> Result<u64> {
        Ok(ticket::Entity::find()
            .filter(ticket::Column::Status.eq(TicketStatus::Open))
            .count(&self.db)
            .await?)
    }

    /// Set the admin reply. Returns 0 if the ticket does not exist.
    pub async fn set_ticket_reply(&self, ticket_id: Uuid, reply: &str) -> Result<u64> {
        let result = ticket::Entity::update_many()
            .col_expr(ticket::Column::AdminReply, Expr::value(reply.to_string()))
            .col_expr(
                ticket::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(ticket::Column::Id.eq(ticket_id))
            .exec(&self.db)
            .await
            .map_err(write_failed)?;

        Ok(result.rows_affected)
    }

    /// Close an open ticket. Returns 0 if it is missing or already closed.
    pub async fn close_open_ticket(&self, ticket_id: Uuid) -> Result<u64> {
        let result = ticket::Entity::update_many()
            .col_expr(
                ticket::Column::Status,
                Expr::value(TicketStatus::Closed.to_value()),
            )
            .col_expr(
                ticket::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(ticket::Column::Id.eq(ticket_id))
            .filter(ticket::Column::Status.eq(TicketStatus::Open))
            .exec(&self.db)
            .await
            .map_err(write_failed)?;

        Ok(result.rows_affected)
    }
}
