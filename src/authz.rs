// ABOUTME: The single authorization gate consulted before every mutating or privileged read
// ABOUTME: Pure function over an explicit actor context; never touches storage

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, ForbiddenReason, Result};
use crate::roles::Role;

/// Who is asking. Built per request from the session; anonymous callers have
/// no id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Option<Uuid>,
    pub role: Role,
    pub blocked: bool,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self {
            id: None,
            role: Role::User,
            blocked: false,
        }
    }

    pub fn principal(id: Uuid, role: Role, blocked: bool) -> Self {
        Self {
            id: Some(id),
            role,
            blocked,
        }
    }

    pub fn require_id(&self) -> Result<Uuid> {
        self.id.ok_or(AppError::NotAuthenticated)
    }
}

/// The resource an action applies to: whose it is and, for user-management
/// actions, the owner's current role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Target {
    pub owner_id: Option<Uuid>,
    pub owner_role: Option<Role>,
}

impl Target {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn owned_by(owner_id: Option<Uuid>) -> Self {
        Self {
            owner_id,
            owner_role: None,
        }
    }

    pub fn user(user_id: Uuid, role: Role) -> Self {
        Self {
            owner_id: Some(user_id),
            owner_role: Some(role),
        }
    }
}

/// Whose records a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Own,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    ViewOwnOrders,
    ViewOwnTickets,
    CreateOrder,
    CreateTicket,
    ViewAllOrders,
    UpdateOrderStatus,
    ViewPaymentProof,
    ViewAllTickets,
    ReplyTicket,
    CloseTicket,
    ViewAllUsers,
    ViewDashboard,
    BlockUser,
    UnblockUser,
    PromoteToAdmin,
    DeleteUser,
    ViewAnalytics,
}

enum Class {
    Owner,
    AdminCapable,
    SuperAdminOverUser,
    SuperAdmin,
}

impl Action {
    pub const ALL: [Action; 17] = [
        Action::ViewOwnOrders,
        Action::ViewOwnTickets,
        Action::CreateOrder,
        Action::CreateTicket,
        Action::ViewAllOrders,
        Action::UpdateOrderStatus,
        Action::ViewPaymentProof,
        Action::ViewAllTickets,
        Action::ReplyTicket,
        Action::CloseTicket,
        Action::ViewAllUsers,
        Action::ViewDashboard,
        Action::BlockUser,
        Action::UnblockUser,
        Action::PromoteToAdmin,
        Action::DeleteUser,
        Action::ViewAnalytics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::ViewOwnOrders => "view-own-orders",
            Action::ViewOwnTickets => "view-own-tickets",
            Action::CreateOrder => "create-order",
            Action::CreateTicket => "create-ticket",
            Action::ViewAllOrders => "view-all-orders",
            Action::UpdateOrderStatus => "update-order-status",
            Action::ViewPaymentProof => "view-payment-proof",
            Action::ViewAllTickets => "view-all-tickets",
            Action::ReplyTicket => "reply-ticket",
            Action::CloseTicket => "close-ticket",
            Action::ViewAllUsers => "view-all-users",
            Action::ViewDashboard => "view-dashboard",
            Action::BlockUser => "block-user",
            Action::UnblockUser => "unblock-user",
            Action::PromoteToAdmin => "promote-to-admin",
            Action::DeleteUser => "delete-user",
            Action::ViewAnalytics => "view-analytics",
        }
    }

    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            Action::CreateOrder
                | Action::CreateTicket
                | Action::UpdateOrderStatus
                | Action::ReplyTicket
                | Action::CloseTicket
                | Action::BlockUser
                | Action::UnblockUser
                | Action::PromoteToAdmin
                | Action::DeleteUser
        )
    }

    fn class(self) -> Class {
        match self {
            Action::ViewOwnOrders
            | Action::ViewOwnTickets
            | Action::CreateOrder
            | Action::CreateTicket => Class::Owner,
            Action::ViewAllOrders
            | Action::UpdateOrderStatus
            | Action::ViewPaymentProof
            | Action::ViewAllTickets
            | Action::ReplyTicket
            | Action::CloseTicket
            | Action::ViewAllUsers
            | Action::ViewDashboard => Class::AdminCapable,
            Action::BlockUser | Action::UnblockUser | Action::PromoteToAdmin | Action::DeleteUser => {
                Class::SuperAdminOverUser
            }
            Action::ViewAnalytics => Class::SuperAdmin,
        }
    }
}

impl FromStr for Action {
    type Err = ForbiddenReason;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == name)
            .ok_or(ForbiddenReason::UnknownAction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotAuthenticated,
    Forbidden(ForbiddenReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(Denial::NotAuthenticated) => Err(AppError::NotAuthenticated),
            Decision::Deny(Denial::Forbidden(reason)) => Err(AppError::Forbidden(reason)),
        }
    }
}

fn forbid(reason: ForbiddenReason) -> Decision {
    Decision::Deny(Denial::Forbidden(reason))
}

pub fn authorize(actor: &Actor, action: Action, target: &Target) -> Decision {
    let Some(actor_id) = actor.id else {
        return Decision::Deny(Denial::NotAuthenticated);
    };

    if actor.blocked && action.is_mutating() {
        return forbid(ForbiddenReason::AccountBlocked);
    }

    match action.class() {
        Class::Owner => {
            if target.owner_id == Some(actor_id) {
                Decision::Allow
            } else {
                forbid(ForbiddenReason::NotOwner)
            }
        }
        Class::AdminCapable => {
            if actor.role.is_admin_capable() {
                Decision::Allow
            } else {
                forbid(ForbiddenReason::InsufficientRole)
            }
        }
        Class::SuperAdminOverUser => {
            if actor.role != Role::SuperAdmin {
                forbid(ForbiddenReason::InsufficientRole)
            } else if target.owner_role == Some(Role::SuperAdmin) {
                forbid(ForbiddenReason::ImmutableSuperAdmin)
            } else {
                Decision::Allow
            }
        }
        Class::SuperAdmin => {
            if actor.role == Role::SuperAdmin {
                Decision::Allow
            } else {
                forbid(ForbiddenReason::InsufficientRole)
            }
        }
    }
}

/// Authorize an action given by name; names outside the known set are refused.
pub fn authorize_named(actor: &Actor, action: &str, target: &Target) -> Decision {
    match action.parse::<Action>() {
        Ok(action) => authorize(actor, action, target),
        Err(reason) => forbid(reason),
    }
}

/// Actions the actor may perform on resources it owns or on other plain users.
/// Lets a client decide what to render without re-deriving role checks.
pub fn capabilities(actor: &Actor) -> Vec<Action> {
    let own = Target::owned_by(actor.id);
    let other_user = Target::user(Uuid::nil(), Role::User);

    Action::ALL
        .into_iter()
        .filter(|action| {
            let target = match action.class() {
                Class::Owner => &own,
                _ => &other_user,
            };
            authorize(actor, *action, target).is_allowed()
        })
        .collect()
}
