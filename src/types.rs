// ABOUTME: Type definitions for API requests and responses
// ABOUTME: Workflow records are serialized directly; these wrap inputs and composite replies

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authz::Action;
use crate::entities::{OrderStatus, Role};

// Auth related types
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub blocked: bool,
    pub capabilities: Vec<Action>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionResponse {
    pub action: String,
    pub allowed: bool,
}

// Order related types
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentProofResponse {
    pub order_id: Uuid,
    pub url: String,
}

// Ticket related types
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyTicketRequest {
    pub reply: String,
}

// User management types
#[derive(Debug, Serialize, Deserialize)]
pub struct BlockUserRequest {
    pub blocked: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
