// ABOUTME: SeaORM entities module for the storefront's relational model
// ABOUTME: Exports principals, profiles, role assignments, orders, and tickets

pub mod order;
pub mod principal;
pub mod profile;
pub mod role_assignment;
pub mod ticket;

pub use order::OrderStatus;
pub use role_assignment::Role;
pub use ticket::TicketStatus;
