/*
 * Responsibility
 * - v1 API surface: DTOs, extractors, handlers and the route tables
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod route_table;
mod routes;

pub use routes::{admin_routes, protected_routes, public_routes};
