/*
 * Responsibility
 * - v1 URL layout
 * - public_routes: reachable without a credential (signup / signin)
 * - protected_routes: wrapped by the access gate in app.rs
 * - admin_routes: mounted at the configured admin prefix, behind the gate
 *   and the admin audit
 */
use axum::routing::MethodFilter;

use crate::api::v1::handlers::{
    admin::{change_user_role, list_users},
    auth::{signin, signup},
    users::{change_password, get_me, get_user},
};
use crate::api::v1::route_table::RouteTable;

pub fn public_routes() -> RouteTable {
    RouteTable::new()
        .route("/auth/signup", MethodFilter::POST, signup)
        .route("/auth/signin", MethodFilter::POST, signin)
}

pub fn protected_routes() -> RouteTable {
    RouteTable::new()
        .route("/users/me", MethodFilter::GET, get_me)
        .route("/users/password", MethodFilter::PUT, change_password)
        .route("/users/{user_id}", MethodFilter::GET, get_user)
}

pub fn admin_routes() -> RouteTable {
    RouteTable::new()
        .route("/users", MethodFilter::GET, list_users)
        .route("/users/{user_id}", MethodFilter::PATCH, change_user_role)
}
