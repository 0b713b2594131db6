/*
 * Responsibility
 * - Public interface of the middleware layer
 * - auth: access gate (authentication + admin role gate)
 * - audit: admin API audit trail
 * - http: transport concerns shared by every route
 */
pub mod audit;
pub mod auth;
pub mod http;
