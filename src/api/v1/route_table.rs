/*
 * Responsibility
 * - Route registration that records, per handler, which parameters ask for
 *   the identity (derived from the handler's extractor types)
 * - Remembers registered paths so app.rs can check them against the admin prefix
 * - Hands out the axum Router only after the identity declarations pass
 */
use std::any::type_name;

use axum::{
    Router,
    handler::Handler,
    routing::{MethodFilter, on},
};

use crate::api::v1::extractors::{
    DeclaredParams, ParamSpec, auth_ctx::BinderError, verify_bindings,
};
use crate::state::AppState;

pub struct RouteTable {
    router: Router<AppState>,
    paths: Vec<String>,
    params: Vec<ParamSpec>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            router: Router::new(),
            paths: Vec::new(),
            params: Vec::new(),
        }
    }
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `filter` requests on `path`.
    pub fn route<H, X>(mut self, path: &str, filter: MethodFilter, handler: H) -> Self
    where
        H: Handler<X, AppState>,
        X: DeclaredParams + 'static,
    {
        self.params.extend(X::specs(type_name::<H>()));
        self.paths.push(path.to_string());
        self.router = self.router.route(path, on(filter, handler));
        self
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// The router, once every identity parameter is a valid binding.
    pub fn into_router(self) -> Result<Router<AppState>, BinderError> {
        let bound = verify_bindings(&self.params)?;
        tracing::debug!(bound, routes = self.paths.len(), "identity bindings verified");
        Ok(self.router)
    }
}
