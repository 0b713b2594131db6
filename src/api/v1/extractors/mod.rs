pub mod auth_ctx;

pub use auth_ctx::{Auth, AuthCtx, DeclaredParams, ParamSpec, verify_bindings};
