/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Hand the authenticated request context (AuthCtx) to handlers
 * - Keep axum-facing code in core, the type in types, binding rules in binder,
 *   and signature-derived declarations in declare
 *
 * Public API:
 * - AuthCtx
 * - Auth
 * - ParamSpec / BinderError
 * - DeclaredParams
 */

mod binder;
mod core;
mod declare;
mod types;

pub use binder::{BinderError, ParamSpec, bind, supports, verify_bindings};
pub use declare::{DeclaredParam, DeclaredParams};
pub use self::core::Auth;
pub use types::AuthCtx;
