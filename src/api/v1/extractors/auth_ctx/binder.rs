//! Identity binding rules.
//!
//! A handler parameter asks for the authenticated identity by wrapping it in
//! `Auth<_>` (the marker). The only type the marker may wrap is `AuthCtx`.
//! Routes declare their marked parameters as `ParamSpec`s, which are verified
//! once when the router is built. The extractor re-checks at request time so a
//! misuse that slipped past registration still fails loudly.

use std::any::{Any, TypeId, type_name};

use thiserror::Error;

use super::AuthCtx;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BinderError {
    #[error("identity marker and AuthCtx type must be used together: {handler} asks for {type_name}")]
    Misuse {
        handler: &'static str,
        type_name: &'static str,
    },
    #[error("no authenticated context was installed for this request")]
    MissingContext,
}

/// One handler parameter as declared at route registration.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub handler: &'static str,
    pub marked: bool,
    type_id: TypeId,
    type_name: &'static str,
}

impl ParamSpec {
    pub fn marked<T: 'static>(handler: &'static str) -> Self {
        Self::new::<T>(handler, true)
    }

    pub fn unmarked<T: 'static>(handler: &'static str) -> Self {
        Self::new::<T>(handler, false)
    }

    fn new<T: 'static>(handler: &'static str, marked: bool) -> Self {
        Self {
            handler,
            marked,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

/// Decide whether the binder applies to `param`.
///
/// - marked, `AuthCtx`       => `Ok(true)`
/// - marked, any other type  => `Err(Misuse)`
/// - unmarked                => `Ok(false)`
pub fn supports(param: &ParamSpec) -> Result<bool, BinderError> {
    if !param.marked {
        return Ok(false);
    }
    if param.type_id != TypeId::of::<AuthCtx>() {
        return Err(BinderError::Misuse {
            handler: param.handler,
            type_name: param.type_name,
        });
    }
    Ok(true)
}

/// Startup check over every declared parameter; the first misuse aborts.
pub fn verify_bindings(params: &[ParamSpec]) -> Result<usize, BinderError> {
    let mut bound = 0;
    for param in params {
        if supports(param)? {
            bound += 1;
        }
    }
    Ok(bound)
}

/// Produce the bound value for a marked parameter of type `T`.
pub fn bind<T: 'static>(ctx: Option<&AuthCtx>) -> Result<T, BinderError> {
    let param = ParamSpec::marked::<T>(type_name::<T>());
    supports(&param)?;

    let ctx = ctx.cloned().ok_or(BinderError::MissingContext)?;
    let boxed: Box<dyn Any> = Box::new(ctx);
    boxed
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| BinderError::Misuse {
            handler: param.handler,
            type_name: param.type_name,
        })
}
