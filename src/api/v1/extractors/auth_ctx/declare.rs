//! Identity declarations read off handler signatures.
//!
//! axum describes a handler by the tuple of its extractor types, e.g.
//! `(M, State<AppState>, Auth<AuthCtx>)`. `DeclaredParams` turns that tuple
//! into `ParamSpec`s, so the startup check sees exactly what the handler asks
//! for instead of a separately maintained list.

use axum::Json;
use axum::extract::{Path, State};

use super::{Auth, ParamSpec};

/// A handler parameter type the binder knows how to describe.
pub trait DeclaredParam {
    fn spec(handler: &'static str) -> ParamSpec;
}

impl<T: 'static> DeclaredParam for Auth<T> {
    fn spec(handler: &'static str) -> ParamSpec {
        ParamSpec::marked::<T>(handler)
    }
}

impl<S: 'static> DeclaredParam for State<S> {
    fn spec(handler: &'static str) -> ParamSpec {
        ParamSpec::unmarked::<Self>(handler)
    }
}

impl<T: 'static> DeclaredParam for Path<T> {
    fn spec(handler: &'static str) -> ParamSpec {
        ParamSpec::unmarked::<Self>(handler)
    }
}

impl<T: 'static> DeclaredParam for Json<T> {
    fn spec(handler: &'static str) -> ParamSpec {
        ParamSpec::unmarked::<Self>(handler)
    }
}

/// Every parameter of one handler, keyed by axum's extractor tuple.
pub trait DeclaredParams {
    fn specs(handler: &'static str) -> Vec<ParamSpec>;
}

// zero-argument handlers
impl DeclaredParams for ((),) {
    fn specs(_handler: &'static str) -> Vec<ParamSpec> {
        Vec::new()
    }
}

macro_rules! impl_declared_params {
    ($($ty:ident),+) => {
        impl<M, $($ty: DeclaredParam,)+> DeclaredParams for (M, $($ty,)+) {
            fn specs(handler: &'static str) -> Vec<ParamSpec> {
                vec![$($ty::spec(handler)),+]
            }
        }
    };
}

impl_declared_params!(T1);
impl_declared_params!(T1, T2);
impl_declared_params!(T1, T2, T3);
impl_declared_params!(T1, T2, T3, T4);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v1::extractors::auth_ctx::{AuthCtx, supports};

    #[test]
    fn auth_marker_is_marked_with_wrapped_type() {
        let spec = <Auth<AuthCtx> as DeclaredParam>::spec("h");
        assert!(spec.marked);
        assert_eq!(supports(&spec), Ok(true));

        let spec = <Auth<String> as DeclaredParam>::spec("h");
        assert!(supports(&spec).is_err());
    }

    #[test]
    fn tuple_yields_one_spec_per_parameter() {
        // first element is axum's private extractor marker; any type fits
        type Params = ((), State<()>, Auth<AuthCtx>, Path<i64>);
        let specs = <Params as DeclaredParams>::specs("h");
        let marked: Vec<bool> = specs.iter().map(|s| s.marked).collect();
        assert_eq!(marked, vec![false, true, false]);

        assert!(<((),) as DeclaredParams>::specs("h").is_empty());
    }
}
