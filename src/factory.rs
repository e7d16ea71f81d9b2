//! Constructor functions and their declared parameter lists.

use crate::error::DiResult;
use crate::parameter::{AnyArc, Dependency, Parameter};

/// A factory function whose arguments are resolved by the container.
///
/// Implemented for closures and `fn` items of up to twelve arguments,
/// where every argument type implements [`Dependency`] (`Arc<T>`,
/// `Option<Arc<T>>`, or `Vec<Arc<T>>`). The parameter list is known
/// statically, which is what lets the cycle detector walk the dependency
/// graph before anything is constructed.
///
/// `Out` is the factory's raw return type; the four accepted output
/// shapes (value, fallible value, value with cleanup, fallible value with
/// cleanup) are selected by the registration method used:
/// [`provide`](crate::Container::provide),
/// [`try_provide`](crate::Container::try_provide),
/// [`provide_with_cleanup`](crate::Container::provide_with_cleanup), or
/// [`try_provide_with_cleanup`](crate::Container::try_provide_with_cleanup).
/// A factory with any other shape simply fails to satisfy the bound, so
/// the "invalid constructor signature" class of errors is caught at
/// compile time.
pub trait Constructor<Deps, Out>: Send + Sync + 'static {
    /// Declared parameters, one per argument, in argument order.
    fn parameters() -> Vec<Parameter>;

    /// Calls the factory with pre-resolved values, one slot per parameter.
    fn invoke(&self, values: Vec<Option<AnyArc>>) -> DiResult<Out>;
}

macro_rules! impl_constructor {
    ($($dep:ident),*) => {
        #[allow(non_snake_case, unused_variables, unused_mut)]
        impl<F, Out, $($dep),*> Constructor<($($dep,)*), Out> for F
        where
            F: Fn($($dep),*) -> Out + Send + Sync + 'static,
            $($dep: Dependency,)*
        {
            fn parameters() -> Vec<Parameter> {
                vec![$($dep::parameter()),*]
            }

            fn invoke(&self, values: Vec<Option<AnyArc>>) -> DiResult<Out> {
                let mut slots = values.into_iter();
                $(
                    let $dep = match slots.next() {
                        Some(slot) => $dep::extract(slot)?,
                        None => crate::error::engine_bug("constructor value list shorter than parameter list"),
                    };
                )*
                if slots.next().is_some() {
                    crate::error::engine_bug("constructor value list longer than parameter list");
                }
                Ok((self)($($dep),*))
            }
        }
    };
}

impl_constructor!();
impl_constructor!(A);
impl_constructor!(A, B);
impl_constructor!(A, B, C);
impl_constructor!(A, B, C, D);
impl_constructor!(A, B, C, D, E);
impl_constructor!(A, B, C, D, E, G);
impl_constructor!(A, B, C, D, E, G, H);
impl_constructor!(A, B, C, D, E, G, H, I);
impl_constructor!(A, B, C, D, E, G, H, I, J);
impl_constructor!(A, B, C, D, E, G, H, I, J, K);
impl_constructor!(A, B, C, D, E, G, H, I, J, K, L);
impl_constructor!(A, B, C, D, E, G, H, I, J, K, L, M);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::shared_erase;
    use std::sync::Arc;

    struct Left(u32);
    struct Right(u32);

    // Names the parameter list of a factory without spelling its type.
    fn params_of<Deps, Out, F: Constructor<Deps, Out>>(_f: &F) -> Vec<Parameter> {
        F::parameters()
    }

    #[test]
    fn parameters_follow_argument_order() {
        let ctor = |_l: Arc<Left>, _r: Option<Arc<Right>>| 0u32;
        let params = params_of(&ctor);
        assert_eq!(params.len(), 2);
        assert!(!params[0].is_optional());
        assert!(params[1].is_optional());
    }

    #[test]
    fn invoke_feeds_extracted_values() {
        let ctor = |l: Arc<Left>, r: Arc<Right>| l.0 + r.0;
        let values = vec![
            Some(shared_erase(Arc::new(Left(40)))),
            Some(shared_erase(Arc::new(Right(2)))),
        ];
        let out = ctor.invoke(values).unwrap();
        assert_eq!(out, 42);
    }

    #[test]
    fn zero_argument_factories_work() {
        let ctor = || "ready";
        assert!(params_of(&ctor).is_empty());
        assert_eq!(ctor.invoke(Vec::new()).unwrap(), "ready");
    }
}
