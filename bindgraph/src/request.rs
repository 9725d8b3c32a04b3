use std::sync::Arc;

use crate::errors::InjectionError;
use crate::injection_context::InjectionContext;
use crate::injector::Injector;
use crate::registry::TypeInfo;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// The host spec reflects a function's declared parameter list at compile
// time to resolve each argument from the storage region (SPEC_FULL.md
// §4.2.1). Rust functions carry no such reflection, so this crate pushes the
// work into trait resolution instead, following the shape of the sibling
// pack crate `runtime_injector`'s `Request` trait and its
// `impl_tuple_request!` macro: every injectable argument shape implements
// `Request`, tuples of `Request`s are themselves a `Request`, and
// `Injector::call`/`call0` simply requires `F: Callable<Args, R>` - a
// function whose arguments cannot all satisfy `Request` fails to type-check,
// which is this port's rendering of "fatal at compile time; no runtime
// reflection fallback".
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub trait Request: Sized {
    fn resolve(injector: &Injector, ctx: &InjectionContext) -> Result<Self, InjectionError>;

    /// Base types this request ultimately needs, used by the mask builder
    /// (SPEC_FULL.md §4.6) to compute a `Dep`/hook's dependency mask without
    /// re-invoking resolution.
    fn type_infos() -> Vec<TypeInfo>;
}

impl Request for () {
    fn resolve(_injector: &Injector, _ctx: &InjectionContext) -> Result<Self, InjectionError> {
        Ok(())
    }

    fn type_infos() -> Vec<TypeInfo> {
        Vec::new()
    }
}

impl<T: 'static + Send + Sync + ?Sized> Request for Arc<T> {
    fn resolve(injector: &Injector, ctx: &InjectionContext) -> Result<Self, InjectionError> {
        injector.get_with_context::<T>(ctx)
    }

    fn type_infos() -> Vec<TypeInfo> {
        vec![TypeInfo::of::<T>()]
    }
}

/// Owned-by-value requests (SPEC_FULL.md §4.2.1's "`T` by value" shape):
/// resolves the same way `Arc<T>` does, then clones out of the `Arc` - the
/// "dereferences one level" half of SPEC_FULL.md §4.2's pointer-vs-value
/// convention, mirrored on the request side rather than just the publish
/// side.
///
/// This is `Box<T>` rather than a blanket `impl<T> Request for T`: the
/// latter would be `T = Arc<U>` for every `U` (`Arc<U>: Clone` holds
/// unconditionally), which overlaps the `Arc<T>` impl above under Rust's
/// coherence rules. `Box<T>` is the grounding source's own answer to the
/// same shape - `runtime_injector` distinguishes its shared (`Svc<T>`) and
/// owned (`Box<S>`) requests the same way, by concrete wrapper type rather
/// than by blanket genericity.
impl<T: 'static + Send + Sync + Clone> Request for Box<T> {
    fn resolve(injector: &Injector, ctx: &InjectionContext) -> Result<Self, InjectionError> {
        Arc::<T>::resolve(injector, ctx).map(|arc| Box::new((*arc).clone()))
    }

    fn type_infos() -> Vec<TypeInfo> {
        vec![TypeInfo::of::<T>()]
    }
}

impl<T: 'static + Send + Sync + ?Sized> Request for Option<Arc<T>> {
    fn resolve(injector: &Injector, _ctx: &InjectionContext) -> Result<Self, InjectionError> {
        Ok(injector.find::<T>())
    }

    fn type_infos() -> Vec<TypeInfo> {
        vec![TypeInfo::of::<T>()]
    }
}

/// `Vec<Arc<T>>` (SPEC_FULL.md §4.2.1): every registered service whose base
/// type is `T` - in this reference-table design there is at most one, so
/// this always resolves to zero or one element, but the shape is kept for
/// parity with the documented injectable surface and for callers that treat
/// "maybe absent" and "definitely present" uniformly.
impl<T: 'static + Send + Sync + ?Sized> Request for Vec<Arc<T>> {
    fn resolve(injector: &Injector, _ctx: &InjectionContext) -> Result<Self, InjectionError> {
        Ok(injector.find::<T>().into_iter().collect())
    }

    fn type_infos() -> Vec<TypeInfo> {
        vec![TypeInfo::of::<T>()]
    }
}

macro_rules! impl_tuple_request {
    ($($t:ident),+) => {
        impl<$($t: Request),+> Request for ($($t,)+) {
            fn resolve(injector: &Injector, ctx: &InjectionContext) -> Result<Self, InjectionError> {
                Ok(($($t::resolve(injector, ctx)?,)+))
            }

            fn type_infos() -> Vec<TypeInfo> {
                let mut infos = Vec::new();
                $(infos.extend($t::type_infos());)+
                infos
            }
        }
    };
}

impl_tuple_request!(T0);
impl_tuple_request!(T0, T1);
impl_tuple_request!(T0, T1, T2);
impl_tuple_request!(T0, T1, T2, T3);
impl_tuple_request!(T0, T1, T2, T3, T4);
impl_tuple_request!(T0, T1, T2, T3, T4, T5);
impl_tuple_request!(T0, T1, T2, T3, T4, T5, T6);
impl_tuple_request!(T0, T1, T2, T3, T4, T5, T6, T7);
impl_tuple_request!(T0, T1, T2, T3, T4, T5, T6, T7, T8);
impl_tuple_request!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_tuple_request!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_tuple_request!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Generalizes "a function that can be called once its arguments are
/// resolved" over arity, so `Injector::call0` can accept plain closures and
/// `fn` items alike without the caller wrapping arguments in a tuple by hand.
pub trait Callable<Args: Request, R> {
    fn invoke(&self, args: Args) -> R;
}

impl<F, R> Callable<(), R> for F
where
    F: Fn() -> R,
{
    fn invoke(&self, _args: ()) -> R {
        self()
    }
}

macro_rules! impl_callable {
    ($($t:ident => $idx:tt),+) => {
        impl<F, R, $($t: Request),+> Callable<($($t,)+), R> for F
        where
            F: Fn($($t),+) -> R,
        {
            fn invoke(&self, args: ($($t,)+)) -> R {
                self($(args.$idx),+)
            }
        }
    };
}

impl_callable!(T0 => 0);
impl_callable!(T0 => 0, T1 => 1);
impl_callable!(T0 => 0, T1 => 1, T2 => 2);
impl_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3);
impl_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4);
impl_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5);
impl_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5, T6 => 6);
impl_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5, T6 => 6, T7 => 7);
impl_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5, T6 => 6, T7 => 7, T8 => 8);
impl_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5, T6 => 6, T7 => 7, T8 => 8, T9 => 9);
impl_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5, T6 => 6, T7 => 7, T8 => 8, T9 => 9, T10 => 10);
impl_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5, T6 => 6, T7 => 7, T8 => 8, T9 => 9, T10 => 10, T11 => 11);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Initializer invocation (SPEC_FULL.md §4.5): `initializer(fn)` calls
// `injector.call(fn, extra_args=[&mut instance])` - the first parameter is a
// caller-supplied `&mut T` override, the rest are resolved normally. Tuple
// arities are kept separate from `Callable` because the leading argument is
// never a `Request` impl (it is handed in directly, never looked up).
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub trait InitCallable<'a, T, Args: Request, R> {
    fn invoke_init(&self, instance: &'a mut T, args: Args) -> R;
}

impl<'a, F, T: 'a, R> InitCallable<'a, T, (), R> for F
where
    F: Fn(&'a mut T) -> R,
{
    fn invoke_init(&self, instance: &'a mut T, _args: ()) -> R {
        self(instance)
    }
}

macro_rules! impl_init_callable {
    ($($t:ident => $idx:tt),+) => {
        impl<'a, F, T: 'a, R, $($t: Request),+> InitCallable<'a, T, ($($t,)+), R> for F
        where
            F: Fn(&'a mut T, $($t),+) -> R,
        {
            fn invoke_init(&self, instance: &'a mut T, args: ($($t,)+)) -> R {
                self(instance, $(args.$idx),+)
            }
        }
    };
}

impl_init_callable!(T0 => 0);
impl_init_callable!(T0 => 0, T1 => 1);
impl_init_callable!(T0 => 0, T1 => 1, T2 => 2);
impl_init_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3);
impl_init_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4);
impl_init_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5);
impl_init_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5, T6 => 6);
impl_init_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5, T6 => 6, T7 => 7);
impl_init_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5, T6 => 6, T7 => 7, T8 => 8);
impl_init_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5, T6 => 6, T7 => 7, T8 => 8, T9 => 9);
impl_init_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5, T6 => 6, T7 => 7, T8 => 8, T9 => 9, T10 => 10);
impl_init_callable!(T0 => 0, T1 => 1, T2 => 2, T3 => 3, T4 => 4, T5 => 5, T6 => 6, T7 => 7, T8 => 8, T9 => 9, T10 => 10, T11 => 11);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerBuilder;

    #[derive(Clone)]
    struct Greeting(String);

    #[test]
    fn call0_resolves_single_arg() {
        let mut builder = ContainerBuilder::new();
        builder.add_value(Greeting("hi".to_owned()));
        let container = builder.build().unwrap();
        let injector = container.injector();

        let result: String = injector
            .call0(|g: Arc<Greeting>| g.0.clone())
            .unwrap();
        assert_eq!(result, "hi");
    }

    #[test]
    fn call0_resolves_two_args_in_declared_order() {
        let mut builder = ContainerBuilder::new();
        builder.add_value(Greeting("a".to_owned()));
        builder.add_value(42i32);
        let container = builder.build().unwrap();
        let injector = container.injector();

        let result: String = injector
            .call0(|g: Arc<Greeting>, n: Arc<i32>| format!("{}{}", g.0, n))
            .unwrap();
        assert_eq!(result, "a42");
    }

    #[test]
    fn call0_resolves_owned_by_value_argument() {
        let mut builder = ContainerBuilder::new();
        builder.add_value(Greeting("owned".to_owned()));
        let container = builder.build().unwrap();
        let injector = container.injector();

        let result: String = injector
            .call0(|g: Box<Greeting>| g.0)
            .unwrap();
        assert_eq!(result, "owned");
    }
}
