use std::any::Any;
use std::sync::Arc;

use crate::errors::InjectionError;
use crate::injector::Injector;
use crate::registry::TypeInfo;
use crate::request::{Callable, InitCallable, Request};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Provider strategies (SPEC_FULL.md §3 `Dep.provider`, §4.5 Resolver). The
// host spec's `auto` tier (try an inherent `init` method, else a factory
// method, else field-wise autowiring) cannot be replicated by a Rust derive
// macro that only ever sees one struct's field list - there is no way for
// `#[derive(Service)]` to discover an unrelated `impl` block's methods. This
// port renders the three tiers as three distinct, explicit entry points on
// `ContainerBuilder` instead (`add`, `add_init`, `add_factory`): the type
// itself is reflected through `Request`/`Callable`/`InitCallable`, so a
// function whose signature doesn't fit still fails at the macro's own
// compile time, just via ordinary type-checking rather than introspection.
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;
pub(crate) type MakeFn = Arc<dyn Fn(&Injector) -> Result<AnyArc, InjectionError> + Send + Sync>;
pub(crate) type DeinitFn = Arc<dyn Fn(&AnyArc, &Injector) + Send + Sync>;

/// Erases an `Arc<T>` into the table's storage representation. Every entry
/// is stored one indirection deeper than the obvious `Arc::new(v) as AnyArc`
/// would suggest - the payload downcasts to `Arc<T>`, not `T` - because an
/// unsized `T` (a `dyn Trait` field-ref target, SPEC_FULL.md §4.3 point 3)
/// can never itself be the target of `Any::downcast`, only `Arc<T>` can
/// (`Arc<T>` is `Sized` regardless of whether `T` is). Keeping one
/// convention for both sized and unsized payloads means `Injector::get`
/// doesn't need a separate code path for interface types.
pub(crate) fn erase<T: Send + Sync + 'static + ?Sized>(v: Arc<T>) -> AnyArc {
    Arc::new(v)
}

#[derive(Clone)]
pub enum Provider {
    /// Field-wise autowiring, derived by `#[derive(Service)]`. `fields` is
    /// the base type of every field, captured so the mask builder
    /// (SPEC_FULL.md §4.6) doesn't need to re-derive it from `make`.
    Autowire { make: MakeFn, fields: Vec<TypeInfo> },
    /// A literal value, cloned in at registration time.
    Value(AnyArc),
    /// Covers both `factory(fn)` and `initializer(fn)`: once an instance is
    /// produced it is identical from the executor's point of view (see
    /// SPEC_FULL.md's note on publish-after-provider in §4.7/DESIGN.md).
    /// `depends_on` is `Args::type_infos()`, captured once at registration.
    /// Only `Make` services are eligible for `deinit` (SPEC_FULL.md §4.8);
    /// `deinit` is `None` when the registration didn't supply one.
    Make {
        make: MakeFn,
        depends_on: Vec<TypeInfo>,
        deinit: Option<DeinitFn>,
    },
    /// Exposes a named sub-field of an already-initialized owner as its own
    /// injectable service (SPEC_FULL.md §4.3 point 3).
    FieldRef(FieldRefSpec),
}

impl Provider {
    /// The other `Dep`s this provider needs before it can run, used to build
    /// the dependency mask (SPEC_FULL.md §4.6).
    pub fn dependencies(&self) -> Vec<TypeInfo> {
        match self {
            Provider::Autowire { fields, .. } => fields.clone(),
            Provider::Value(_) => Vec::new(),
            Provider::Make { depends_on, .. } => depends_on.clone(),
            Provider::FieldRef(spec) => vec![spec.owner],
        }
    }

    /// Eligibility + callback for teardown (SPEC_FULL.md §4.8): only
    /// `factory`/`initializer`-provided services ever run a `deinit`.
    pub fn deinit(&self) -> Option<&DeinitFn> {
        match self {
            Provider::Make { deinit, .. } => deinit.as_ref(),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct FieldRefSpec {
    pub owner: TypeInfo,
    pub field_name: &'static str,
    pub accessor: Arc<dyn Fn(&AnyArc) -> Option<AnyArc> + Send + Sync>,
}

impl Provider {
    pub fn value<T: Send + Sync + 'static>(v: T) -> Self {
        Provider::Value(erase(Arc::new(v)))
    }

    /// `autowire` tier (SPEC_FULL.md §4.5): `T` fills each of its own fields
    /// from the injector via its generated [`Autowire`] impl. `fields` is
    /// the same base-type list `Autowire::autowire` resolves internally,
    /// captured once so the mask builder doesn't need to invoke `T` to
    /// learn its shape.
    pub fn autowire<T: Autowire + Send + Sync + 'static>(fields: Vec<TypeInfo>) -> Self {
        Provider::Autowire {
            fields,
            make: Arc::new(|injector: &Injector| {
                let inst = T::autowire(injector)?;
                Ok(erase(Arc::new(inst)))
            }),
        }
    }

    /// `factory(fn)`: `instance = injector.call(fn, &[])?` (SPEC_FULL.md
    /// §4.5). `f` returns the instance by value; it is wrapped in an `Arc`
    /// once produced.
    pub fn factory<T, F, Args>(f: F) -> Self
    where
        T: Send + Sync + 'static,
        Args: Request,
        F: Callable<Args, T> + Send + Sync + 'static,
    {
        Self::factory_impl::<T, F, Args>(f, None)
    }

    /// Same as [`Self::factory`], plus a `deinit(&T, DArgs)` callback run
    /// during teardown (SPEC_FULL.md §4.8). Resolution failures for `DArgs`
    /// are logged and swallowed rather than propagated, since teardown
    /// recovers nothing (spec.md §7).
    pub fn factory_with_deinit<T, F, Args, D, DArgs>(f: F, d: D) -> Self
    where
        T: Send + Sync + 'static,
        Args: Request,
        F: Callable<Args, T> + Send + Sync + 'static,
        DArgs: Request,
        D: Fn(&T, DArgs) + Send + Sync + 'static,
    {
        Self::factory_impl::<T, F, Args>(f, Some(Self::wrap_deinit(d)))
    }

    fn factory_impl<T, F, Args>(f: F, deinit: Option<DeinitFn>) -> Self
    where
        T: Send + Sync + 'static,
        Args: Request,
        F: Callable<Args, T> + Send + Sync + 'static,
    {
        Provider::Make {
            depends_on: Args::type_infos(),
            make: Arc::new(move |injector: &Injector| {
                let ctx = crate::injection_context::InjectionContext::new_root();
                let args = Args::resolve(injector, &ctx)?;
                Ok(erase(Arc::new(f.invoke(args))))
            }),
            deinit,
        }
    }

    fn wrap_deinit<T, D, DArgs>(d: D) -> DeinitFn
    where
        T: Send + Sync + 'static,
        DArgs: Request,
        D: Fn(&T, DArgs) + Send + Sync + 'static,
    {
        Arc::new(move |inst: &AnyArc, injector: &Injector| {
            let Some(t) = inst.downcast_ref::<Arc<T>>() else {
                return;
            };
            let ctx = crate::injection_context::InjectionContext::new_root();
            match DArgs::resolve(injector, &ctx) {
                Ok(args) => d(t.as_ref(), args),
                Err(_err) => {
                    #[cfg(feature = "logging")]
                    tracing::warn!(error = %_err, "deinit callback could not resolve its dependencies, skipping");
                }
            }
        })
    }

    /// `initializer(fn)`: `injector.call(fn, extra_args=[&mut instance])`
    /// (SPEC_FULL.md §4.5). Requires `T: Default` because Rust, unlike the
    /// host language, has no way to hand out an address to not-yet-valid
    /// memory and mutate it in place safely - this constructs a real
    /// `T::default()` first and calls `f` against that; see DESIGN.md's
    /// "`Provider::initializer`'s `T: Default` bound" Open Question entry.
    pub fn initializer<T, F, Args>(f: F) -> Self
    where
        T: Default + Send + Sync + 'static,
        Args: Request,
        F: for<'a> InitCallable<'a, T, Args, ()> + Send + Sync + 'static,
    {
        Self::initializer_impl::<T, F, Args>(f, None)
    }

    /// Same as [`Self::initializer`], plus a `deinit(&T, DArgs)` callback;
    /// see [`Self::factory_with_deinit`].
    pub fn initializer_with_deinit<T, F, Args, D, DArgs>(f: F, d: D) -> Self
    where
        T: Default + Send + Sync + 'static,
        Args: Request,
        F: for<'a> InitCallable<'a, T, Args, ()> + Send + Sync + 'static,
        DArgs: Request,
        D: Fn(&T, DArgs) + Send + Sync + 'static,
    {
        Self::initializer_impl::<T, F, Args>(f, Some(Self::wrap_deinit(d)))
    }

    fn initializer_impl<T, F, Args>(f: F, deinit: Option<DeinitFn>) -> Self
    where
        T: Default + Send + Sync + 'static,
        Args: Request,
        F: for<'a> InitCallable<'a, T, Args, ()> + Send + Sync + 'static,
    {
        Provider::Make {
            depends_on: Args::type_infos(),
            make: Arc::new(move |injector: &Injector| {
                let ctx = crate::injection_context::InjectionContext::new_root();
                let args = Args::resolve(injector, &ctx)?;
                let mut inst = T::default();
                f.invoke_init(&mut inst, args);
                Ok(erase(Arc::new(inst)))
            }),
            deinit,
        }
    }

    /// `field_ref(T, field)`: the accessor clones `owner.<field_name>` once
    /// the owner service is ready.
    pub fn field_ref<Owner, Field>(
        field_name: &'static str,
        accessor: impl Fn(&Owner) -> Arc<Field> + Send + Sync + 'static,
    ) -> Self
    where
        Owner: 'static,
        Field: Send + Sync + 'static + ?Sized,
    {
        Provider::FieldRef(FieldRefSpec {
            owner: TypeInfo::of::<Owner>(),
            field_name,
            accessor: Arc::new(move |owner: &AnyArc| {
                let owner: Arc<Arc<Owner>> = owner.clone().downcast::<Arc<Owner>>().ok()?;
                let field: Arc<Field> = accessor(&owner);
                Some(erase(field))
            }),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Derived by `#[derive(Service)]` for structs whose fields are all
/// themselves injectable (SPEC_FULL.md §4.5, the `autowire` tier).
pub trait Autowire: Sized {
    fn autowire(injector: &Injector) -> Result<Self, InjectionError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Module-bundle descriptor (SPEC_FULL.md §4.3): the set of field
/// declarations a `#[derive(Module)]` struct contributes to the dependency
/// graph, enumerated once by the macro at expansion time.
pub struct FieldSpec {
    pub field_name: &'static str,
    pub type_info: fn() -> TypeInfo,
    pub is_interface: bool,
    pub register: fn(&mut crate::collector::Collector),
}

pub trait ModuleDescriptor {
    fn module_type_info() -> TypeInfo;
    fn fields() -> Vec<FieldSpec>;
}

/// Optional per-module hook (SPEC_FULL.md §4.3 point 4): may add further
/// dependencies, register field refs, or install init/deinit/compile hooks.
/// An ordinary trait method, not a macro, since it needs the whole bundle
/// being assembled across every module - see SPEC_FULL.md §1.1.
pub trait Configure {
    fn configure(bundle: &mut crate::collector::Collector);
}
