//! The container's external surface (SPEC_FULL.md §4.9/§6): `ContainerBuilder`
//! accumulates module/value/hook registrations during the build step, then
//! `build()` runs collection → resolution → masking → scheduling →
//! execution in one call and hands back a `Ready` [`Container`].

use std::any::TypeId;
use std::sync::Arc;

use crate::collector::Collector;
use crate::errors::ContainerError;
use crate::executor;
use crate::hooks::HookEntry;
use crate::injector::Injector;
use crate::module::{Configure, FieldSpec, ModuleDescriptor, Provider};
use crate::reference_table::ReferenceTable;
use crate::registry::TypeInfo;
use crate::request::Request;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Built-ins (spec.md §4.1, GLOSSARY): three reserved type ids that are
// always present in a `Ready` container's reference table and never count
// as a dependency. `ContainerHandle`/`InjectorHandle` are zero-sized marker
// types (there is nothing else meaningful to hand back for "the container
// itself" or "the injector itself" once the caller already holds a
// `&Container`/`&Injector`); `HostAllocator` is a real trait so a module
// that wants to emulate an arena-style service can still ask for one.
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Default)]
pub struct ContainerHandle;

#[derive(Debug, Default)]
pub struct InjectorHandle;

/// Marker for the "host allocator" built-in (spec.md §4.1). Rust services
/// essentially never need an explicit allocator handle; the slot is kept
/// for parity with the spec's three reserved built-ins and so a module can
/// inject it when emulating an arena-style service.
pub trait HostAllocator: Send + Sync {}

#[derive(Debug, Default)]
pub struct GlobalHostAllocator;
impl HostAllocator for GlobalHostAllocator {}

pub(crate) fn is_builtin_type(id: TypeId) -> bool {
    id == TypeId::of::<ContainerHandle>()
        || id == TypeId::of::<InjectorHandle>()
        || id == TypeId::of::<dyn HostAllocator>()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// SPEC_FULL.md §4.9: `Unbuilt → Initializing → Ready → Destroying →
/// Destroyed`. `Unbuilt`/`Destroyed` never appear as a live value in this
/// port - a failed `build()` returns `Err` and drops its half-built state
/// (Rust's `Drop` takes the place of the spec's "free the container
/// object"); `destroy()` consumes `self`, so `Destroyed` is "the container
/// no longer exists" rather than an observable state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerState {
    Initializing,
    Ready,
    Destroying,
}

pub struct ContainerBuilder {
    collector: Collector,
    allocator: Arc<dyn HostAllocator>,
    strict: bool,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        // `ContainerHandle`/`InjectorHandle`/`HostAllocator` never go through
        // the collector: they are published directly to their reserved
        // table slots in `build()` and `is_builtin_type` tells the mask
        // builder to skip them wherever they show up as a dependency.
        Self {
            collector: Collector::new(),
            allocator: Arc::new(GlobalHostAllocator),
            strict: false,
        }
    }

    /// Overrides the "host allocator" built-in (default
    /// [`GlobalHostAllocator`]) before `build()`.
    pub fn with_allocator(mut self, allocator: Arc<dyn HostAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    /// Opts into strict mode (SPEC_FULL.md §2.1/§7): an `add_override`/
    /// `add_mock` that never pairs with an `instance` becomes an
    /// `UnresolvedOverride` build error instead of being tolerated (spec.md
    /// §9's default, used by shared "mocks" modules that cover more services
    /// than any one build needs).
    pub fn with_strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Registers one module (spec.md §4.3): every field of `M` emits one
    /// implicit `Dep`, in field-declaration order. The module aggregate
    /// itself is not separately storage-backed in this port - each field is
    /// already independently `Arc`-owned, so there is nothing a `get::<M>()`
    /// lookup would usefully return (see DESIGN.md).
    pub fn add_module<M: ModuleDescriptor + 'static>(&mut self) -> &mut Self {
        for field in M::fields() {
            self.register_field(field);
        }
        self
    }

    /// Same as [`Self::add_module`], additionally invoking `M`'s
    /// `Configure::configure` hook once every field has been registered
    /// (spec.md §4.3 point 4).
    pub fn add_module_with_configure<M>(&mut self) -> &mut Self
    where
        M: ModuleDescriptor + Configure + 'static,
    {
        self.add_module::<M>();
        M::configure(&mut self.collector);
        self
    }

    fn register_field(&mut self, field: FieldSpec) {
        (field.register)(&mut self.collector);
    }

    pub fn add<T: 'static + ?Sized>(&mut self, provider: Provider) -> &mut Self {
        self.collector.add::<T>(provider);
        self
    }

    pub fn add_value<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.add::<T>(Provider::value(value))
    }

    pub fn add_override<T: 'static + ?Sized>(&mut self, provider: Provider) -> &mut Self {
        self.collector.add_override::<T>(provider);
        self
    }

    /// Rejected outside `cfg(test)`/the `test-doubles` feature (spec.md §7).
    pub fn add_mock<T: 'static + ?Sized>(&mut self, provider: Provider) -> &mut Self {
        self.collector.add_mock::<T>(provider);
        self
    }

    pub fn add_field_ref<T: 'static + ?Sized>(&mut self, provider: Provider) -> &mut Self {
        self.collector.add_field_ref::<T>(provider);
        self
    }

    pub fn add_compile_hook(
        &mut self,
        hook: impl Fn(&mut Collector) + Send + Sync + 'static,
    ) -> &mut Self {
        self.collector.add_compile_hook(hook);
        self
    }

    pub fn add_init_hook<Args, F>(&mut self, call: F) -> &mut Self
    where
        Args: Request,
        F: Fn(&Injector) -> Result<(), crate::errors::InjectionError> + Send + Sync + 'static,
    {
        self.collector.add_init_hook(Args::type_infos(), call);
        self
    }

    pub fn add_deinit_hook<Args, F>(&mut self, call: F) -> &mut Self
    where
        Args: Request,
        F: Fn(&Injector) -> Result<(), crate::errors::InjectionError> + Send + Sync + 'static,
    {
        self.collector.add_deinit_hook(Args::type_infos(), call);
        self
    }

    /// Runs collection → configure/compile hooks → resolution → masking →
    /// scheduling → execution (SPEC_FULL.md §2 flow diagram), returning a
    /// `Ready` [`Container`] or the first build-time diagnostic raised.
    pub fn build(mut self) -> Result<Container, ContainerError> {
        self.collector.set_strict(self.strict);
        self.collector.run_compile_hooks();
        let (deps, init_hooks, deinit_hooks, mut errors) = self.collector.into_parts();
        if let Some(err) = errors.drain(..).next() {
            return Err(err);
        }

        let (plan, _dep_masks, _deinit_hook_masks) =
            crate::scheduler::build_plan(&deps, &init_hooks, &deinit_hooks)?;

        let mut table = ReferenceTable::with_capacity(plan.table_capacity());
        table
            .publish(
                0,
                TypeInfo::of::<ContainerHandle>(),
                crate::module::erase(Arc::new(ContainerHandle)),
            )
            .expect("reserved slot 0 always fits");
        table
            .publish(
                1,
                TypeInfo::of::<InjectorHandle>(),
                crate::module::erase(Arc::new(InjectorHandle)),
            )
            .expect("reserved slot 1 always fits");
        table
            .publish(
                2,
                TypeInfo::of::<dyn HostAllocator>(),
                crate::module::erase(self.allocator.clone()),
            )
            .expect("reserved slot 2 always fits");

        #[cfg(feature = "logging")]
        tracing::debug!(ops = plan.ops.len(), "container entering Initializing");

        executor::run(&plan, deps, &init_hooks, deinit_hooks, table)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A `Ready` container (SPEC_FULL.md §4.9): owns the reference table and the
/// deinit hooks needed to tear everything back down in reverse.
pub struct Container {
    pub(crate) table: ReferenceTable,
    pub(crate) deps: Vec<crate::collector::DepEntry>,
    pub(crate) deinit_hooks: Vec<HookEntry>,
    /// Dep indices in the order they were initialized; teardown walks this
    /// in reverse (spec.md §3 Lifecycle).
    pub(crate) deinit_order: Vec<usize>,
    state: ContainerState,
}

impl Container {
    pub(crate) fn new(
        table: ReferenceTable,
        deps: Vec<crate::collector::DepEntry>,
        deinit_hooks: Vec<HookEntry>,
        deinit_order: Vec<usize>,
    ) -> Self {
        #[cfg(feature = "logging")]
        tracing::info!("container Ready");
        Self {
            table,
            deps,
            deinit_hooks,
            deinit_order,
            state: ContainerState::Ready,
        }
    }

    pub fn state(&self) -> ContainerState {
        self.state
    }

    /// Valid only while `Ready` - there is no other state a live `Container`
    /// value can observe in this port (see [`ContainerState`]).
    pub fn injector(&self) -> Injector<'_> {
        Injector::new(&self.table)
    }

    /// Runs teardown in strict reverse op order (spec.md §3 Lifecycle,
    /// SPEC_FULL.md §4.8) and consumes the container.
    pub fn destroy(mut self) {
        self.state = ContainerState::Destroying;
        executor::teardown(&mut self.table, &self.deps, &self.deinit_order, &self.deinit_hooks);
        #[cfg(feature = "logging")]
        tracing::info!("container Destroyed");
    }

    /// Plain-text dump of the computed op order, grounded on the teacher's
    /// `utils/graphviz.rs`/`utils/plantuml.rs` graph renderers, reduced to a
    /// linear op list since this domain has no interface-binding graph
    /// (SPEC_FULL.md §2.1).
    pub fn graph_description(&self) -> String {
        let mut out = indoc::indoc! {"
            # bindgraph op order
        "}
        .to_owned();
        for (info, _) in self.table.iter() {
            out.push_str(&format!("{info}\n"));
        }
        out
    }
}
