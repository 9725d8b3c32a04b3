use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{ContainerError, InjectionError};
use crate::hooks::{HookEntry, HookKind};
use crate::injector::Injector;
use crate::module::{Autowire, Provider};
use crate::registry::TypeInfo;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// One entry in the flat dependency set (SPEC_FULL.md §3 `Dep`). `implicit`
/// marks an entry that exists only because some module field referenced the
/// type - it is still subject to being upgraded (or conflicting) with an
/// explicit registration processed later, per the insert semantics in
/// SPEC_FULL.md §4.4.
///
/// `has_instance`/`is_override` render spec.md §3's `state: instance | override`
/// split (§4.4 merge rules): `has_instance` is false only for a pending
/// `add_override` placeholder that has not yet been paired with an `instance`
/// declaration (`add`/a module field). `is_override` records that the active
/// `provider` came from an `add_override`/`add_mock` call, so a later
/// "last override wins" call still replaces it without tripping
/// `DuplicateService`.
pub struct DepEntry {
    pub type_info: TypeInfo,
    pub provider: Provider,
    pub declared_by: Option<TypeInfo>,
    pub implicit: bool,
    pub has_instance: bool,
    pub is_override: bool,
    /// `size_of::<T>()` for the service this entry describes - a
    /// diagnostic-only stand-in for the host spec's storage-region sizing
    /// (SPEC_FULL.md §3 `Plan.storage_bytes`); nothing in the executor
    /// allocates against it, see [`crate::plan::Plan`].
    pub size_hint: usize,
}

type CompileHook = Arc<dyn Fn(&mut Collector) + Send + Sync>;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


/// Accumulates module declarations across the whole build step (SPEC_FULL.md
/// §1.1: this *is* the out-of-band "build step" the host spec's design notes
/// call for). Owned exclusively by [`crate::container::ContainerBuilder`]
/// while a container is being assembled; never exposed once `Ready`.
pub struct Collector {
    deps: Vec<DepEntry>,
    index: HashMap<TypeId, usize>,
    compile_hooks: Vec<CompileHook>,
    init_hooks: Vec<HookEntry>,
    deinit_hooks: Vec<HookEntry>,
    errors: Vec<ContainerError>,
    /// Opt-in "strict" build mode (SPEC_FULL.md §7/§2.1): by default an
    /// `add_override` that never gets paired with an `instance` is tolerated
    /// (spec.md §9 "Unused overrides" design note - shared mocks modules
    /// commonly cover more services than any one build uses). Set via
    /// [`crate::container::ContainerBuilder::with_strict`] to turn an
    /// unpaired override into an `UnresolvedOverride` diagnostic instead.
    strict: bool,
}

impl Collector {
    pub fn new() -> Self {
        Self {
            deps: Vec::new(),
            index: HashMap::new(),
            compile_hooks: Vec::new(),
            init_hooks: Vec::new(),
            deinit_hooks: Vec::new(),
            errors: Vec::new(),
            strict: false,
        }
    }

    pub(crate) fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn deps(&self) -> &[DepEntry] {
        &self.deps
    }

    pub fn deps_mut(&mut self) -> &mut [DepEntry] {
        &mut self.deps
    }

    /// Finalizes collection (SPEC_FULL.md §4.4): pending `add_override`
    /// placeholders that never paired with an `instance` are dropped (spec.md
    /// §9, tolerated by default) unless `strict` is set, in which case each
    /// one raises `UnresolvedOverride`. Paired entries keep whichever
    /// provider won per the insert-semantics rules in [`Self::insert_entry`]
    /// and [`Self::add_override`].
    pub fn into_parts(mut self) -> (Vec<DepEntry>, Vec<HookEntry>, Vec<HookEntry>, Vec<ContainerError>) {
        if self.strict {
            for entry in &self.deps {
                if !entry.has_instance {
                    self.errors.push(ContainerError::UnresolvedOverride(entry.type_info));
                }
            }
        }
        let deps: Vec<DepEntry> = self.deps.into_iter().filter(|d| d.has_instance).collect();
        (deps, self.init_hooks, self.deinit_hooks, self.errors)
    }

    pub fn push_error(&mut self, err: ContainerError) {
        self.errors.push(err);
    }

    /// Used by macro-generated field registration thunks: declares that a
    /// module field needs `T`, without committing to a provider unless
    /// nothing else claims `T` first. Requires `T: Autowire` - the Rust
    /// rendering of "promote to autowire, else a compile error" (SPEC_FULL.md
    /// §4.5): if `T` cannot autowire, this call itself fails to type-check.
    pub fn insert_implicit<T>(&mut self, declared_by: TypeInfo)
    where
        T: Autowire + crate::module::ModuleDescriptor + Send + Sync + 'static,
    {
        let field_types: Vec<TypeInfo> = T::fields().iter().map(|f| (f.type_info)()).collect();
        self.insert_entry(
            TypeInfo::of::<T>(),
            Provider::autowire::<T>(field_types),
            Some(declared_by),
            true,
            std::mem::size_of::<T>(),
        );
    }

    /// Field-with-default path (SPEC_FULL.md §4.3 point 2: "provider is
    /// `value(default)` if the field has a default value"). Unlike
    /// [`Self::insert_implicit`], this places no `Autowire` bound on `T`, so
    /// it is how leaf/primitive field types (strings, numbers, anything with
    /// no sensible autowiring) enter the graph: give them a default via
    /// `#[bindgraph(default = ...)]` and, if needed, replace it later with
    /// `add_override`.
    pub fn insert_implicit_value<T: Send + Sync + 'static>(
        &mut self,
        default: impl FnOnce() -> T,
        declared_by: TypeInfo,
    ) {
        self.insert_entry(
            TypeInfo::of::<T>(),
            Provider::Value(crate::module::erase(Arc::new(default()))),
            Some(declared_by),
            true,
            std::mem::size_of::<T>(),
        );
    }

    /// `add(T, how)` (SPEC_FULL.md §4.4): explicit registration. A second
    /// explicit registration of the same type is a `DuplicateService`
    /// diagnostic; an explicit registration always wins over a mere implicit
    /// placeholder left by field scanning.
    pub fn add<T: 'static + ?Sized>(&mut self, provider: Provider) {
        self.insert_entry(TypeInfo::of::<T>(), provider, None, false, 0);
    }

    /// `add_override(T, how)` (SPEC_FULL.md §4.4): supersedes `T`'s provider.
    /// Legal before or after the corresponding `instance` is seen (spec.md
    /// §4.4): if `T` is already known, its provider is replaced in place
    /// ("last override wins" - repeated overrides keep stacking); if `T` is
    /// not yet known, a pending placeholder is recorded with `has_instance =
    /// false` and no storage is reserved for it until some `add`/module field
    /// pairs an `instance` with the same base type (`Self::insert_entry`). A
    /// placeholder that's never paired is tolerated unless `strict` is set
    /// (see [`Self::into_parts`]).
    pub fn add_override<T: 'static + ?Sized>(&mut self, provider: Provider) {
        let type_info = TypeInfo::of::<T>();
        match self.index.get(&type_info.id) {
            Some(&idx) => {
                self.deps[idx].provider = provider;
                self.deps[idx].implicit = false;
                self.deps[idx].is_override = true;
            }
            None => {
                let idx = self.deps.len();
                self.deps.push(DepEntry {
                    type_info,
                    provider,
                    declared_by: None,
                    implicit: false,
                    has_instance: false,
                    is_override: true,
                    size_hint: 0,
                });
                self.index.insert(type_info.id, idx);
            }
        }
    }

    /// `add_mock(T, how)` (SPEC_FULL.md §4.3 point 4): same as
    /// `add_override`, but rejected outside a test build.
    pub fn add_mock<T: 'static + ?Sized>(&mut self, provider: Provider) {
        if cfg!(test) || cfg!(feature = "test-doubles") {
            self.add_override::<T>(provider);
        } else {
            self.push_error(ContainerError::MockOutsideTests(TypeInfo::of::<T>()));
        }
    }

    pub fn add_field_ref<T: 'static + ?Sized>(&mut self, provider: Provider) {
        self.insert_entry(TypeInfo::of::<T>(), provider, None, false, 0);
    }

    pub fn add_compile_hook(&mut self, hook: impl Fn(&mut Collector) + Send + Sync + 'static) {
        self.compile_hooks.push(Arc::new(hook));
    }

    pub fn add_init_hook(&mut self, mask_types: Vec<TypeInfo>, call: impl Fn(&Injector) -> Result<(), InjectionError> + Send + Sync + 'static) {
        self.init_hooks.push(HookEntry {
            kind: HookKind::Init,
            mask_types,
            call: Arc::new(call),
        });
    }

    pub fn add_deinit_hook(&mut self, mask_types: Vec<TypeInfo>, call: impl Fn(&Injector) -> Result<(), InjectionError> + Send + Sync + 'static) {
        self.deinit_hooks.push(HookEntry {
            kind: HookKind::Deinit,
            mask_types,
            call: Arc::new(call),
        });
    }

    /// Runs every registered compile hook (SPEC_FULL.md §4.3: "after all
    /// modules are processed, every registered compile hook runs").
    pub fn run_compile_hooks(&mut self) {
        let hooks = std::mem::take(&mut self.compile_hooks);
        for hook in &hooks {
            hook(self);
        }
        self.compile_hooks = hooks;
    }

    fn insert_entry(
        &mut self,
        type_info: TypeInfo,
        provider: Provider,
        declared_by: Option<TypeInfo>,
        implicit: bool,
        size_hint: usize,
    ) {
        match self.index.get(&type_info.id) {
            None => {
                let idx = self.deps.len();
                self.deps.push(DepEntry {
                    type_info,
                    provider,
                    declared_by,
                    implicit,
                    has_instance: true,
                    is_override: false,
                    size_hint,
                });
                self.index.insert(type_info.id, idx);
            }
            Some(&idx) => {
                if !self.deps[idx].has_instance {
                    // Existing is a pending `add_override` placeholder
                    // (spec.md §4.4: "existing is override (placeholder), new
                    // is instance -> adopt the new instance state, keep the
                    // override's provider"). The override's provider wins;
                    // this declaration only supplies the storage/size it was
                    // waiting on.
                    self.deps[idx].has_instance = true;
                    self.deps[idx].declared_by = declared_by;
                    self.deps[idx].size_hint = size_hint;
                    return;
                }
                let existing_implicit = self.deps[idx].implicit;
                match (existing_implicit, implicit) {
                    (true, false) => {
                        // Explicit registration upgrades a placeholder.
                        self.deps[idx].provider = provider;
                        self.deps[idx].declared_by = declared_by;
                        self.deps[idx].implicit = false;
                    }
                    (true, true) | (false, true) => {
                        // Another field reference to an already-known type: no-op.
                    }
                    (false, false) => {
                        self.push_error(ContainerError::DuplicateService(type_info));
                    }
                }
            }
        }
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    impl Autowire for A {
        fn autowire(_injector: &Injector) -> Result<Self, InjectionError> {
            Ok(A)
        }
    }
    impl crate::module::ModuleDescriptor for A {
        fn module_type_info() -> TypeInfo {
            TypeInfo::of::<A>()
        }
        fn fields() -> Vec<crate::module::FieldSpec> {
            Vec::new()
        }
    }

    #[test]
    fn implicit_then_explicit_upgrades_to_explicit() {
        let mut c = Collector::new();
        c.insert_implicit::<A>(TypeInfo::of::<()>());
        assert!(c.deps()[0].implicit);

        c.add::<A>(Provider::value(5i32));
        assert!(!c.deps()[0].implicit);
        assert_eq!(c.deps().len(), 1);
    }

    #[test]
    fn two_explicit_registrations_conflict() {
        let mut c = Collector::new();
        c.add::<A>(Provider::value(1i32));
        c.add::<A>(Provider::value(2i32));
        let (_, _, _, errors) = c.into_parts();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ContainerError::DuplicateService(_)));
    }

    #[test]
    fn override_without_prior_registration_is_tolerated_by_default() {
        let mut c = Collector::new();
        c.add_override::<A>(Provider::value(1i32));
        let (deps, _, _, errors) = c.into_parts();
        assert!(errors.is_empty());
        assert!(deps.is_empty());
    }

    #[test]
    fn override_without_prior_registration_errors_in_strict_mode() {
        let mut c = Collector::new();
        c.set_strict(true);
        c.add_override::<A>(Provider::value(1i32));
        let (_, _, _, errors) = c.into_parts();
        assert!(matches!(errors[0], ContainerError::UnresolvedOverride(_)));
    }

    #[test]
    fn override_declared_before_instance_pairs_and_keeps_override_provider() {
        let mut c = Collector::new();
        c.add_override::<A>(Provider::value(1i32));
        c.add::<A>(Provider::value(2i32));
        let (deps, _, _, errors) = c.into_parts();
        assert!(errors.is_empty());
        assert_eq!(deps.len(), 1);
        assert!(deps[0].has_instance);
        assert!(deps[0].is_override);
    }
}
