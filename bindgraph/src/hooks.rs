//! Hooks subsystem (SPEC_FULL.md §4.3/§4.6 / spec.md §4.3 point 4): build-step
//! bundle post-processors (`add_compile_hook`) and runtime `init`/`deinit`
//! callbacks ordered against their dependency mask like any other op.

use std::sync::Arc;

use crate::errors::InjectionError;
use crate::injector::Injector;
use crate::registry::TypeInfo;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HookKind {
    Init,
    Deinit,
}

/// One registered `init`/`deinit` callback. `mask_types` is captured once at
/// registration time (`Args::type_infos()`, see [`crate::request::Request`])
/// so the scheduler can compute its mask the same way it does for a `Dep`'s
/// provider, without re-invoking the closure.
#[derive(Clone)]
pub struct HookEntry {
    pub kind: HookKind,
    pub mask_types: Vec<TypeInfo>,
    pub call: Arc<dyn Fn(&Injector) -> Result<(), InjectionError> + Send + Sync>,
}

impl HookEntry {
    pub fn fire(&self, injector: &Injector) -> Result<(), InjectionError> {
        (self.call)(injector)
    }
}
