//! The compile-time (build-step, SPEC_FULL.md §1.1) artifact handed from the
//! scheduler to the executor: a linear list of [`Op`]s plus the bookkeeping
//! needed to size the reference table (spec.md §3 `Plan`).

use crate::registry::TypeInfo;

/// One step in the emitted plan: either initialize a `Dep` (by index into
/// the collector's `deps` vector) or fire a hook (by index into its
/// `init_hooks`/`deinit_hooks` vector). Executed in order at init time;
/// reversed at teardown (SPEC_FULL.md §4.7/§4.8).
#[derive(Clone, Copy, Debug)]
pub enum Op {
    Dep { index: usize },
    InitHook { index: usize },
}

/// `{ops, instance_count, storage_bytes}` per spec.md §3. `storage_bytes` is
/// retained only as a diagnostic (SPEC_FULL.md §3): no allocator in this
/// port ever allocates against it, since each service is its own `Arc`.
pub struct Plan {
    pub ops: Vec<Op>,
    pub instance_count: usize,
    pub storage_bytes: usize,
    /// `TypeInfo` of the `Dep` (or originating module, for hooks) at each op
    /// index, used by [`crate::container::Container::graph_description`]
    /// and by `ContainerError::Build`'s diagnostic.
    pub op_labels: Vec<TypeInfo>,
}

impl Plan {
    pub fn reserved_slots() -> usize {
        // Container handle, Injector, host allocator (SPEC_FULL.md §4.1/§4.7).
        3
    }

    pub fn table_capacity(&self) -> usize {
        self.instance_count + Self::reserved_slots()
    }
}
