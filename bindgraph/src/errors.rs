use thiserror::Error;

use crate::injection_context::{InjectionContext, InjectionStack};
use crate::registry::TypeInfo;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Runtime errors - raised by the injector and the executor once a container
// is `Ready` (or mid-`Initializing`). These are ordinary `Result`s: the
// resolver/scheduler already guaranteed at build time that every declared
// dependency *can* be satisfied, so reaching one of these at run time means
// either a caller asked for a type nobody registered, or a user-supplied
// factory/initializer/hook returned an error of its own.
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug, Clone)]
pub enum InjectionError {
    #[error(transparent)]
    MissingDependency(MissingDependencyError),
    #[error(transparent)]
    RefTableOverflow(RefTableOverflowError),
}

impl InjectionError {
    pub fn missing<T: 'static + ?Sized>(ctx: &InjectionContext) -> Self {
        Self::MissingDependency(MissingDependencyError {
            dep_type: TypeInfo::of::<T>(),
            injection_stack: ctx.to_stack(),
        })
    }

    /// Same as [`Self::missing`], for call sites that only have a runtime
    /// [`TypeInfo`] (e.g. a `field_ref`'s owner type) rather than a concrete
    /// `T` to reflect at the call site.
    pub fn missing_type(dep_type: TypeInfo, ctx: &InjectionContext) -> Self {
        Self::MissingDependency(MissingDependencyError {
            dep_type,
            injection_stack: ctx.to_stack(),
        })
    }
}

#[derive(Error, Debug, Clone)]
pub struct MissingDependencyError {
    pub dep_type: TypeInfo,
    pub injection_stack: InjectionStack,
}

impl std::fmt::Display for MissingDependencyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "missing dependency: {}", self.dep_type.name)?;
        write!(f, "injection stack:\n{}", self.injection_stack)
    }
}

/// Signals a planner bug: the reference table was sized to `instance_count +
/// 3` reserved slots (container handle, injector, host allocator - see
/// SPEC_FULL.md §4.7) and something tried to publish past that. Should be
/// unreachable given a correctly computed [`crate::plan::Plan`]; kept as a
/// typed error rather than a bare `panic!` only so tests can assert on it.
#[derive(Error, Debug, Clone)]
pub struct RefTableOverflowError {
    pub capacity: usize,
    pub attempted_index: usize,
}

impl std::fmt::Display for RefTableOverflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "reference table overflow: capacity {}, attempted index {}",
            self.capacity, self.attempted_index
        )
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Build-time diagnostics - everything the collector / resolver / scheduler /
// executor can detect while `ContainerBuilder::build()` is running. This is
// this port's rendering of the host spec's "compile-time" diagnostics (see
// SPEC_FULL.md §1.1): genuinely per-field shape errors are macro-time
// `panic!`s raised by `bindgraph-macros` (and therefore never reach this
// enum), but anything that needs the *whole* module list - duplicates,
// cycles, unresolved overrides - can only be known once `build()` runs, so
// it is reported here instead.
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug, Clone)]
pub enum ContainerError {
    #[error("duplicate service: {0}")]
    DuplicateService(TypeInfo),

    #[error("override for unregistered service: {0}")]
    UnresolvedOverride(TypeInfo),

    #[error("dependency cycle detected, unresolved: {}", join_type_names(.0))]
    Cycle(Vec<TypeInfo>),

    #[error("{0} cannot use the `auto` provider: not a struct bindgraph-macros can autowire")]
    AutoNonStruct(TypeInfo),

    #[error("add_mock::<{0}>() called outside a test build (enable `cfg(test)` or the `test-doubles` feature)")]
    MockOutsideTests(TypeInfo),

    #[error(
        "dependency mask overflow: graph needs {needed} bits, hard ceiling is {ceiling}"
    )]
    MaskOverflow { needed: usize, ceiling: usize },

    #[error("build failed while running op #{op_index} ({op_type}): {source}")]
    Build {
        op_index: usize,
        op_type: TypeInfo,
        #[source]
        source: InjectionError,
    },
}

fn join_type_names(types: &[TypeInfo]) -> String {
    types
        .iter()
        .map(|t| t.name)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_display_includes_type_name() {
        let ctx = InjectionContext::new_root();
        let err = InjectionError::missing::<String>(&ctx);
        assert!(err.to_string().contains("String"));
    }

    #[test]
    fn cycle_error_joins_type_names_in_order() {
        let err = ContainerError::Cycle(vec![TypeInfo::of::<u32>(), TypeInfo::of::<u64>()]);
        let msg = err.to_string();
        assert!(msg.contains("u32"));
        assert!(msg.contains("u64"));
    }
}
