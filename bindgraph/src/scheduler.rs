//! Dependency-mask builder + topological scheduler (SPEC_FULL.md §4.6).
//!
//! Turns the flat `Dep`/hook lists the [`crate::collector::Collector`]
//! accumulated into a [`crate::plan::Plan`]: a mask per entry, then a
//! deterministic (lowest-index-first) topological walk that either emits a
//! full [`crate::plan::Op`] sequence or reports a cycle.

use std::collections::HashMap;

use crate::collector::DepEntry;
use crate::container::is_builtin_type;
use crate::errors::ContainerError;
use crate::hooks::HookEntry;
use crate::mask::DepMask;
use crate::plan::{Op, Plan};
use crate::registry::TypeInfo;

/// Builds a [`DepMask`] from a provider's declared dependency types, looking
/// each up by base type in `index`. Built-in types (container handle,
/// injector, allocator) and any type this build never registered are
/// skipped - the former are always-ready per SPEC_FULL.md §4.1, the latter
/// surfaces as a runtime `MissingDependency` rather than a build-time error,
/// since Rust cannot statically enumerate "every type the graph will ever
/// need" the way a comptime-reflective host language can (see DESIGN.md).
pub(crate) fn mask_from_types(
    types: &[TypeInfo],
    index: &HashMap<std::any::TypeId, usize>,
) -> Result<DepMask, ContainerError> {
    let mut mask = DepMask::new();
    for t in types {
        if is_builtin_type(t.id) {
            continue;
        }
        if let Some(&idx) = index.get(&t.id) {
            mask = mask.set(idx).ok_or(ContainerError::MaskOverflow {
                needed: idx + 1,
                ceiling: crate::mask::MASK_HARD_CEILING,
            })?;
        }
    }
    Ok(mask)
}

pub fn build_plan(
    deps: &[DepEntry],
    init_hooks: &[HookEntry],
    deinit_hooks: &[HookEntry],
) -> Result<(Plan, Vec<DepMask>, Vec<DepMask>), ContainerError> {
    let index: HashMap<_, _> = deps
        .iter()
        .enumerate()
        .map(|(i, d)| (d.type_info.id, i))
        .collect();

    let dep_masks: Vec<DepMask> = deps
        .iter()
        .map(|d| mask_from_types(&d.provider.dependencies(), &index))
        .collect::<Result<_, _>>()?;

    let init_hook_masks: Vec<DepMask> = init_hooks
        .iter()
        .map(|h| mask_from_types(&h.mask_types, &index))
        .collect::<Result<_, _>>()?;

    let deinit_hook_masks: Vec<DepMask> = deinit_hooks
        .iter()
        .map(|h| mask_from_types(&h.mask_types, &index))
        .collect::<Result<_, _>>()?;

    let mut ready = DepMask::new();
    let mut dep_done = vec![false; deps.len()];
    let mut hook_done = vec![false; init_hooks.len()];
    let mut ops = Vec::with_capacity(deps.len() + init_hooks.len());
    let mut op_labels = Vec::with_capacity(deps.len() + init_hooks.len());
    let mut storage_bytes = 0usize;

    loop {
        let mut progressed = false;

        if let Some(next) = (0..deps.len())
            .find(|&i| !dep_done[i] && dep_masks[i].is_subset_of(&ready))
        {
            dep_done[next] = true;
            ready = ready.set(next).ok_or(ContainerError::MaskOverflow {
                needed: next + 1,
                ceiling: crate::mask::MASK_HARD_CEILING,
            })?;
            storage_bytes += deps[next].size_hint;
            ops.push(Op::Dep { index: next });
            op_labels.push(deps[next].type_info);
            progressed = true;
        }

        for i in 0..init_hooks.len() {
            if !hook_done[i] && init_hook_masks[i].is_subset_of(&ready) {
                hook_done[i] = true;
                ops.push(Op::InitHook { index: i });
                op_labels.push(TypeInfo::of::<()>());
                progressed = true;
            }
        }

        if dep_done.iter().all(|&d| d) && hook_done.iter().all(|&d| d) {
            break;
        }

        if !progressed {
            let unresolved: Vec<TypeInfo> = (0..deps.len())
                .filter(|&i| !dep_done[i])
                .map(|i| deps[i].type_info)
                .collect();
            return Err(ContainerError::Cycle(unresolved));
        }
    }

    let plan = Plan {
        instance_count: deps.len(),
        storage_bytes,
        ops,
        op_labels,
    };

    Ok((plan, dep_masks, deinit_hook_masks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Collector;
    use crate::module::Provider;

    struct A;
    struct B;

    #[test]
    fn schedules_dependency_before_dependent() {
        let mut c = Collector::new();
        c.add::<A>(Provider::value(1u32));
        c.add::<B>(Provider::factory::<B, _, (std::sync::Arc<u32>,)>(|_n| B));
        let (deps, init_hooks, deinit_hooks, errors) = c.into_parts();
        assert!(errors.is_empty());
        let (plan, ..) = build_plan(&deps, &init_hooks, &deinit_hooks).unwrap();
        assert_eq!(plan.ops.len(), 2);
    }

    #[test]
    fn cycle_is_reported() {
        let mut c = Collector::new();
        c.add::<A>(Provider::factory::<A, _, (std::sync::Arc<B>,)>(|_b| A));
        c.add::<B>(Provider::factory::<B, _, (std::sync::Arc<A>,)>(|_a| B));
        let (deps, init_hooks, deinit_hooks, _) = c.into_parts();
        let err = build_plan(&deps, &init_hooks, &deinit_hooks).unwrap_err();
        assert!(matches!(err, ContainerError::Cycle(_)));
    }
}
