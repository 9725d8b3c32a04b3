//! Plan executor (SPEC_FULL.md §4.7) + teardown policy (§4.8): runs a
//! [`crate::plan::Plan`]'s ops in order, publishing each service to the
//! reference table, and tears everything back down in strict reverse.

use std::collections::HashMap;

use crate::collector::DepEntry;
use crate::container::Container;
use crate::errors::{ContainerError, InjectionError};
use crate::hooks::HookEntry;
use crate::injection_context::InjectionContext;
use crate::injector::Injector;
use crate::mask::DepMask;
use crate::module::{AnyArc, Provider};
use crate::plan::{Op, Plan};
use crate::reference_table::ReferenceTable;

fn produce(dep: &DepEntry, table: &ReferenceTable) -> Result<AnyArc, InjectionError> {
    match &dep.provider {
        Provider::Value(v) => Ok(v.clone()),
        Provider::Autowire { make, .. } | Provider::Make { make, .. } => {
            let injector = Injector::new(table);
            make(&injector)
        }
        Provider::FieldRef(spec) => {
            let ctx = InjectionContext::new_root();
            let owner = table
                .find(spec.owner.id)
                .ok_or_else(|| InjectionError::missing_type(spec.owner, &ctx))?;
            (spec.accessor)(&owner).ok_or_else(|| InjectionError::missing_type(spec.owner, &ctx))
        }
    }
}

/// Runs every op in order (SPEC_FULL.md §4.7). On the first failure, records
/// `pc` and unwinds ops `pc-1..=0` (spec.md §4.7/§7) before returning
/// `ContainerError::Build`.
pub fn run(
    plan: &Plan,
    deps: Vec<DepEntry>,
    init_hooks: &[HookEntry],
    deinit_hooks: Vec<HookEntry>,
    mut table: ReferenceTable,
) -> Result<Container, ContainerError> {
    let mut initialized: Vec<usize> = Vec::new();

    for (pc, op) in plan.ops.iter().enumerate() {
        let outcome = match op {
            Op::Dep { index } => run_dep_op(*index, &deps, &mut table).map(|()| {
                initialized.push(*index);
            }),
            Op::InitHook { index } => {
                let injector = Injector::new(&table);
                #[cfg(feature = "logging")]
                tracing::debug!(hook = index, "running init hook");
                init_hooks[*index].fire(&injector)
            }
        };

        if let Err(source) = outcome {
            teardown(&mut table, &deps, &initialized, &deinit_hooks);
            return Err(ContainerError::Build {
                op_index: pc,
                op_type: plan.op_labels[pc],
                source,
            });
        }
    }

    Ok(Container::new(table, deps, deinit_hooks, initialized))
}

fn run_dep_op(
    index: usize,
    deps: &[DepEntry],
    table: &mut ReferenceTable,
) -> Result<(), InjectionError> {
    let dep = &deps[index];
    #[cfg(feature = "logging")]
    tracing::debug!(dep = %dep.type_info, "initializing");
    let instance = produce(dep, table)?;
    table.publish(index + Plan::reserved_slots(), dep.type_info, instance)
}

/// Tears down a set of already-initialized deps, in reverse of the order
/// they were initialized in (spec.md §3 Lifecycle, SPEC_FULL.md §4.8). Used
/// both by [`crate::container::Container::destroy`] (the full set) and by
/// [`run`]'s partial-failure unwind (a prefix of it).
pub fn teardown(
    table: &mut ReferenceTable,
    deps: &[DepEntry],
    initialized_in_order: &[usize],
    deinit_hooks: &[HookEntry],
) {
    let index: HashMap<_, _> = deps
        .iter()
        .enumerate()
        .map(|(i, d)| (d.type_info.id, i))
        .collect();
    let hook_masks: Vec<DepMask> = deinit_hooks
        .iter()
        .map(|h| {
            crate::scheduler::mask_from_types(&h.mask_types, &index).unwrap_or_else(|_| DepMask::new())
        })
        .collect();
    let mut fired = vec![false; deinit_hooks.len()];

    let mut remaining = initialized_in_order.to_vec();

    for &dep_index in initialized_in_order.iter().rev() {
        remaining.pop(); // drop dep_index itself - it's about to be torn down.
        let alive_after = DepMask::from_indices(remaining.iter().copied()).unwrap_or_else(DepMask::new);

        fire_hooks_broken_by_removal(table, deinit_hooks, &hook_masks, &mut fired, &alive_after);

        let dep = &deps[dep_index];
        if let Some(deinit) = dep.provider.deinit() {
            let slot = dep_index + Plan::reserved_slots();
            if let Some((_, inst)) = table.slot(slot) {
                let inst = inst.clone();
                let injector = Injector::new(table);
                #[cfg(feature = "logging")]
                tracing::debug!(dep = %dep.type_info, "running deinit");
                deinit(&inst, &injector);
            }
        }
        table.unpublish(dep_index + Plan::reserved_slots());
    }

    // Anything still unfired (empty-mask hooks, or hooks whose deps were
    // never actually initialized during a partial unwind) flushes last.
    for (i, hook) in deinit_hooks.iter().enumerate() {
        if fired[i] {
            continue;
        }
        run_one_hook(table, hook);
    }
}

/// Fires every not-yet-fired hook whose mask is satisfied right now but
/// would stop being satisfied once the next dep in the reverse walk is
/// removed - i.e. run it *before* that dependency is destroyed (spec.md §3
/// Lifecycle: "deinit hooks fire before any service they reference is
/// destroyed").
fn fire_hooks_broken_by_removal(
    table: &mut ReferenceTable,
    deinit_hooks: &[HookEntry],
    hook_masks: &[DepMask],
    fired: &mut [bool],
    alive_after_removal: &DepMask,
) {
    for (i, hook) in deinit_hooks.iter().enumerate() {
        if fired[i] {
            continue;
        }
        if !hook_masks[i].is_subset_of(alive_after_removal) {
            fired[i] = true;
            run_one_hook(table, hook);
        }
    }
}

fn run_one_hook(table: &ReferenceTable, hook: &HookEntry) {
    let injector = Injector::new(table);
    #[cfg(feature = "logging")]
    tracing::debug!("running deinit hook");
    if let Err(_err) = hook.fire(&injector) {
        #[cfg(feature = "logging")]
        tracing::warn!(error = %_err, "deinit hook failed, swallowing");
    }
}
