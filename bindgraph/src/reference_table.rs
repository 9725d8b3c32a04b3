use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::errors::{InjectionError, RefTableOverflowError};
use crate::registry::TypeInfo;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Runtime analogue of the host spec's "contiguous storage region with
/// byte-offset references" (SPEC_FULL.md §3, §1.1): a flat, append-only list
/// mapping a service's [`TypeId`] to a type-erased, reference-counted handle
/// on it. Each service still occupies exactly one reserved slot, computed by
/// the planner before the table is built - this type never grows past the
/// capacity it was constructed with.
pub struct ReferenceTable {
    entries: Vec<Option<(TypeInfo, Arc<dyn Any + Send + Sync>)>>,
    published: usize,
}

impl ReferenceTable {
    /// Reserves `capacity` slots up front. `capacity` is always
    /// `instance_count + 3` (container handle, injector, host allocator -
    /// the three built-ins reserved by SPEC_FULL.md §4.1/§4.7).
    pub fn with_capacity(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, || None);
        Self {
            entries,
            published: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Publishes a reference into a specific reserved slot. Slots may be
    /// published out of order (built-ins are published before any op runs;
    /// `field_ref` providers publish after their owner), but never twice.
    pub fn publish(
        &mut self,
        index: usize,
        type_info: TypeInfo,
        instance: Arc<dyn Any + Send + Sync>,
    ) -> Result<(), InjectionError> {
        if index >= self.entries.len() {
            return Err(InjectionError::RefTableOverflow(RefTableOverflowError {
                capacity: self.entries.len(),
                attempted_index: index,
            }));
        }
        if self.entries[index].is_none() {
            self.published += 1;
        }
        self.entries[index] = Some((type_info, instance));
        Ok(())
    }

    /// Direct slot access by index, used by the executor during teardown
    /// (it already knows a `Dep`'s slot from the plan, with no need to scan
    /// by type id).
    pub fn slot(&self, index: usize) -> Option<&(TypeInfo, Arc<dyn Any + Send + Sync>)> {
        self.entries.get(index).and_then(Option::as_ref)
    }

    pub fn unpublish(&mut self, index: usize) {
        if self.entries.get(index).is_some_and(Option::is_some) {
            self.entries[index] = None;
            self.published -= 1;
        }
    }

    pub fn published_count(&self) -> usize {
        self.published
    }

    /// Linear scan for the first slot whose type id matches `T`. Kept as a
    /// plain `O(n)` scan rather than a `HashMap` index (SPEC_FULL.md §9: the
    /// target service count is tens to low hundreds, where a scan over a
    /// contiguous `Vec` outperforms hashing in practice and keeps the data
    /// structure a single flat allocation, matching the host spec's "one
    /// contiguous storage region" framing as closely as safe Rust allows).
    pub fn find(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries
            .iter()
            .flatten()
            .find(|(info, _)| info.id == type_id)
            .map(|(_, inst)| inst.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeInfo, &Arc<dyn Any + Send + Sync>)> {
        self.entries
            .iter()
            .flatten()
            .map(|(info, inst)| (*info, inst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_then_find_round_trips() {
        let mut table = ReferenceTable::with_capacity(4);
        table
            .publish(0, TypeInfo::of::<String>(), Arc::new("hi".to_owned()))
            .unwrap();

        let found = table.find(TypeId::of::<String>()).unwrap();
        assert_eq!(found.downcast_ref::<String>().unwrap(), "hi");
    }

    #[test]
    fn find_missing_returns_none() {
        let table = ReferenceTable::with_capacity(2);
        assert!(table.find(TypeId::of::<String>()).is_none());
    }

    #[test]
    fn publish_past_capacity_overflows() {
        let mut table = ReferenceTable::with_capacity(1);
        let err = table
            .publish(5, TypeInfo::of::<u8>(), Arc::new(0u8))
            .unwrap_err();
        assert!(matches!(err, InjectionError::RefTableOverflow(_)));
    }

    #[test]
    fn unpublish_decrements_published_count() {
        let mut table = ReferenceTable::with_capacity(2);
        table.publish(0, TypeInfo::of::<u8>(), Arc::new(1u8)).unwrap();
        assert_eq!(table.published_count(), 1);
        table.unpublish(0);
        assert_eq!(table.published_count(), 0);
        assert!(table.find(TypeId::of::<u8>()).is_none());
    }
}
