use std::any::TypeId;
use std::sync::Arc;

use crate::errors::InjectionError;
use crate::injection_context::InjectionContext;
use crate::reference_table::ReferenceTable;
use crate::registry::TypeInfo;
use crate::request::{Callable, Request};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Type-indexed lookup over a [`ReferenceTable`], plus reflective function
/// invocation (SPEC_FULL.md §4.2). Valid only once a container reaches
/// `Ready` - see [`crate::container::Container::injector`].
pub struct Injector<'a> {
    table: &'a ReferenceTable,
}

impl<'a> Injector<'a> {
    pub(crate) fn new(table: &'a ReferenceTable) -> Self {
        Self { table }
    }

    /// O(n) linear scan for `T`'s base type, per SPEC_FULL.md §4.2 and §9.
    /// `T: ?Sized` so this also serves `dyn Trait` interface lookups
    /// (SPEC_FULL.md §4.3 point 3) - see [`crate::module::erase`] for why
    /// the table's payload downcasts to `Arc<T>` rather than `T`.
    pub fn find<T: 'static + Send + Sync + ?Sized>(&self) -> Option<Arc<T>> {
        self.table
            .find(TypeId::of::<T>())
            .and_then(|inst| inst.downcast::<Arc<T>>().ok())
            .map(|arc_arc| (*arc_arc).clone())
    }

    pub fn get<T: 'static + Send + Sync + ?Sized>(&self) -> Result<Arc<T>, InjectionError> {
        let ctx = InjectionContext::new_root();
        self.get_with_context(&ctx)
    }

    pub(crate) fn get_with_context<T: 'static + Send + Sync + ?Sized>(
        &self,
        ctx: &InjectionContext,
    ) -> Result<Arc<T>, InjectionError> {
        self.find::<T>()
            .ok_or_else(|| InjectionError::missing::<T>(&ctx.push_resolve(TypeInfo::of::<T>())))
    }

    /// Invokes `f`, resolving every declared parameter via [`Request`]. See
    /// SPEC_FULL.md §4.2.1 - a function whose parameters cannot all satisfy
    /// `Request` fails to type-check rather than failing at run time.
    pub fn call0<F, Args, R>(&self, f: F) -> Result<R, InjectionError>
    where
        Args: Request,
        F: Callable<Args, R>,
    {
        let ctx = InjectionContext::new_root();
        let args = Args::resolve(self, &ctx)?;
        Ok(f.invoke(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_table::ReferenceTable;

    #[test]
    fn find_returns_none_when_absent() {
        let table = ReferenceTable::with_capacity(1);
        let injector = Injector::new(&table);
        assert!(injector.find::<String>().is_none());
    }

    #[test]
    fn get_reports_missing_dependency_error() {
        let table = ReferenceTable::with_capacity(1);
        let injector = Injector::new(&table);
        let err = injector.get::<String>().unwrap_err();
        assert!(matches!(err, InjectionError::MissingDependency(_)));
    }
}
