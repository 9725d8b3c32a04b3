use std::any::TypeId;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Identity of a type known to the container: a stable [`TypeId`] plus a
/// human-readable name, used throughout diagnostics and the injection stack.
///
/// Two services are considered the same dependency if their [`TypeInfo::id`]
/// matches, which is always computed against the *base type* rather than the
/// raw declared field type - see the note below on how that stripping
/// happens in this port.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

// The "strip one pointer" rule (host spec: base(T) removes one leading
// indirection) has no run-time representation in safe Rust - `TypeId` cannot
// tell you what an `Arc<T>` wraps. It is instead resolved once, statically,
// by `bindgraph-macros` from a field's `syn::Type` at macro-expansion time
// (`bindgraph_macros::types::strip_smart_ptr`): a field declared `Arc<Foo>`
// contributes the base service `Foo`; a field declared `Foo` contributes
// `Foo` directly. By the time code in this crate runs, every `Dep` already
// carries its resolved base `TypeInfo` - see `module::FieldSpec`.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_info_identifies_same_type() {
        let a = TypeInfo::of::<String>();
        let b = TypeInfo::of::<String>();
        assert_eq!(a, b);
    }

    #[test]
    fn type_info_distinguishes_types() {
        let a = TypeInfo::of::<String>();
        let b = TypeInfo::of::<i32>();
        assert_ne!(a, b);
    }
}
