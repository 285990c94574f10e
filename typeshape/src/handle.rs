//! Opaque identifiers for types and members.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable identifier for a type, usable as a map key.
///
/// Equality and hashing use the [TypeId] only; the path is carried for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeHandle {
    id: TypeId,
    path: &'static str,
}

impl TypeHandle {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified path as reported by the compiler. Diagnostic only.
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Whether `value` is exactly an instance of this type
    pub fn is_type_of(&self, value: &dyn Any) -> bool {
        value.type_id() == self.id
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.path)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

/// Which member table a [MemberHandle] points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Constructor,
    Event,
}

/// Identifier for one member of a type: declaring type, table, declaration ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberHandle {
    pub declaring: TypeHandle,
    pub kind: MemberKind,
    pub ordinal: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_handles_compare_by_type_id() {
        assert_eq!(TypeHandle::of::<String>(), TypeHandle::of::<String>());
        assert_ne!(TypeHandle::of::<String>(), TypeHandle::of::<&'static str>());

        let set: HashSet<TypeHandle> = [
            TypeHandle::of::<i32>(),
            TypeHandle::of::<i32>(),
            TypeHandle::of::<Vec<i32>>(),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_is_type_of() {
        let value: Box<dyn Any + Send> = Box::new(42u8);
        assert!(TypeHandle::of::<u8>().is_type_of(&*value));
        assert!(!TypeHandle::of::<u16>().is_type_of(&*value));
    }
}
