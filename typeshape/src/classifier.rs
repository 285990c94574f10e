//! Type classifier: maps a raw shape to exactly one [SystemType].
//!
//! Resolution order matters and is fixed:
//!
//! 1. exact lookup by definition key (the open generic definition for generics)
//! 2. field-less enums classify as their underlying integer
//! 3. array detection (an element type that is not a pointer or reference)
//! 4. the enumerable fallback
//! 5. [SystemType::Unknown]
//!
//! A type that merely iterates never shadows an exact entry, so a custom
//! collection only classifies as [SystemType::List] if it is tabled as one.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::raw::{Introspect, RawType};
use crate::system_type::{Kind, SystemType};

static EXACT: Lazy<HashMap<&'static str, SystemType>> = Lazy::new(|| {
    use SystemType::*;

    HashMap::from([
        ("()", Unit),
        ("bool", Bool),
        ("char", Char),
        ("i8", I8),
        ("i16", I16),
        ("i32", I32),
        ("i64", I64),
        ("i128", I128),
        ("isize", Isize),
        ("u8", U8),
        ("u16", U16),
        ("u32", U32),
        ("u64", U64),
        ("u128", U128),
        ("usize", Usize),
        ("f32", F32),
        ("f64", F64),
        ("Decimal", Decimal),
        ("String", String),
        ("&str", Str),
        ("Uuid", Uuid),
        ("Url", Url),
        ("PathBuf", Path),
        ("IpAddr", IpAddress),
        ("DateTime<Utc>", DateTime),
        ("OffsetDateTime", DateTimeOffset),
        ("NaiveDateTime", NaiveDateTime),
        ("NaiveDate", Date),
        ("NaiveTime", Time),
        ("Duration", Duration),
        ("SystemTime", SystemTime),
        ("Option", Nullable),
        ("Box", Boxed),
        ("BoxFuture", AsyncResult),
        ("Range", Range),
        ("RangeInclusive", RangeInclusive),
        ("KeyValuePair", KeyValuePair),
        ("Vec", List),
        ("VecDeque", Deque),
        ("LinkedList", LinkedList),
        ("BinaryHeap", PriorityQueue),
        ("HashSet", HashSet),
        ("BTreeSet", SortedSet),
        ("IndexSet", OrderedSet),
        ("HashMap", Dictionary),
        ("BTreeMap", SortedDictionary),
        ("IndexMap", OrderedDictionary),
        ("Arc<[T]>", ImmutableArray),
        ("Arc<Vec>", ImmutableList),
        ("Arc<str>", ImmutableString),
        ("Arc<HashMap>", ImmutableDictionary),
        ("Arc<HashSet>", ImmutableSet),
        ("&[T]", ReadOnlyCollection),
        ("Cow<[T]>", ReadOnlyList),
        ("DashMap", ConcurrentDictionary),
        ("DashSet", ConcurrentSet),
    ])
});

/// Classify a raw shape
pub fn classify(raw: &RawType) -> SystemType {
    if let Some(system_type) = EXACT.get(raw.definition) {
        return *system_type;
    }

    if raw.kind == Kind::Enum {
        if let Some(underlying) = raw.underlying {
            return classify(&underlying.raw());
        }
    }

    if raw.element.is_some() && !raw.is_pointer && !raw.is_by_ref {
        return SystemType::Array;
    }

    if raw.enumerable {
        return SystemType::Enumerable;
    }

    SystemType::Unknown
}

/// Classify `T` without building a descriptor
pub fn classify_type<T: Introspect>() -> SystemType {
    classify(&T::introspect())
}

/// Definition keys with an exact classification
pub fn tabled_definitions() -> impl Iterator<Item = (&'static str, SystemType)> {
    EXACT.iter().map(|(k, v)| (*k, *v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::BoxFuture;
    use crate::enclosed::KeyValuePair;
    use crate::raw::TypeLink;
    use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
    use std::sync::Arc;

    struct Playlist;

    impl Introspect for Playlist {
        fn introspect() -> RawType {
            RawType::new::<Self>("Playlist", "tests::Playlist", Kind::Class).enumerable()
        }
    }

    #[repr(u8)]
    #[allow(dead_code)]
    enum Quality {
        Low = 1,
        High = 2,
    }

    impl Introspect for Quality {
        fn introspect() -> RawType {
            let mut raw = RawType::new::<Self>("Quality", "tests::Quality", Kind::Enum);
            raw.underlying = Some(TypeLink::of::<u8>());
            raw
        }
    }

    #[test]
    fn test_primitives() {
        assert_eq!(classify_type::<i32>(), SystemType::I32);
        assert_eq!(classify_type::<bool>(), SystemType::Bool);
        assert_eq!(classify_type::<String>(), SystemType::String);
        assert_eq!(classify_type::<uuid::Uuid>(), SystemType::Uuid);
        assert_eq!(classify_type::<()>(), SystemType::Unit);
    }

    #[test]
    fn test_generic_definitions_ignore_arguments() {
        assert_eq!(classify_type::<Vec<u8>>(), SystemType::List);
        assert_eq!(classify_type::<Vec<Vec<String>>>(), SystemType::List);
        assert_eq!(classify_type::<Option<String>>(), SystemType::Nullable);
        assert_eq!(classify_type::<HashMap<String, i32>>(), SystemType::Dictionary);
        assert_eq!(classify_type::<BTreeMap<String, i32>>(), SystemType::SortedDictionary);
        assert_eq!(classify_type::<HashSet<u32>>(), SystemType::HashSet);
        assert_eq!(classify_type::<VecDeque<u32>>(), SystemType::Deque);
        assert_eq!(classify_type::<BoxFuture<u32>>(), SystemType::AsyncResult);
        assert_eq!(classify_type::<KeyValuePair<u8, u8>>(), SystemType::KeyValuePair);
    }

    #[test]
    fn test_immutable_and_concurrent_shapes() {
        assert_eq!(classify_type::<Arc<[u8]>>(), SystemType::ImmutableArray);
        assert_eq!(classify_type::<Arc<str>>(), SystemType::ImmutableString);
        assert_eq!(
            classify_type::<dashmap::DashMap<String, u8>>(),
            SystemType::ConcurrentDictionary
        );
        assert!(classify_type::<Arc<HashMap<String, u8>>>().is_immutable());
    }

    #[test]
    fn test_enum_classifies_as_underlying() {
        assert_eq!(classify_type::<Quality>(), SystemType::U8);
    }

    #[test]
    fn test_arrays_detected_structurally() {
        assert_eq!(classify_type::<[u8; 16]>(), SystemType::Array);
        // Slices are tabled, so the exact entry wins over array detection
        assert_eq!(classify_type::<&'static [u8]>(), SystemType::ReadOnlyCollection);
    }

    #[test]
    fn test_pointers_are_not_arrays() {
        assert_eq!(classify_type::<*const u8>(), SystemType::Unknown);
    }

    #[test]
    fn test_enumerable_fallback_does_not_shadow_exact() {
        assert_eq!(classify_type::<Playlist>(), SystemType::Enumerable);
        assert_eq!(classify_type::<Vec<u8>>(), SystemType::List);
    }

    #[test]
    fn test_unknown_default() {
        assert_eq!(classify_type::<fn(i32) -> bool>(), SystemType::Unknown);
    }

    #[test]
    fn test_every_tabled_variant_is_distinct_from_fallbacks() {
        for (definition, st) in tabled_definitions() {
            assert_ne!(st, SystemType::Unknown, "{definition} maps to Unknown");
            assert_ne!(st, SystemType::Enumerable, "{definition} maps to Enumerable");
            assert_ne!(st, SystemType::Array, "{definition} maps to Array");
        }
    }
}
