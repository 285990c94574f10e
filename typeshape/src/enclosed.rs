//! Enclosed-type resolution: the logical contained type of a wrapper shape.

use typeshape_macros::Introspect;

use crate::raw::{RawType, TypeLink};
use crate::system_type::SystemType;

/// Uniform element shape for every dictionary variant
#[derive(Introspect, Debug, Clone, PartialEq, Eq, Hash)]
#[shape(definition = "KeyValuePair")]
pub struct KeyValuePair<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> KeyValuePair<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

impl<K, V> From<(K, V)> for KeyValuePair<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self { key, value }
    }
}

/// Resolve the enclosed type of `raw`, in priority order:
///
/// 1. element type (arrays, slices, pointers, references)
/// 2. the synthetic [KeyValuePair] for dictionary shapes
/// 3. the single generic argument
/// 4. nothing
///
/// Purely structural: tags are never consulted.
pub fn resolve_enclosed_type(raw: &RawType, system_type: SystemType) -> Option<TypeLink> {
    if let Some(element) = raw.element {
        return Some(element);
    }

    if system_type.is_dictionary() {
        if let Some(pair) = raw.key_value_pair {
            return Some(pair);
        }
    }

    match raw.generic_args.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::handle::TypeHandle;
    use crate::raw::Introspect;
    use std::collections::{BTreeMap, HashMap};

    fn enclosed_of<T: Introspect>() -> Option<TypeHandle> {
        let raw = T::introspect();
        resolve_enclosed_type(&raw, classify(&raw)).map(|l| l.handle)
    }

    #[test]
    fn test_array_yields_element() {
        assert_eq!(enclosed_of::<[u16; 3]>(), Some(TypeHandle::of::<u16>()));
        assert_eq!(enclosed_of::<&'static [String]>(), Some(TypeHandle::of::<String>()));
    }

    #[test]
    fn test_nullable_yields_payload() {
        assert_eq!(enclosed_of::<Option<i64>>(), Some(TypeHandle::of::<i64>()));
    }

    #[test]
    fn test_single_generic_argument() {
        assert_eq!(enclosed_of::<Vec<String>>(), Some(TypeHandle::of::<String>()));
    }

    #[test]
    fn test_dictionaries_yield_pair_shape() {
        assert_eq!(
            enclosed_of::<HashMap<String, i32>>(),
            Some(TypeHandle::of::<KeyValuePair<String, i32>>())
        );
        assert_eq!(
            enclosed_of::<BTreeMap<u8, bool>>(),
            Some(TypeHandle::of::<KeyValuePair<u8, bool>>())
        );
    }

    #[test]
    fn test_plain_types_have_none() {
        assert_eq!(enclosed_of::<String>(), None);
        assert_eq!(enclosed_of::<i32>(), None);
        assert_eq!(enclosed_of::<KeyValuePair<String, i32>>(), None);
    }

    #[test]
    fn test_pair_shape_fields() {
        let raw = KeyValuePair::<String, i32>::introspect();
        assert_eq!(raw.name, "KeyValuePair<String, i32>");
        let names: Vec<_> = raw.members.fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["key", "value"]);
    }
}
