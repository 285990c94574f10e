//! Introspection facility: the raw shape of a type as declared in source.
//!
//! [Introspect] is implemented by `#[derive(Introspect)]` and
//! `#[introspect_members]` from `typeshape-macros`, and by hand for the
//! standard shapes in [builtin](crate::builtin). It plays the part a
//! reflection API plays in other runtimes: it enumerates members and hands
//! out direct-call thunks, but performs no validation, conversion or
//! caching. That is the job of the [synthesizer](crate::accessor) and the
//! [cache](crate::cache).

use std::any::Any;

use crate::handle::TypeHandle;
use crate::system_type::{Kind, Visibility};
use crate::tags::Tags;
use crate::value::{Coercion, Value};

/// Raw source-level shape of a type.
///
/// Implementations must be deterministic: every call returns the same shape.
pub trait Introspect: 'static {
    fn introspect() -> RawType;

    /// Convert a value of some other type into `Self`. Only consulted when the
    /// value is not already exactly `Self`.
    fn coerce(value: Value) -> Result<Value, Value> {
        Err(value)
    }

    /// A fresh default instance, for types that have one
    fn default_value() -> Option<Value> {
        None
    }
}

/// Members declared in an inherent `impl` block.
///
/// Implemented by `#[introspect_members]`; merged into the type's shape when
/// the type is derived with `#[shape(impl_members)]`.
pub trait ImplMembers {
    fn impl_members() -> RawMembers;
}

/// A lazily-resolved reference to another type's shape
#[derive(Clone, Copy)]
pub struct TypeLink {
    pub handle: TypeHandle,
    pub introspect: fn() -> RawType,
    pub coerce: Coercion,
}

impl TypeLink {
    pub fn of<T: Introspect>() -> Self {
        Self {
            handle: TypeHandle::of::<T>(),
            introspect: T::introspect,
            coerce: T::coerce,
        }
    }

    pub fn raw(&self) -> RawType {
        (self.introspect)()
    }

    /// Display name of the linked type
    pub fn name(&self) -> String {
        self.raw().name
    }
}

impl std::fmt::Debug for TypeLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TypeLink").field(&self.handle).finish()
    }
}

/// Failure reported by a generated thunk. The synthesizer translates these
/// into [ShapeError](crate::ShapeError)s naming the member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCallError {
    /// The instance was not of the declaring type
    Receiver,
    /// The argument at this position was not of the parameter type
    Argument(usize),
    /// Wrong number of arguments
    Arity { expected: usize, found: usize },
    /// A property setter refused the value
    Rejected(String),
}

#[derive(Clone, Copy)]
pub enum RawGet {
    Instance(fn(&dyn Any) -> Option<Value>),
    Static(fn() -> Value),
}

#[derive(Clone, Copy)]
pub enum RawSet {
    Instance(fn(&mut dyn Any, Value) -> Result<(), RawCallError>),
    Static(fn(Value) -> Result<(), RawCallError>),
}

#[derive(Clone, Copy)]
pub enum RawCall {
    Instance(fn(&mut dyn Any, Vec<Value>) -> Result<Value, RawCallError>),
    Static(fn(Vec<Value>) -> Result<Value, RawCallError>),
}

impl RawCall {
    pub fn is_static(&self) -> bool {
        matches!(self, RawCall::Static(_))
    }
}

pub struct RawField {
    pub name: &'static str,
    pub ordinal: u32,
    pub visibility: Visibility,
    pub tags: Tags,
    pub ty: TypeLink,
    pub is_static: bool,
    /// Compile-time constant (associated const or enum variant)
    pub is_literal: bool,
    /// Init-only: settable at construction, read-only afterwards
    pub is_readonly: bool,
    pub get: RawGet,
    pub set: Option<RawSet>,
}

pub struct RawProperty {
    pub name: &'static str,
    pub ordinal: u32,
    pub visibility: Visibility,
    pub tags: Tags,
    pub ty: TypeLink,
    pub is_static: bool,
    pub get: Option<RawGet>,
    pub set: Option<RawSet>,
}

pub struct RawParameter {
    pub name: &'static str,
    pub position: u32,
    pub tags: Tags,
    pub ty: TypeLink,
    pub default: Option<fn() -> Value>,
    pub is_optional: bool,
    /// `&mut T`: written through by the callee
    pub is_out: bool,
    /// `&T` or `&mut T`
    pub is_by_ref: bool,
}

pub struct RawReturn {
    pub ty: TypeLink,
    pub tags: Tags,
    pub is_by_ref: bool,
}

pub struct RawMethod {
    pub name: &'static str,
    pub ordinal: u32,
    pub visibility: Visibility,
    pub tags: Tags,
    pub is_static: bool,
    /// Takes `self` by value
    pub consumes_receiver: bool,
    pub params: Vec<RawParameter>,
    pub ret: RawReturn,
    /// Absent when no direct call could be generated
    pub call: Option<RawCall>,
}

pub struct RawConstructor {
    pub name: &'static str,
    pub ordinal: u32,
    pub visibility: Visibility,
    pub tags: Tags,
    pub params: Vec<RawParameter>,
    pub call: Option<fn(Vec<Value>) -> Result<Value, RawCallError>>,
}

pub struct RawEvent {
    pub name: &'static str,
    pub ordinal: u32,
    pub visibility: Visibility,
    pub tags: Tags,
    pub handler: TypeLink,
}

#[derive(Default)]
pub struct RawMembers {
    pub fields: Vec<RawField>,
    pub properties: Vec<RawProperty>,
    pub methods: Vec<RawMethod>,
    pub constructors: Vec<RawConstructor>,
    pub events: Vec<RawEvent>,
}

impl RawMembers {
    /// Append `other`, renumbering its ordinals so they follow ours
    pub fn merge(&mut self, other: RawMembers) {
        fn next(ordinals: impl Iterator<Item = u32>) -> u32 {
            ordinals.max().map(|o| o + 1).unwrap_or(0)
        }

        let base = next(self.fields.iter().map(|f| f.ordinal));
        self.fields.extend(other.fields.into_iter().map(|mut f| {
            f.ordinal += base;
            f
        }));
        let base = next(self.properties.iter().map(|p| p.ordinal));
        self.properties.extend(other.properties.into_iter().map(|mut p| {
            p.ordinal += base;
            p
        }));
        let base = next(self.methods.iter().map(|m| m.ordinal));
        self.methods.extend(other.methods.into_iter().map(|mut m| {
            m.ordinal += base;
            m
        }));
        let base = next(self.constructors.iter().map(|c| c.ordinal));
        self.constructors.extend(other.constructors.into_iter().map(|mut c| {
            c.ordinal += base;
            c
        }));
        let base = next(self.events.iter().map(|e| e.ordinal));
        self.events.extend(other.events.into_iter().map(|mut e| {
            e.ordinal += base;
            e
        }));
    }
}

/// Raw shape of one type
pub struct RawType {
    pub handle: TypeHandle,
    /// Display name, e.g. `Vec<Show>`
    pub name: String,
    /// Key of the open generic definition, e.g. `Vec` or `myapp::models::Page`
    pub definition: &'static str,
    pub kind: Kind,
    pub visibility: Visibility,
    pub base: Option<TypeLink>,
    /// Element type of arrays, pointers and references
    pub element: Option<TypeLink>,
    /// Underlying integer type of a field-less enum
    pub underlying: Option<TypeLink>,
    pub generic_args: Vec<TypeLink>,
    /// Synthetic pair shape for dictionaries
    pub key_value_pair: Option<TypeLink>,
    /// Handles of implemented traits (`dyn Trait`)
    pub interfaces: Vec<TypeHandle>,
    pub enumerable: bool,
    pub is_pointer: bool,
    pub is_by_ref: bool,
    pub tags: Tags,
    pub coerce: Coercion,
    pub default_value: fn() -> Option<Value>,
    pub members: RawMembers,
}

impl RawType {
    /// A shape with no members, links or tags
    pub fn new<T: Introspect>(name: impl Into<String>, definition: &'static str, kind: Kind) -> Self {
        Self {
            handle: TypeHandle::of::<T>(),
            name: name.into(),
            definition,
            kind,
            visibility: Visibility::Public,
            base: None,
            element: None,
            underlying: None,
            generic_args: Vec::new(),
            key_value_pair: None,
            interfaces: Vec::new(),
            enumerable: false,
            is_pointer: false,
            is_by_ref: false,
            tags: Tags::new(),
            coerce: T::coerce,
            default_value: T::default_value,
            members: RawMembers::default(),
        }
    }

    pub fn with_generic_args(mut self, args: Vec<TypeLink>) -> Self {
        self.generic_args = args;
        self
    }

    pub fn with_element(mut self, element: TypeLink) -> Self {
        self.element = Some(element);
        self
    }

    pub fn enumerable(mut self) -> Self {
        self.enumerable = true;
        self
    }
}

/// Build a generic display name: `generic_name("Vec", &[link])` → `Vec<Show>`
pub fn generic_name(base: &str, args: &[TypeLink]) -> String {
    if args.is_empty() {
        return base.to_string();
    }
    let names: Vec<String> = args.iter().map(TypeLink::name).collect();
    format!("{}<{}>", base, names.join(", "))
}

// ============================================================================
// Helpers for generated thunks
// ============================================================================

pub fn expect_arity(args: &[Value], expected: usize) -> Result<(), RawCallError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(RawCallError::Arity {
            expected,
            found: args.len(),
        })
    }
}

/// Take the next positional argument as exactly `T`
pub fn take_arg<T: Any>(
    args: &mut std::vec::IntoIter<Value>,
    position: usize,
) -> Result<T, RawCallError> {
    args.next()
        .ok_or(RawCallError::Argument(position))?
        .downcast::<T>()
        .map(|v| *v)
        .map_err(|_| RawCallError::Argument(position))
}

/// Unbox a single value as exactly `T`
pub fn unbox<T: Any>(value: Value, position: usize) -> Result<T, RawCallError> {
    value
        .downcast::<T>()
        .map(|v| *v)
        .map_err(|_| RawCallError::Argument(position))
}

pub fn receiver<T: Any>(instance: &mut dyn Any) -> Result<&mut T, RawCallError> {
    instance.downcast_mut::<T>().ok_or(RawCallError::Receiver)
}

pub fn assign<T: Any>(slot: &mut T, value: Value) -> Result<(), RawCallError> {
    *slot = unbox(value, 0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::boxed;

    #[test]
    fn test_take_arg_checks_type_and_presence() {
        let mut args = vec![boxed(1i32), boxed(String::from("x"))].into_iter();
        assert_eq!(take_arg::<i32>(&mut args, 0), Ok(1));
        assert_eq!(take_arg::<i32>(&mut args, 1), Err(RawCallError::Argument(1)));
        assert_eq!(take_arg::<i32>(&mut args, 2), Err(RawCallError::Argument(2)));
    }

    #[test]
    fn test_expect_arity() {
        let args = vec![boxed(1u8)];
        assert!(expect_arity(&args, 1).is_ok());
        assert_eq!(
            expect_arity(&args, 3),
            Err(RawCallError::Arity {
                expected: 3,
                found: 1
            })
        );
    }

    #[test]
    fn test_merge_renumbers_ordinals() {
        let link = TypeLink::of::<i32>();
        let field = |name: &'static str, ordinal| RawField {
            name,
            ordinal,
            visibility: Visibility::Public,
            tags: Tags::new(),
            ty: link,
            is_static: false,
            is_literal: false,
            is_readonly: false,
            get: RawGet::Static(|| boxed(0i32)),
            set: None,
        };

        let mut members = RawMembers {
            fields: vec![field("a", 0), field("b", 1)],
            ..Default::default()
        };
        members.merge(RawMembers {
            fields: vec![field("LIMIT", 0)],
            ..Default::default()
        });

        let ordinals: Vec<_> = members.fields.iter().map(|f| (f.name, f.ordinal)).collect();
        assert_eq!(ordinals, vec![("a", 0), ("b", 1), ("LIMIT", 2)]);
    }
}
