//! Immutable descriptors for types and their members.
//!
//! Descriptors are created once by the [cache](crate::cache) and never
//! mutated. A [TypeMember] owns its member tables; members refer back to
//! their declaring type, and to the types they mention, through
//! [TypeRef]s: non-owning lookups into the cache that also let recursive
//! models describe themselves.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::{IndexMap, IndexSet};

use crate::accessor::{CompiledFactory, CompiledGetter, CompiledInvoker, CompiledSetter};
use crate::cache::Slot;
use crate::error::{Result, ShapeError};
use crate::handle::{MemberHandle, MemberKind, TypeHandle};
use crate::system_type::{Kind, SystemType, Visibility};
use crate::tags::Tags;
use crate::value::Value;

// ============================================================================
// Type references
// ============================================================================

/// Reference to another type's descriptor.
///
/// Resolves once the referenced type has finished building. References
/// taken inside a cycle resolve as soon as the outermost build completes.
/// The cache owns every descriptor; a reference outliving its cache no
/// longer resolves.
#[derive(Clone)]
pub struct TypeRef {
    handle: TypeHandle,
    name: Arc<str>,
    slot: Weak<Slot>,
}

impl TypeRef {
    pub(crate) fn new(handle: TypeHandle, name: &str, slot: &Arc<Slot>) -> Self {
        Self {
            handle,
            name: Arc::from(name),
            slot: Arc::downgrade(slot),
        }
    }

    pub fn handle(&self) -> TypeHandle {
        self.handle
    }

    /// Display name of the referenced type
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The referenced descriptor, if it has been built
    pub fn get(&self) -> Option<Arc<TypeMember>> {
        self.slot.upgrade()?.get().cloned()
    }

    pub fn is_resolved(&self) -> bool {
        self.get().is_some()
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeRef").field(&self.name).finish()
    }
}

// ============================================================================
// Shared member interface
// ============================================================================

/// Data every member descriptor carries
#[derive(Debug, Clone)]
pub struct MemberHeader {
    pub(crate) name: &'static str,
    pub(crate) handle: MemberHandle,
    pub(crate) visibility: Visibility,
    pub(crate) tags: Tags,
    pub(crate) declaring: TypeRef,
}

/// Common descriptor interface over fields, properties, methods,
/// constructors and events
pub trait Descriptor {
    fn header(&self) -> &MemberHeader;

    fn name(&self) -> &'static str {
        self.header().name
    }

    fn handle(&self) -> MemberHandle {
        self.header().handle
    }

    fn visibility(&self) -> Visibility {
        self.header().visibility
    }

    fn tags(&self) -> &Tags {
        &self.header().tags
    }

    /// The type that declares this member
    fn declaring_type(&self) -> &TypeRef {
        &self.header().declaring
    }
}

// ============================================================================
// Fields and properties
// ============================================================================

#[derive(Debug)]
pub struct FieldMember {
    pub(crate) header: MemberHeader,
    pub(crate) ty: TypeRef,
    pub(crate) is_static: bool,
    pub(crate) is_literal: bool,
    pub(crate) is_readonly: bool,
    pub(crate) getter: CompiledGetter,
    pub(crate) setter: std::result::Result<CompiledSetter, ShapeError>,
}

impl Descriptor for FieldMember {
    fn header(&self) -> &MemberHeader {
        &self.header
    }
}

impl FieldMember {
    pub fn field_type(&self) -> &TypeRef {
        &self.ty
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Compile-time constant
    pub fn is_literal(&self) -> bool {
        self.is_literal
    }

    pub fn is_readonly(&self) -> bool {
        self.is_readonly
    }

    pub fn can_write(&self) -> bool {
        self.setter.is_ok()
    }

    pub fn getter(&self) -> &CompiledGetter {
        &self.getter
    }

    /// The compiled setter, or the structural violation that prevented one
    pub fn setter(&self) -> Result<&CompiledSetter> {
        self.setter.as_ref().map_err(Clone::clone)
    }

    pub fn get_value(&self, instance: &dyn Any) -> Result<Value> {
        self.getter.get(instance)
    }

    pub fn get_static(&self) -> Result<Value> {
        self.getter.get_static()
    }

    pub fn set_value(&self, instance: &mut dyn Any, value: Value) -> Result<()> {
        self.setter()?.set(instance, value)
    }

    pub fn set_static(&self, value: Value) -> Result<()> {
        self.setter()?.set_static(value)
    }
}

#[derive(Debug)]
pub struct PropertyMember {
    pub(crate) header: MemberHeader,
    pub(crate) ty: TypeRef,
    pub(crate) is_static: bool,
    pub(crate) getter: std::result::Result<CompiledGetter, ShapeError>,
    pub(crate) setter: std::result::Result<CompiledSetter, ShapeError>,
}

impl Descriptor for PropertyMember {
    fn header(&self) -> &MemberHeader {
        &self.header
    }
}

impl PropertyMember {
    pub fn property_type(&self) -> &TypeRef {
        &self.ty
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn can_read(&self) -> bool {
        self.getter.is_ok()
    }

    pub fn can_write(&self) -> bool {
        self.setter.is_ok()
    }

    pub fn getter(&self) -> Result<&CompiledGetter> {
        self.getter.as_ref().map_err(Clone::clone)
    }

    pub fn setter(&self) -> Result<&CompiledSetter> {
        self.setter.as_ref().map_err(Clone::clone)
    }

    pub fn get_value(&self, instance: &dyn Any) -> Result<Value> {
        self.getter()?.get(instance)
    }

    pub fn get_static(&self) -> Result<Value> {
        self.getter()?.get_static()
    }

    pub fn set_value(&self, instance: &mut dyn Any, value: Value) -> Result<()> {
        self.setter()?.set(instance, value)
    }

    pub fn set_static(&self, value: Value) -> Result<()> {
        self.setter()?.set_static(value)
    }
}

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug, Clone)]
pub struct Parameter {
    pub(crate) name: &'static str,
    pub(crate) position: u32,
    pub(crate) tags: Tags,
    pub(crate) ty: TypeRef,
    pub(crate) default: Option<fn() -> Value>,
    pub(crate) is_optional: bool,
    pub(crate) is_out: bool,
    pub(crate) is_by_ref: bool,
}

impl Parameter {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn parameter_type(&self) -> &TypeRef {
        &self.ty
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    pub fn is_out(&self) -> bool {
        self.is_out
    }

    pub fn is_by_ref(&self) -> bool {
        self.is_by_ref
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// A fresh copy of the default value
    pub fn default_value(&self) -> Option<Value> {
        self.default.map(|f| f())
    }
}

#[derive(Debug, Clone)]
pub struct ReturnParameter {
    pub(crate) ty: TypeRef,
    pub(crate) tags: Tags,
    pub(crate) is_by_ref: bool,
}

impl ReturnParameter {
    pub fn return_type(&self) -> &TypeRef {
        &self.ty
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn is_by_ref(&self) -> bool {
        self.is_by_ref
    }

    /// The method returns nothing
    pub fn is_unit(&self) -> bool {
        self.ty.handle() == TypeHandle::of::<()>()
    }
}

fn signature(name: &str, params: &[Parameter], ret: Option<&ReturnParameter>) -> String {
    let params: Vec<String> = params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty.name()))
        .collect();
    match ret {
        Some(ret) if !ret.is_unit() => format!("{}({}) -> {}", name, params.join(", "), ret.ty.name()),
        _ => format!("{}({})", name, params.join(", ")),
    }
}

// ============================================================================
// Methods and constructors
// ============================================================================

#[derive(Debug)]
pub struct MethodMember {
    pub(crate) header: MemberHeader,
    pub(crate) is_static: bool,
    pub(crate) params: Vec<Parameter>,
    pub(crate) ret: ReturnParameter,
    pub(crate) invoker: std::result::Result<CompiledInvoker, ShapeError>,
}

impl Descriptor for MethodMember {
    fn header(&self) -> &MemberHeader {
        &self.header
    }
}

impl MethodMember {
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn return_parameter(&self) -> &ReturnParameter {
        &self.ret
    }

    /// False when a parameter or the return is a pointer or reference.
    /// Check before invoking.
    pub fn is_invokable(&self) -> bool {
        self.invoker.is_ok()
    }

    pub fn invoker(&self) -> Result<&CompiledInvoker> {
        self.invoker.as_ref().map_err(Clone::clone)
    }

    pub fn invoke(&self, instance: &mut dyn Any, args: Vec<Value>) -> Result<Value> {
        self.invoker()?.invoke(instance, args)
    }

    pub fn invoke_static(&self, args: Vec<Value>) -> Result<Value> {
        self.invoker()?.invoke_static(args)
    }

    /// e.g. `rename(name: String) -> bool`
    pub fn signature(&self) -> String {
        signature(self.header.name, &self.params, Some(&self.ret))
    }
}

#[derive(Debug)]
pub struct ConstructorMember {
    pub(crate) header: MemberHeader,
    pub(crate) params: Vec<Parameter>,
    pub(crate) factory: std::result::Result<CompiledFactory, ShapeError>,
}

impl Descriptor for ConstructorMember {
    fn header(&self) -> &MemberHeader {
        &self.header
    }
}

impl ConstructorMember {
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn is_invokable(&self) -> bool {
        self.factory.is_ok()
    }

    pub fn factory(&self) -> Result<&CompiledFactory> {
        self.factory.as_ref().map_err(Clone::clone)
    }

    pub fn create(&self, args: Vec<Value>) -> Result<Value> {
        self.factory()?.create(args)
    }

    pub fn create_as<T: Any>(&self, args: Vec<Value>) -> Result<T> {
        self.factory()?.create_as::<T>(args)
    }

    /// Callable with no arguments
    pub fn is_parameterless(&self) -> bool {
        self.params.iter().all(Parameter::has_default)
    }

    pub fn signature(&self) -> String {
        signature(self.header.name, &self.params, None)
    }
}

#[derive(Debug)]
pub struct EventMember {
    pub(crate) header: MemberHeader,
    pub(crate) handler: TypeRef,
}

impl Descriptor for EventMember {
    fn header(&self) -> &MemberHeader {
        &self.header
    }
}

impl EventMember {
    /// Delegate type of the event's handlers
    pub fn handler_type(&self) -> &TypeRef {
        &self.handler
    }
}

/// Any member of a type
#[derive(Debug, Clone)]
pub enum Member {
    Field(Arc<FieldMember>),
    Property(Arc<PropertyMember>),
    Method(Arc<MethodMember>),
    Constructor(Arc<ConstructorMember>),
    Event(Arc<EventMember>),
}

impl Member {
    pub fn kind(&self) -> MemberKind {
        match self {
            Member::Field(_) => MemberKind::Field,
            Member::Property(_) => MemberKind::Property,
            Member::Method(_) => MemberKind::Method,
            Member::Constructor(_) => MemberKind::Constructor,
            Member::Event(_) => MemberKind::Event,
        }
    }

    /// Declared type of a field or property, return type of a method,
    /// constructed type of a constructor, handler type of an event
    pub fn type_ref(&self) -> &TypeRef {
        match self {
            Member::Field(f) => &f.ty,
            Member::Property(p) => &p.ty,
            Member::Method(m) => &m.ret.ty,
            Member::Constructor(c) => &c.header.declaring,
            Member::Event(e) => &e.handler,
        }
    }
}

impl Descriptor for Member {
    fn header(&self) -> &MemberHeader {
        match self {
            Member::Field(f) => &f.header,
            Member::Property(p) => &p.header,
            Member::Method(m) => &m.header,
            Member::Constructor(c) => &c.header,
            Member::Event(e) => &e.header,
        }
    }
}

// ============================================================================
// Types
// ============================================================================

/// Descriptor of one type. Reference-stable: the cache hands out the same
/// `Arc` for every lookup of a handle.
pub struct TypeMember {
    pub(crate) name: String,
    pub(crate) definition: &'static str,
    pub(crate) handle: TypeHandle,
    pub(crate) kind: Kind,
    pub(crate) system_type: SystemType,
    pub(crate) visibility: Visibility,
    pub(crate) base: Option<TypeRef>,
    pub(crate) enclosed: Option<TypeRef>,
    pub(crate) generic_args: Vec<TypeRef>,
    pub(crate) interfaces: IndexSet<TypeHandle>,
    pub(crate) is_enumerable: bool,
    pub(crate) is_pointer: bool,
    pub(crate) is_by_ref: bool,
    pub(crate) tags: Tags,
    pub(crate) fields: IndexMap<&'static str, Arc<FieldMember>>,
    pub(crate) properties: IndexMap<&'static str, Arc<PropertyMember>>,
    pub(crate) methods: IndexMap<&'static str, Vec<Arc<MethodMember>>>,
    pub(crate) constructors: Vec<Arc<ConstructorMember>>,
    pub(crate) events: IndexMap<&'static str, Arc<EventMember>>,
    pub(crate) default_value: fn() -> Option<Value>,
}

impl TypeMember {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open generic definition key used for classification
    pub fn definition(&self) -> &'static str {
        self.definition
    }

    pub fn handle(&self) -> TypeHandle {
        self.handle
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn system_type(&self) -> SystemType {
        self.system_type
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn base(&self) -> Option<&TypeRef> {
        self.base.as_ref()
    }

    pub fn enclosed_type(&self) -> Option<&TypeRef> {
        self.enclosed.as_ref()
    }

    pub fn generic_args(&self) -> &[TypeRef] {
        &self.generic_args
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_args.is_empty()
    }

    pub fn interfaces(&self) -> &IndexSet<TypeHandle> {
        &self.interfaces
    }

    pub fn implements<T: ?Sized + 'static>(&self) -> bool {
        self.interfaces.contains(&TypeHandle::of::<T>())
    }

    pub fn is_enumerable(&self) -> bool {
        self.is_enumerable
    }

    pub fn is_pointer(&self) -> bool {
        self.is_pointer
    }

    pub fn is_by_ref(&self) -> bool {
        self.is_by_ref
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn field(&self, name: &str) -> Option<&Arc<FieldMember>> {
        self.fields.get(name)
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &Arc<FieldMember>> {
        self.fields.values()
    }

    pub fn property(&self, name: &str) -> Option<&Arc<PropertyMember>> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &Arc<PropertyMember>> {
        self.properties.values()
    }

    /// Overload set for `name`, in declaration order. Empty if none.
    pub fn methods(&self, name: &str) -> &[Arc<MethodMember>] {
        self.methods.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every method, grouped by name
    pub fn method_groups(&self) -> impl Iterator<Item = (&'static str, &[Arc<MethodMember>])> {
        self.methods.iter().map(|(name, group)| (*name, group.as_slice()))
    }

    pub fn constructors(&self) -> &[Arc<ConstructorMember>] {
        &self.constructors
    }

    pub fn event(&self, name: &str) -> Option<&Arc<EventMember>> {
        self.events.get(name)
    }

    pub fn events(&self) -> impl Iterator<Item = &Arc<EventMember>> {
        self.events.values()
    }

    /// Every member as a [Member], fields first, then properties, methods,
    /// constructors and events
    pub fn members(&self) -> impl Iterator<Item = Member> + '_ {
        let fields = self.fields.values().cloned().map(Member::Field);
        let properties = self.properties.values().cloned().map(Member::Property);
        let methods = self
            .methods
            .values()
            .flatten()
            .cloned()
            .map(Member::Method);
        let constructors = self.constructors.iter().cloned().map(Member::Constructor);
        let events = self.events.values().cloned().map(Member::Event);
        fields
            .chain(properties)
            .chain(methods)
            .chain(constructors)
            .chain(events)
    }

    /// A new default instance: through a constructor callable with no
    /// arguments, else the type's `Default`.
    pub fn create_default(&self) -> Result<Value> {
        if !self.kind.is_value_shaped() {
            return Err(ShapeError::unsupported(self.kind.name(), "<default>", &self.name));
        }
        if self.is_pointer {
            return Err(ShapeError::unsupported("Pointer", "<default>", &self.name));
        }
        if self.is_by_ref {
            return Err(ShapeError::unsupported("ByRef", "<default>", &self.name));
        }

        if let Some(ctor) = self
            .constructors
            .iter()
            .find(|c| c.is_invokable() && c.is_parameterless())
        {
            return ctor.create(Vec::new());
        }

        (self.default_value)().ok_or_else(|| ShapeError::MemberNotFound {
            member_kind: "constructor",
            member: "<default>".to_string(),
            declaring_type: self.name.clone(),
        })
    }
}

impl fmt::Debug for TypeMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMember")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("system_type", &self.system_type)
            .field("fields", &self.fields.len())
            .field("properties", &self.properties.len())
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}
