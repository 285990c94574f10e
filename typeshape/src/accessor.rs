//! Compiled accessor synthesizer.
//!
//! Generated thunks (see [raw](crate::raw)) expect arguments of exactly the
//! declared types. The synthesizer wraps each one, once, into a callable
//! that checks arity, fills defaulted trailing parameters and converts each
//! positional argument through a binder chosen at build time. The resulting
//! [CompiledGetter], [CompiledSetter], [CompiledInvoker] and
//! [CompiledFactory] are stored on the descriptor and reused for every call.
//!
//! Structural preconditions are checked here, at build time, never per call.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{Result, ShapeError};
use crate::handle::TypeHandle;
use crate::raw::{
    RawCall, RawCallError, RawConstructor, RawField, RawGet, RawMethod, RawParameter,
    RawProperty, RawReturn, RawSet,
};
use crate::value::{self, Coercion, Value};

/// Member and declaring type an accessor was compiled for
#[derive(Debug, Clone)]
pub struct Site {
    pub member: Arc<str>,
    pub declaring_type: Arc<str>,
}

impl Site {
    pub fn new(member: &str, declaring_type: &str) -> Self {
        Self {
            member: Arc::from(member),
            declaring_type: Arc::from(declaring_type),
        }
    }

    fn violation(&self, reason: &str) -> ShapeError {
        ShapeError::structural(&*self.member, &*self.declaring_type, reason)
    }

    fn unsupported(&self, kind: &str) -> ShapeError {
        ShapeError::unsupported(kind, &*self.member, &*self.declaring_type)
    }

    fn receiver(&self) -> ShapeError {
        ShapeError::ReceiverType {
            member: self.member.to_string(),
            declaring_type: self.declaring_type.to_string(),
        }
    }
}

// ============================================================================
// Argument binding
// ============================================================================

/// One positional slot: target type, its conversion, optional default
#[derive(Clone)]
struct ArgumentSlot {
    position: usize,
    name: &'static str,
    target: TypeHandle,
    coerce: Coercion,
    default: Option<fn() -> Value>,
}

impl ArgumentSlot {
    fn from_parameter(param: &RawParameter) -> Self {
        Self {
            position: param.position as usize,
            name: param.name,
            target: param.ty.handle,
            coerce: param.ty.coerce,
            default: param.default,
        }
    }

    fn bind(&self, value: Value, site: &Site) -> Result<Value> {
        if self.target.is_type_of(&*value) {
            return Ok(value);
        }
        (self.coerce)(value).map_err(|_| self.mismatch(site))
    }

    fn mismatch(&self, site: &Site) -> ShapeError {
        ShapeError::ArgumentType {
            member: site.member.to_string(),
            declaring_type: site.declaring_type.to_string(),
            parameter: self.name.to_string(),
            position: self.position,
            expected: self.target.path().to_string(),
        }
    }
}

#[derive(Clone)]
struct Binder {
    slots: Arc<[ArgumentSlot]>,
    /// Arguments that must be supplied; the rest have defaults
    required: usize,
}

impl Binder {
    fn new(params: &[RawParameter]) -> Self {
        let slots: Vec<ArgumentSlot> = params.iter().map(ArgumentSlot::from_parameter).collect();
        let required = slots
            .iter()
            .rposition(|s| s.default.is_none())
            .map(|i| i + 1)
            .unwrap_or(0);
        Self {
            slots: slots.into(),
            required,
        }
    }

    fn bind(&self, args: Vec<Value>, site: &Site) -> Result<Vec<Value>> {
        if args.len() < self.required || args.len() > self.slots.len() {
            return Err(ShapeError::ArgumentCount {
                member: site.member.to_string(),
                declaring_type: site.declaring_type.to_string(),
                expected: self.slots.len(),
                found: args.len(),
            });
        }

        let mut supplied = args.into_iter();
        let mut bound = Vec::with_capacity(self.slots.len());
        for slot in self.slots.iter() {
            let value = match supplied.next() {
                Some(value) => slot.bind(value, site)?,
                None => match slot.default {
                    Some(default) => default(),
                    None => return Err(slot.mismatch(site)),
                },
            };
            bound.push(value);
        }
        Ok(bound)
    }

    fn raw_error(&self, err: RawCallError, site: &Site) -> ShapeError {
        match err {
            RawCallError::Receiver => site.receiver(),
            RawCallError::Argument(position) => match self.slots.get(position) {
                Some(slot) => slot.mismatch(site),
                None => site.violation("generated thunk reported an argument past the end"),
            },
            RawCallError::Arity { expected, found } => ShapeError::ArgumentCount {
                member: site.member.to_string(),
                declaring_type: site.declaring_type.to_string(),
                expected,
                found,
            },
            RawCallError::Rejected(reason) => ShapeError::ValueRejected {
                member: site.member.to_string(),
                declaring_type: site.declaring_type.to_string(),
                reason,
            },
        }
    }
}

// ============================================================================
// Invocability
// ============================================================================

/// Shape kind that prevents a direct call, if any: pointer parameters,
/// by-ref parameters, by-ref returns.
pub fn non_invokable_kind(params: &[RawParameter], ret: Option<&RawReturn>) -> Option<&'static str> {
    for param in params {
        if param.is_by_ref || param.is_out {
            return Some("ByRef");
        }
        let raw = param.ty.raw();
        if raw.is_pointer {
            return Some("Pointer");
        }
        if raw.is_by_ref {
            return Some("ByRef");
        }
    }

    if let Some(ret) = ret {
        if ret.is_by_ref {
            return Some("ByRef");
        }
        if ret.ty.raw().is_pointer {
            return Some("Pointer");
        }
    }

    None
}

// ============================================================================
// Getters
// ============================================================================

type InstanceGetFn = dyn Fn(&dyn Any) -> Result<Value> + Send + Sync;
type StaticGetFn = dyn Fn() -> Result<Value> + Send + Sync;

#[derive(Clone)]
enum GetterFn {
    Instance(Arc<InstanceGetFn>),
    Static(Arc<StaticGetFn>),
}

/// Compiled value getter for a field or property
#[derive(Clone)]
pub struct CompiledGetter {
    site: Site,
    call: GetterFn,
}

impl CompiledGetter {
    pub fn is_static(&self) -> bool {
        matches!(self.call, GetterFn::Static(_))
    }

    pub fn get(&self, instance: &dyn Any) -> Result<Value> {
        match &self.call {
            GetterFn::Instance(f) => f(instance),
            GetterFn::Static(_) => Err(self
                .site
                .violation("static member requested through the instance accessor")),
        }
    }

    pub fn get_static(&self) -> Result<Value> {
        match &self.call {
            GetterFn::Static(f) => f(),
            GetterFn::Instance(_) => Err(self
                .site
                .violation("instance member requested through the static accessor")),
        }
    }
}

impl fmt::Debug for CompiledGetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledGetter")
            .field("site", &self.site)
            .field("static", &self.is_static())
            .finish()
    }
}

pub fn compile_getter(site: &Site, get: RawGet) -> CompiledGetter {
    trace!(member = %site.member, declaring_type = %site.declaring_type, "Compiling getter");
    let call = match get {
        RawGet::Instance(thunk) => {
            let err_site = site.clone();
            GetterFn::Instance(Arc::new(move |instance: &dyn Any| {
                thunk(instance).ok_or_else(|| err_site.receiver())
            }))
        }
        RawGet::Static(thunk) => GetterFn::Static(Arc::new(move || Ok(thunk()))),
    };
    CompiledGetter {
        site: site.clone(),
        call,
    }
}

// ============================================================================
// Setters
// ============================================================================

type InstanceSetFn = dyn Fn(&mut dyn Any, Value) -> Result<()> + Send + Sync;
type StaticSetFn = dyn Fn(Value) -> Result<()> + Send + Sync;

#[derive(Clone)]
enum SetterFn {
    Instance(Arc<InstanceSetFn>),
    Static(Arc<StaticSetFn>),
}

/// Compiled value setter for a field or property
#[derive(Clone)]
pub struct CompiledSetter {
    site: Site,
    call: SetterFn,
}

impl CompiledSetter {
    pub fn is_static(&self) -> bool {
        matches!(self.call, SetterFn::Static(_))
    }

    pub fn set(&self, instance: &mut dyn Any, value: Value) -> Result<()> {
        match &self.call {
            SetterFn::Instance(f) => f(instance, value),
            SetterFn::Static(_) => Err(self
                .site
                .violation("static member requested through the instance accessor")),
        }
    }

    pub fn set_static(&self, value: Value) -> Result<()> {
        match &self.call {
            SetterFn::Static(f) => f(value),
            SetterFn::Instance(_) => Err(self
                .site
                .violation("instance member requested through the static accessor")),
        }
    }
}

impl fmt::Debug for CompiledSetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSetter")
            .field("site", &self.site)
            .field("static", &self.is_static())
            .finish()
    }
}

fn value_slot(ty: &crate::raw::TypeLink) -> ArgumentSlot {
    ArgumentSlot {
        position: 0,
        name: "value",
        target: ty.handle,
        coerce: ty.coerce,
        default: None,
    }
}

fn wrap_setter(site: &Site, slot: ArgumentSlot, set: RawSet) -> CompiledSetter {
    let binder = Binder {
        slots: Arc::from(vec![slot.clone()]),
        required: 1,
    };
    let bind_site = site.clone();
    let call = match set {
        RawSet::Instance(thunk) => SetterFn::Instance(Arc::new(move |instance: &mut dyn Any, value| {
            let value = slot.bind(value, &bind_site)?;
            thunk(instance, value).map_err(|e| binder.raw_error(e, &bind_site))
        })),
        RawSet::Static(thunk) => SetterFn::Static(Arc::new(move |value| {
            let value = slot.bind(value, &bind_site)?;
            thunk(value).map_err(|e| binder.raw_error(e, &bind_site))
        })),
    };
    CompiledSetter {
        site: site.clone(),
        call,
    }
}

/// Compile a field setter.
///
/// Constant and init-only fields have no setter; asking for one is a
/// structural violation.
pub fn compile_field_setter(site: &Site, field: &RawField) -> Result<CompiledSetter> {
    if field.is_literal {
        return Err(site.violation("constant field cannot be assigned"));
    }
    if field.is_readonly {
        return Err(site.violation("init-only field cannot be assigned after construction"));
    }
    let set = field
        .set
        .ok_or_else(|| site.violation("field has no setter"))?;
    trace!(member = %site.member, declaring_type = %site.declaring_type, "Compiling field setter");
    Ok(wrap_setter(site, value_slot(&field.ty), set))
}

pub fn compile_property_getter(site: &Site, property: &RawProperty) -> Result<CompiledGetter> {
    let get = property
        .get
        .ok_or_else(|| site.violation("property is write-only"))?;
    Ok(compile_getter(site, get))
}

pub fn compile_property_setter(site: &Site, property: &RawProperty) -> Result<CompiledSetter> {
    let set = property
        .set
        .ok_or_else(|| site.violation("property is read-only"))?;
    trace!(member = %site.member, declaring_type = %site.declaring_type, "Compiling property setter");
    Ok(wrap_setter(site, value_slot(&property.ty), set))
}

// ============================================================================
// Method invokers
// ============================================================================

type InstanceCallFn = dyn Fn(&mut dyn Any, Vec<Value>) -> Result<Value> + Send + Sync;
type StaticCallFn = dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync;

#[derive(Clone)]
enum InvokerFn {
    Instance(Arc<InstanceCallFn>),
    Static(Arc<StaticCallFn>),
}

/// Compiled method invoker. Methods with no return yield `()`.
#[derive(Clone)]
pub struct CompiledInvoker {
    site: Site,
    call: InvokerFn,
}

impl CompiledInvoker {
    pub fn is_static(&self) -> bool {
        matches!(self.call, InvokerFn::Static(_))
    }

    pub fn invoke(&self, instance: &mut dyn Any, args: Vec<Value>) -> Result<Value> {
        match &self.call {
            InvokerFn::Instance(f) => f(instance, args),
            InvokerFn::Static(_) => Err(self
                .site
                .violation("static member requested through the instance accessor")),
        }
    }

    pub fn invoke_static(&self, args: Vec<Value>) -> Result<Value> {
        match &self.call {
            InvokerFn::Static(f) => f(args),
            InvokerFn::Instance(_) => Err(self
                .site
                .violation("instance member requested through the static accessor")),
        }
    }
}

impl fmt::Debug for CompiledInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledInvoker")
            .field("site", &self.site)
            .field("static", &self.is_static())
            .finish()
    }
}

/// Compile a method invoker, failing for members that cannot be called
/// directly.
pub fn compile_invoker(site: &Site, method: &RawMethod) -> Result<CompiledInvoker> {
    if let Some(kind) = non_invokable_kind(&method.params, Some(&method.ret)) {
        return Err(site.unsupported(kind));
    }
    if method.consumes_receiver {
        return Err(site.unsupported("ByValueReceiver"));
    }
    let call = method.call.ok_or_else(|| site.unsupported("Opaque"))?;

    trace!(
        member = %site.member,
        declaring_type = %site.declaring_type,
        params = method.params.len(),
        "Compiling invoker"
    );

    let binder = Binder::new(&method.params);
    let bind_site = site.clone();
    let call = match call {
        RawCall::Instance(thunk) => {
            InvokerFn::Instance(Arc::new(move |instance: &mut dyn Any, args| {
                let bound = binder.bind(args, &bind_site)?;
                thunk(instance, bound).map_err(|e| binder.raw_error(e, &bind_site))
            }))
        }
        RawCall::Static(thunk) => InvokerFn::Static(Arc::new(move |args| {
            let bound = binder.bind(args, &bind_site)?;
            thunk(bound).map_err(|e| binder.raw_error(e, &bind_site))
        })),
    };

    Ok(CompiledInvoker {
        site: site.clone(),
        call,
    })
}

// ============================================================================
// Constructors
// ============================================================================

/// Compiled object factory
#[derive(Clone)]
pub struct CompiledFactory {
    site: Site,
    call: Arc<StaticCallFn>,
}

impl CompiledFactory {
    pub fn create(&self, args: Vec<Value>) -> Result<Value> {
        (self.call)(args)
    }

    /// Create and unbox as `T`
    pub fn create_as<T: Any>(&self, args: Vec<Value>) -> Result<T> {
        value::into::<T>(self.create(args)?).map_err(|_| self.site.receiver())
    }
}

impl fmt::Debug for CompiledFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFactory").field("site", &self.site).finish()
    }
}

pub fn compile_factory(site: &Site, ctor: &RawConstructor) -> Result<CompiledFactory> {
    if let Some(kind) = non_invokable_kind(&ctor.params, None) {
        return Err(site.unsupported(kind));
    }
    let thunk = ctor.call.ok_or_else(|| site.unsupported("Opaque"))?;

    trace!(
        member = %site.member,
        declaring_type = %site.declaring_type,
        params = ctor.params.len(),
        "Compiling factory"
    );

    let binder = Binder::new(&ctor.params);
    let bind_site = site.clone();
    Ok(CompiledFactory {
        site: site.clone(),
        call: Arc::new(move |args| {
            let bound = binder.bind(args, &bind_site)?;
            thunk(bound).map_err(|e| binder.raw_error(e, &bind_site))
        }),
    })
}
