//! Descriptor construction: turns a [RawType] into a [TypeMember] with
//! compiled accessors, linking every type it mentions through the cache.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::accessor::{
    Site, compile_factory, compile_field_setter, compile_getter, compile_invoker,
    compile_property_getter, compile_property_setter,
};
use crate::cache::{MetadataCache, Slot};
use crate::classifier::classify;
use crate::enclosed::resolve_enclosed_type;
use crate::error::{Result, ShapeError};
use crate::handle::{MemberHandle, MemberKind, TypeHandle};
use crate::members::{
    ConstructorMember, EventMember, FieldMember, MemberHeader, MethodMember, Parameter,
    PropertyMember, ReturnParameter, TypeMember, TypeRef,
};
use crate::raw::{RawParameter, RawReturn, RawType, TypeLink};

/// Shared context for the members of one type under construction
struct Declaring<'a> {
    handle: TypeHandle,
    name: &'a str,
    this: TypeRef,
}

impl Declaring<'_> {
    fn header(
        &self,
        name: &'static str,
        kind: MemberKind,
        ordinal: u32,
        visibility: crate::system_type::Visibility,
        tags: crate::tags::Tags,
    ) -> MemberHeader {
        MemberHeader {
            name,
            handle: MemberHandle {
                declaring: self.handle,
                kind,
                ordinal,
            },
            visibility,
            tags,
            declaring: self.this.clone(),
        }
    }

    fn duplicate(&self, kind: &str, name: &str) -> ShapeError {
        ShapeError::structural(name, self.name, format!("duplicate {} name", kind))
    }
}

impl MetadataCache {
    /// Describe `raw`. Every linked type is built first (or referenced
    /// lazily when its build is already under way), so a failure anywhere
    /// below fails this type as a whole.
    pub(crate) fn describe(&self, raw: RawType, slot: &Arc<Slot>) -> Result<TypeMember> {
        let system_type = classify(&raw);
        let enclosed = resolve_enclosed_type(&raw, system_type);

        let RawType {
            handle,
            name,
            definition,
            kind,
            visibility,
            base,
            generic_args,
            interfaces,
            enumerable,
            is_pointer,
            is_by_ref,
            tags,
            default_value,
            members,
            ..
        } = raw;

        let declaring = Declaring {
            handle,
            name: &name,
            this: TypeRef::new(handle, &name, slot),
        };
        let min_visibility = self.config.min_visibility();

        let base = base.map(|link| self.link(link)).transpose()?;
        let enclosed = enclosed.map(|link| self.link(link)).transpose()?;
        let generic_args = generic_args
            .into_iter()
            .map(|link| self.link(link))
            .collect::<Result<Vec<_>>>()?;

        // Fields
        let mut raw_fields = members.fields;
        raw_fields.retain(|f| f.visibility >= min_visibility);
        raw_fields.sort_by_key(|f| f.ordinal);

        let mut fields = IndexMap::with_capacity(raw_fields.len());
        for field in raw_fields {
            let site = Site::new(field.name, &name);
            let setter = compile_field_setter(&site, &field);
            let member = FieldMember {
                ty: self.link(field.ty)?,
                is_static: field.is_static,
                is_literal: field.is_literal,
                is_readonly: field.is_readonly,
                getter: compile_getter(&site, field.get),
                setter,
                header: declaring.header(
                    field.name,
                    MemberKind::Field,
                    field.ordinal,
                    field.visibility,
                    field.tags,
                ),
            };
            if fields.insert(field.name, Arc::new(member)).is_some() {
                return Err(declaring.duplicate("field", field.name));
            }
        }

        // Properties
        let mut raw_properties = members.properties;
        raw_properties.retain(|p| p.visibility >= min_visibility);
        raw_properties.sort_by_key(|p| p.ordinal);

        let mut properties = IndexMap::with_capacity(raw_properties.len());
        for property in raw_properties {
            let site = Site::new(property.name, &name);
            let member = PropertyMember {
                ty: self.link(property.ty)?,
                is_static: property.is_static,
                getter: compile_property_getter(&site, &property),
                setter: compile_property_setter(&site, &property),
                header: declaring.header(
                    property.name,
                    MemberKind::Property,
                    property.ordinal,
                    property.visibility,
                    property.tags,
                ),
            };
            if properties.insert(property.name, Arc::new(member)).is_some() {
                return Err(declaring.duplicate("property", property.name));
            }
        }

        // Methods, grouped into overload sets
        let mut raw_methods = members.methods;
        raw_methods.retain(|m| m.visibility >= min_visibility);
        raw_methods.sort_by_key(|m| m.ordinal);

        let mut methods: IndexMap<&'static str, Vec<Arc<MethodMember>>> = IndexMap::new();
        for mut method in raw_methods {
            method.params.sort_by_key(|p| p.position);
            let site = Site::new(method.name, &name);
            let invoker = compile_invoker(&site, &method);
            let member = MethodMember {
                is_static: method.is_static,
                params: self.parameters(&method.params)?,
                ret: self.return_parameter(&method.ret)?,
                invoker,
                header: declaring.header(
                    method.name,
                    MemberKind::Method,
                    method.ordinal,
                    method.visibility,
                    method.tags,
                ),
            };
            methods.entry(method.name).or_default().push(Arc::new(member));
        }

        // Constructors
        let mut raw_constructors = members.constructors;
        raw_constructors.retain(|c| c.visibility >= min_visibility);
        raw_constructors.sort_by_key(|c| c.ordinal);

        let mut constructors = Vec::with_capacity(raw_constructors.len());
        for mut ctor in raw_constructors {
            ctor.params.sort_by_key(|p| p.position);
            let site = Site::new(ctor.name, &name);
            let factory = compile_factory(&site, &ctor);
            constructors.push(Arc::new(ConstructorMember {
                params: self.parameters(&ctor.params)?,
                factory,
                header: declaring.header(
                    ctor.name,
                    MemberKind::Constructor,
                    ctor.ordinal,
                    ctor.visibility,
                    ctor.tags,
                ),
            }));
        }

        // Events
        let mut raw_events = members.events;
        raw_events.retain(|e| e.visibility >= min_visibility);
        raw_events.sort_by_key(|e| e.ordinal);

        let mut events = IndexMap::with_capacity(raw_events.len());
        for event in raw_events {
            let member = EventMember {
                handler: self.link(event.handler)?,
                header: declaring.header(
                    event.name,
                    MemberKind::Event,
                    event.ordinal,
                    event.visibility,
                    event.tags,
                ),
            };
            if events.insert(event.name, Arc::new(member)).is_some() {
                return Err(declaring.duplicate("event", event.name));
            }
        }

        Ok(TypeMember {
            definition,
            handle,
            kind,
            system_type,
            visibility,
            base,
            enclosed,
            generic_args,
            interfaces: interfaces.into_iter().collect::<IndexSet<_>>(),
            is_enumerable: enumerable,
            is_pointer,
            is_by_ref,
            tags,
            fields,
            properties,
            methods,
            constructors,
            events,
            default_value,
            name,
        })
    }

    fn parameters(&self, raw: &[RawParameter]) -> Result<Vec<Parameter>> {
        raw.iter()
            .map(|p| {
                Ok(Parameter {
                    name: p.name,
                    position: p.position,
                    tags: p.tags.clone(),
                    ty: self.link(p.ty)?,
                    default: p.default,
                    is_optional: p.is_optional,
                    is_out: p.is_out,
                    is_by_ref: p.is_by_ref,
                })
            })
            .collect()
    }

    fn return_parameter(&self, raw: &RawReturn) -> Result<ReturnParameter> {
        Ok(ReturnParameter {
            ty: self.link(raw.ty)?,
            tags: raw.tags.clone(),
            is_by_ref: raw.is_by_ref,
        })
    }

    /// Reference to the linked type, built before it is returned.
    ///
    /// A type already being built further up this thread's stack is a
    /// cycle and gets a reference that resolves once that build finishes.
    /// A type another thread is building is waited for, so its failure
    /// fails this build too.
    pub(crate) fn link(&self, link: TypeLink) -> Result<TypeRef> {
        let slot = self.slot(link);
        if let Some(member) = slot.get() {
            return Ok(TypeRef::new(link.handle, member.name(), &slot));
        }
        if self.building_here(link.handle) {
            return Ok(TypeRef::new(link.handle, &link.name(), &slot));
        }

        let wait = self.config.nested_build_wait;
        let nested = |e| ShapeError::NestedBuild {
            type_name: link.name(),
            source: Box::new(e),
        };
        let _claim = slot.claim_within(wait).ok_or_else(|| {
            nested(ShapeError::BuildTimedOut {
                type_name: link.name(),
                waited_ms: wait.as_millis() as u64,
            })
        })?;

        let member = match slot.get() {
            Some(member) => member.clone(),
            None => self.build_into(&slot, link).map_err(nested)?,
        };
        Ok(TypeRef::new(link.handle, member.name(), &slot))
    }
}
