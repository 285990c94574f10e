//! `#[introspect_members]` on inherent impl blocks

use std::collections::BTreeMap;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    FnArg, ImplItem, ImplItemConst, ImplItemFn, ItemImpl, Pat, ReturnType, Type, TypePath,
};

use crate::attrs::{self, MemberAttrs};

pub fn expand(mut item: ItemImpl) -> syn::Result<TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[introspect_members] goes on inherent impl blocks",
        ));
    }

    let self_ident = match &*item.self_ty {
        Type::Path(TypePath { path, .. }) => path.segments.last().map(|s| s.ident.clone()),
        _ => None,
    };

    let mut collected = Collected::default();
    for impl_item in &item.items {
        match impl_item {
            ImplItem::Const(c) => collected.constant(c)?,
            ImplItem::Fn(f) => collected.function(f, self_ident.as_ref())?,
            _ => {}
        }
    }

    // The original block, minus our helper attributes
    for impl_item in &mut item.items {
        match impl_item {
            ImplItem::Const(c) => attrs::strip(&mut c.attrs),
            ImplItem::Fn(f) => {
                attrs::strip(&mut f.attrs);
                for input in &mut f.sig.inputs {
                    if let FnArg::Typed(arg) = input {
                        attrs::strip(&mut arg.attrs);
                    }
                }
            }
            _ => {}
        }
    }

    let (impl_generics, _, where_clause) = item.generics.split_for_impl();
    let self_ty = &item.self_ty;
    let fields = &collected.fields;
    let properties = collected.properties();
    let methods = &collected.methods;
    let constructors = &collected.constructors;

    Ok(quote! {
        #item

        impl #impl_generics ::typeshape::raw::ImplMembers for #self_ty #where_clause {
            fn impl_members() -> ::typeshape::raw::RawMembers {
                let mut __members = ::typeshape::raw::RawMembers::default();
                #(__members.fields.push(#fields);)*
                #(__members.properties.push(#properties);)*
                #(__members.methods.push(#methods);)*
                #(__members.constructors.push(#constructors);)*
                __members
            }
        }
    })
}

// ============================================================================
// Collection
// ============================================================================

/// One half of a property: a `#[shape(get)]` or `#[shape(set)]` fn
struct Accessor {
    ordinal: u32,
    ty: Type,
    visibility: TokenStream,
    tags: TokenStream,
    is_static: bool,
    thunk: TokenStream,
}

#[derive(Default)]
struct PropertyParts {
    get: Option<Accessor>,
    set: Option<Accessor>,
}

#[derive(Default)]
struct Collected {
    fields: Vec<TokenStream>,
    methods: Vec<TokenStream>,
    constructors: Vec<TokenStream>,
    properties: BTreeMap<String, PropertyParts>,
    next_property: u32,
}

enum Receiver {
    None,
    Shared,
    Exclusive,
    /// `self`, `mut self`, `self: Box<Self>` and the like
    Consumed,
}

impl Collected {
    fn constant(&mut self, c: &ImplItemConst) -> syn::Result<()> {
        if MemberAttrs::parse(&c.attrs)?.skip {
            return Ok(());
        }
        let ordinal = self.fields.len() as u32;
        let ident = &c.ident;
        let name = ident.to_string();
        let ty = &c.ty;
        let visibility = attrs::visibility(&c.vis);
        let tags = attrs::tags(&c.attrs)?;

        self.fields.push(quote! {
            ::typeshape::raw::RawField {
                name: #name,
                ordinal: #ordinal,
                visibility: #visibility,
                tags: #tags,
                ty: ::typeshape::raw::TypeLink::of::<#ty>(),
                is_static: true,
                is_literal: true,
                is_readonly: true,
                get: ::typeshape::raw::RawGet::Static(|| ::typeshape::value::boxed(Self::#ident)),
                set: ::std::option::Option::None,
            }
        });
        Ok(())
    }

    fn function(&mut self, f: &ImplItemFn, self_ident: Option<&syn::Ident>) -> syn::Result<()> {
        let member_attrs = MemberAttrs::parse(&f.attrs)?;
        if member_attrs.skip || f.sig.asyncness.is_some() {
            return Ok(());
        }
        // Generic methods have no single shape; `impl Trait` arguments are generic too
        if f.sig.generics.type_params().next().is_some()
            || f.sig.generics.const_params().next().is_some()
            || f.sig.inputs.iter().any(|arg| {
                matches!(arg, FnArg::Typed(t) if matches!(&*t.ty, Type::ImplTrait(_)))
            })
            || matches!(&f.sig.output, ReturnType::Type(_, ty) if contains_impl_trait(ty))
        {
            return Ok(());
        }

        let receiver = match f.sig.inputs.first() {
            Some(FnArg::Receiver(r)) if r.colon_token.is_none() => match (&r.reference, &r.mutability) {
                (Some(_), Some(_)) => Receiver::Exclusive,
                (Some(_), None) => Receiver::Shared,
                (None, _) => Receiver::Consumed,
            },
            Some(FnArg::Receiver(_)) => Receiver::Consumed,
            _ => Receiver::None,
        };

        if member_attrs.get {
            return self.getter(f, &receiver);
        }
        if member_attrs.set {
            return self.setter(f, &receiver);
        }

        let params = Params::collect(f)?;
        if params.unsupported {
            return Ok(());
        }

        if matches!(receiver, Receiver::None) && returns_self(&f.sig.output, self_ident) {
            self.constructor(f, &params)
        } else {
            self.method(f, &receiver, &params)
        }
    }

    fn getter(&mut self, f: &ImplItemFn, receiver: &Receiver) -> syn::Result<()> {
        let ident = &f.sig.ident;
        let ty = match &f.sig.output {
            ReturnType::Type(_, ty) if !matches!(&**ty, Type::Reference(_) | Type::Ptr(_)) => {
                (**ty).clone()
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    &f.sig,
                    "property getters return their value by value",
                ));
            }
        };
        let non_self = f.sig.inputs.iter().filter(|a| matches!(a, FnArg::Typed(_))).count();
        if non_self != 0 {
            return Err(syn::Error::new_spanned(&f.sig, "property getters take no arguments"));
        }

        let (is_static, thunk) = match receiver {
            Receiver::None => (
                true,
                quote!(::typeshape::raw::RawGet::Static(|| ::typeshape::value::boxed(Self::#ident()))),
            ),
            Receiver::Shared => (
                false,
                quote! {
                    ::typeshape::raw::RawGet::Instance(|__instance| {
                        __instance
                            .downcast_ref::<Self>()
                            .map(|__this| ::typeshape::value::boxed(Self::#ident(__this)))
                    })
                },
            ),
            _ => {
                return Err(syn::Error::new_spanned(
                    &f.sig,
                    "property getters take `&self` or no receiver",
                ));
            }
        };

        let accessor = Accessor {
            ordinal: 0,
            ty,
            visibility: attrs::visibility(&f.vis),
            tags: attrs::tags(&f.attrs)?,
            is_static,
            thunk,
        };
        let name = ident.to_string();
        self.property_part(name, accessor, true);
        Ok(())
    }

    fn setter(&mut self, f: &ImplItemFn, receiver: &Receiver) -> syn::Result<()> {
        let ident = &f.sig.ident;
        let typed: Vec<_> = f
            .sig
            .inputs
            .iter()
            .filter_map(|a| match a {
                FnArg::Typed(t) => Some(t),
                FnArg::Receiver(_) => None,
            })
            .collect();
        let ty = match typed.as_slice() {
            [arg] if !matches!(&*arg.ty, Type::Reference(_) | Type::Ptr(_)) => (*arg.ty).clone(),
            _ => {
                return Err(syn::Error::new_spanned(
                    &f.sig,
                    "property setters take exactly one argument by value",
                ));
            }
        };

        let returns_result = setter_returns_result(&f.sig)?;
        let finish_static = finish_setter(quote!(Self::#ident(__value)), returns_result);
        let finish_instance = finish_setter(quote!(Self::#ident(__this, __value)), returns_result);
        let (is_static, thunk) = match receiver {
            Receiver::None => (
                true,
                quote! {
                    ::typeshape::raw::RawSet::Static(|__value| {
                        let __value: #ty = ::typeshape::raw::unbox(__value, 0)?;
                        #finish_static
                    })
                },
            ),
            Receiver::Exclusive => (
                false,
                quote! {
                    ::typeshape::raw::RawSet::Instance(|__instance, __value| {
                        let __this = ::typeshape::raw::receiver::<Self>(__instance)?;
                        let __value: #ty = ::typeshape::raw::unbox(__value, 0)?;
                        #finish_instance
                    })
                },
            ),
            _ => {
                return Err(syn::Error::new_spanned(
                    &f.sig,
                    "property setters take `&mut self` or no receiver",
                ));
            }
        };

        let accessor = Accessor {
            ordinal: 0,
            ty,
            visibility: attrs::visibility(&f.vis),
            tags: attrs::tags(&f.attrs)?,
            is_static,
            thunk,
        };
        let fn_name = ident.to_string();
        let name = fn_name
            .strip_prefix("set_")
            .unwrap_or(&fn_name)
            .to_string();
        self.property_part(name, accessor, false);
        Ok(())
    }

    /// Record one accessor. A property's ordinal is that of its first
    /// accessor in the block.
    fn property_part(&mut self, name: String, mut accessor: Accessor, is_get: bool) {
        let parts = self.properties.entry(name).or_default();
        match parts.get.as_ref().or(parts.set.as_ref()) {
            Some(first) => accessor.ordinal = first.ordinal,
            None => {
                accessor.ordinal = self.next_property;
                self.next_property += 1;
            }
        }
        if is_get {
            parts.get = Some(accessor);
        } else {
            parts.set = Some(accessor);
        }
    }

    fn properties(&self) -> Vec<TokenStream> {
        let mut props: Vec<(&String, &PropertyParts)> = self.properties.iter().collect();
        props.sort_by_key(|(_, parts)| {
            parts
                .get
                .as_ref()
                .or(parts.set.as_ref())
                .map(|a| a.ordinal)
                .unwrap_or(0)
        });

        props
            .into_iter()
            .filter_map(|(name, parts)| {
                let primary = parts.get.as_ref().or(parts.set.as_ref())?;
                let ordinal = primary.ordinal;
                let ty = &primary.ty;
                let visibility = &primary.visibility;
                let tags = &primary.tags;
                let is_static = primary.is_static;
                let get = match &parts.get {
                    Some(a) => {
                        let thunk = &a.thunk;
                        quote!(::std::option::Option::Some(#thunk))
                    }
                    None => quote!(::std::option::Option::None),
                };
                let set = match &parts.set {
                    Some(a) => {
                        let thunk = &a.thunk;
                        quote!(::std::option::Option::Some(#thunk))
                    }
                    None => quote!(::std::option::Option::None),
                };
                Some(quote! {
                    ::typeshape::raw::RawProperty {
                        name: #name,
                        ordinal: #ordinal,
                        visibility: #visibility,
                        tags: #tags,
                        ty: ::typeshape::raw::TypeLink::of::<#ty>(),
                        is_static: #is_static,
                        get: #get,
                        set: #set,
                    }
                })
            })
            .collect()
    }

    fn constructor(&mut self, f: &ImplItemFn, params: &Params) -> syn::Result<()> {
        let ordinal = self.constructors.len() as u32;
        let ident = &f.sig.ident;
        let name = ident.to_string();
        let visibility = attrs::visibility(&f.vis);
        let tags = attrs::tags(&f.attrs)?;
        let raw_params = &params.raw;

        let call = if params.invokable {
            let count = params.bindings.len();
            let arg_iter = params.arg_iter();
            let bindings = &params.bindings;
            let args = &params.args;
            quote! {
                ::std::option::Option::Some(|__args| {
                    ::typeshape::raw::expect_arity(&__args, #count)?;
                    #arg_iter
                    #(#bindings)*
                    ::std::result::Result::Ok(::typeshape::value::boxed(Self::#ident(#(#args),*)))
                })
            }
        } else {
            quote!(::std::option::Option::None)
        };

        self.constructors.push(quote! {
            ::typeshape::raw::RawConstructor {
                name: #name,
                ordinal: #ordinal,
                visibility: #visibility,
                tags: #tags,
                params: ::std::vec![#(#raw_params),*],
                call: #call,
            }
        });
        Ok(())
    }

    fn method(&mut self, f: &ImplItemFn, receiver: &Receiver, params: &Params) -> syn::Result<()> {
        let ordinal = self.methods.len() as u32;
        let ident = &f.sig.ident;
        let name = ident.to_string();
        let visibility = attrs::visibility(&f.vis);
        let tags = attrs::tags(&f.attrs)?;
        let raw_params = &params.raw;
        let ret = Return::of(&f.sig.output);
        let ret_ty = &ret.ty;
        let ret_by_ref = ret.is_by_ref;
        let is_static = matches!(receiver, Receiver::None);
        let consumes = matches!(receiver, Receiver::Consumed);

        let count = params.bindings.len();
        let arg_iter = params.arg_iter();
        let bindings = &params.bindings;
        let args = &params.args;
        let call = if !params.invokable || consumes || ret.is_by_ref || ret.is_pointer {
            quote!(::std::option::Option::None)
        } else if is_static {
            quote! {
                ::std::option::Option::Some(::typeshape::raw::RawCall::Static(|__args| {
                    ::typeshape::raw::expect_arity(&__args, #count)?;
                    #arg_iter
                    #(#bindings)*
                    ::std::result::Result::Ok(::typeshape::value::boxed(Self::#ident(#(#args),*)))
                }))
            }
        } else {
            quote! {
                ::std::option::Option::Some(::typeshape::raw::RawCall::Instance(|__instance, __args| {
                    ::typeshape::raw::expect_arity(&__args, #count)?;
                    let __this = ::typeshape::raw::receiver::<Self>(__instance)?;
                    #arg_iter
                    #(#bindings)*
                    ::std::result::Result::Ok(::typeshape::value::boxed(Self::#ident(__this, #(#args),*)))
                }))
            }
        };

        self.methods.push(quote! {
            ::typeshape::raw::RawMethod {
                name: #name,
                ordinal: #ordinal,
                visibility: #visibility,
                tags: #tags,
                is_static: #is_static,
                consumes_receiver: #consumes,
                params: ::std::vec![#(#raw_params),*],
                ret: ::typeshape::raw::RawReturn {
                    ty: ::typeshape::raw::TypeLink::of::<#ret_ty>(),
                    tags: ::typeshape::tags::Tags::new(),
                    is_by_ref: #ret_by_ref,
                },
                call: #call,
            }
        });
        Ok(())
    }
}

// ============================================================================
// Parameters and returns
// ============================================================================

#[derive(Default)]
struct Params {
    /// `RawParameter` expressions
    raw: Vec<TokenStream>,
    /// `let __aN: T = take_arg(..)?;` statements
    bindings: Vec<TokenStream>,
    /// `__aN` identifiers, in order
    args: Vec<syn::Ident>,
    /// Every parameter is taken by value
    invokable: bool,
    /// A parameter type with no describable shape (`&dyn Trait`)
    unsupported: bool,
}

impl Params {
    /// Iterator over the supplied arguments, when there are any to take
    fn arg_iter(&self) -> Option<TokenStream> {
        (!self.bindings.is_empty()).then(|| quote!(let mut __args = __args.into_iter();))
    }

    fn collect(f: &ImplItemFn) -> syn::Result<Self> {
        let mut params = Params {
            invokable: true,
            ..Default::default()
        };

        let typed = f.sig.inputs.iter().filter_map(|a| match a {
            FnArg::Typed(t) => Some(t),
            FnArg::Receiver(_) => None,
        });
        for (position, arg) in typed.enumerate() {
            let member_attrs = MemberAttrs::parse(&arg.attrs)?;
            let name = match &*arg.pat {
                Pat::Ident(p) => p.ident.to_string().trim_start_matches('_').to_string(),
                _ => format!("arg{}", position),
            };
            let tags = attrs::tags(&arg.attrs)?;
            let position_u32 = position as u32;
            let binding = format_ident!("__a{}", position);

            let (link_ty, is_by_ref, is_out) = match &*arg.ty {
                Type::Reference(r) => match referent(&r.elem) {
                    Some(ty) => (ty, true, r.mutability.is_some()),
                    None => {
                        params.unsupported = true;
                        return Ok(params);
                    }
                },
                other => ((*other).clone(), false, false),
            };
            if is_by_ref || matches!(&*arg.ty, Type::Ptr(_)) {
                params.invokable = false;
            }

            let ty = &arg.ty;
            let default = match (&member_attrs.default, is_option(ty)) {
                (Some(expr), _) => Some(quote!(|| ::typeshape::value::boxed::<#ty>(#expr))),
                (None, true) => Some(quote! {
                    || ::typeshape::value::boxed(<#ty as ::core::default::Default>::default())
                }),
                (None, false) => None,
            };
            let is_optional = default.is_some();
            let default = match default {
                Some(d) => quote!(::std::option::Option::Some(#d)),
                None => quote!(::std::option::Option::None),
            };

            params.raw.push(quote! {
                ::typeshape::raw::RawParameter {
                    name: #name,
                    position: #position_u32,
                    tags: #tags,
                    ty: ::typeshape::raw::TypeLink::of::<#link_ty>(),
                    default: #default,
                    is_optional: #is_optional,
                    is_out: #is_out,
                    is_by_ref: #is_by_ref,
                }
            });
            params.bindings.push(quote! {
                let #binding: #ty = ::typeshape::raw::take_arg(&mut __args, #position)?;
            });
            params.args.push(binding);
        }

        Ok(params)
    }
}

struct Return {
    ty: Type,
    is_by_ref: bool,
    is_pointer: bool,
}

impl Return {
    fn of(output: &ReturnType) -> Self {
        match output {
            ReturnType::Default => Return {
                ty: syn::parse_quote!(()),
                is_by_ref: false,
                is_pointer: false,
            },
            ReturnType::Type(_, ty) => match &**ty {
                Type::Reference(r) => Return {
                    ty: referent(&r.elem).unwrap_or_else(|| syn::parse_quote!(())),
                    is_by_ref: true,
                    is_pointer: false,
                },
                Type::Ptr(_) => Return {
                    ty: (**ty).clone(),
                    is_by_ref: false,
                    is_pointer: true,
                },
                other => Return {
                    ty: other.clone(),
                    is_by_ref: false,
                    is_pointer: false,
                },
            },
        }
    }
}

/// Describable type behind a reference: `str` and slices are described as
/// their `'static` borrowed forms, trait objects not at all
fn referent(elem: &Type) -> Option<Type> {
    match elem {
        Type::Path(p) if p.path.is_ident("str") => Some(syn::parse_quote!(&'static str)),
        Type::Slice(s) => {
            let inner = &s.elem;
            Some(syn::parse_quote!(&'static [#inner]))
        }
        Type::TraitObject(_) | Type::ImplTrait(_) => None,
        other => Some(other.clone()),
    }
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(p) => p
            .path
            .segments
            .last()
            .is_some_and(|s| s.ident == "Option"),
        _ => false,
    }
}

fn contains_impl_trait(ty: &Type) -> bool {
    match ty {
        Type::ImplTrait(_) => true,
        Type::Reference(r) => contains_impl_trait(&r.elem),
        _ => false,
    }
}

/// `-> Self` or `-> TypeName` (the impl's own type)
fn returns_self(output: &ReturnType, self_ident: Option<&syn::Ident>) -> bool {
    let ReturnType::Type(_, ty) = output else {
        return false;
    };
    let Type::Path(TypePath { qself: None, path }) = &**ty else {
        return false;
    };
    if path.is_ident("Self") {
        return true;
    }
    match (path.segments.last(), self_ident) {
        (Some(last), Some(ident)) => path.segments.len() == 1 && last.ident == *ident,
        _ => false,
    }
}

/// Whether a setter reports rejection through a `Result`. Setters return
/// `()` or a `Result`; anything else would be discarded.
fn setter_returns_result(sig: &syn::Signature) -> syn::Result<bool> {
    match &sig.output {
        ReturnType::Default => Ok(false),
        ReturnType::Type(_, ty) => match &**ty {
            Type::Tuple(tuple) if tuple.elems.is_empty() => Ok(false),
            Type::Path(path) if path.path.segments.last().is_some_and(|s| s.ident == "Result") => {
                Ok(true)
            }
            other => Err(syn::Error::new_spanned(
                other,
                "property setters return `()` or a `Result`",
            )),
        },
    }
}

fn finish_setter(call: TokenStream, returns_result: bool) -> TokenStream {
    if returns_result {
        quote! {
            #call.map_err(|__e| {
                ::typeshape::raw::RawCallError::Rejected(::std::string::ToString::to_string(&__e))
            })
        }
    } else {
        quote! {
            #call;
            ::std::result::Result::Ok(())
        }
    }
}
