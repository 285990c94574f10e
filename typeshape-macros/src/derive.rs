//! `#[derive(Introspect)]`

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{
    Data, DataEnum, DataStruct, DeriveInput, Fields, Ident, Index, LitStr, parse_quote,
};

use crate::attrs::{self, MemberAttrs, TypeAttrs};

pub fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "Introspect types cannot borrow; remove the lifetime parameter",
        ));
    }

    let type_attrs = TypeAttrs::parse(&input.attrs)?;
    match &input.data {
        Data::Struct(data) => expand_struct(&input, &type_attrs, data),
        Data::Enum(data) => expand_enum(&input, &type_attrs, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Introspect cannot be derived for unions",
        )),
    }
}

/// Statements shared by structs and enums: visibility, tags, base,
/// interfaces, events and impl-block members
fn common(input: &DeriveInput, type_attrs: &TypeAttrs) -> syn::Result<TokenStream> {
    let visibility = attrs::visibility(&input.vis);
    let tags = attrs::tags(&input.attrs)?;

    let base = type_attrs.base.as_ref().map(|base| {
        quote!(__raw.base = ::std::option::Option::Some(::typeshape::raw::TypeLink::of::<#base>());)
    });
    let enumerable = type_attrs
        .enumerable
        .then(|| quote!(__raw.enumerable = true;));

    let interfaces = &type_attrs.implements;
    let interfaces = (!interfaces.is_empty()).then(|| {
        quote! {
            __raw.interfaces = ::std::vec![
                #(::typeshape::handle::TypeHandle::of::<dyn #interfaces>()),*
            ];
        }
    });

    let events = type_attrs.events.iter().enumerate().map(|(ordinal, event)| {
        let ordinal = ordinal as u32;
        let name = &event.name;
        let handler = &event.handler;
        quote! {
            __raw.members.events.push(::typeshape::raw::RawEvent {
                name: #name,
                ordinal: #ordinal,
                visibility: ::typeshape::system_type::Visibility::Public,
                tags: ::typeshape::tags::Tags::new(),
                handler: ::typeshape::raw::TypeLink::of::<#handler>(),
            });
        }
    });

    let impl_members = type_attrs.impl_members.then(|| {
        quote!(__raw.members.merge(<Self as ::typeshape::raw::ImplMembers>::impl_members());)
    });

    Ok(quote! {
        __raw.visibility = #visibility;
        __raw.tags = #tags;
        #base
        #enumerable
        #interfaces
        #(#events)*
        #impl_members
    })
}

fn definition(input: &DeriveInput, type_attrs: &TypeAttrs) -> TokenStream {
    match &type_attrs.definition {
        Some(definition) => quote!(#definition),
        None => {
            let suffix = LitStr::new(&format!("::{}", input.ident), Span::call_site());
            quote!(::core::concat!(::core::module_path!(), #suffix))
        }
    }
}

fn default_value(type_attrs: &TypeAttrs) -> Option<TokenStream> {
    type_attrs.default.then(|| {
        quote! {
            fn default_value() -> ::std::option::Option<::typeshape::value::Value> {
                ::std::option::Option::Some(::typeshape::value::boxed(
                    <Self as ::core::default::Default>::default(),
                ))
            }
        }
    })
}

// ============================================================================
// Structs
// ============================================================================

fn expand_struct(
    input: &DeriveInput,
    type_attrs: &TypeAttrs,
    data: &DataStruct,
) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let name = ident.to_string();
    let kind = if type_attrs.class {
        quote!(::typeshape::system_type::Kind::Class)
    } else {
        quote!(::typeshape::system_type::Kind::Struct)
    };

    let mut generics = input.generics.clone();
    let type_params: Vec<Ident> = generics.type_params().map(|p| p.ident.clone()).collect();
    {
        let where_clause = generics.make_where_clause();
        for param in &type_params {
            where_clause.predicates.push(parse_quote! {
                #param: ::typeshape::raw::Introspect
                    + ::core::clone::Clone
                    + ::core::marker::Send
                    + ::core::marker::Sync
            });
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let definition = definition(input, type_attrs);
    let header = if type_params.is_empty() {
        quote! {
            let mut __raw = ::typeshape::raw::RawType::new::<Self>(#name, #definition, #kind);
        }
    } else {
        quote! {
            let __args = ::std::vec![#(::typeshape::raw::TypeLink::of::<#type_params>()),*];
            let mut __raw = ::typeshape::raw::RawType::new::<Self>(
                ::typeshape::raw::generic_name(#name, &__args),
                #definition,
                #kind,
            )
            .with_generic_args(__args);
        }
    };

    let fields = struct_fields(&data.fields)?;
    let common = common(input, type_attrs)?;
    let default_value = default_value(type_attrs);

    Ok(quote! {
        impl #impl_generics ::typeshape::raw::Introspect for #ident #ty_generics #where_clause {
            fn introspect() -> ::typeshape::raw::RawType {
                #header
                #(#fields)*
                #common
                __raw
            }

            #default_value
        }
    })
}

fn struct_fields(fields: &Fields) -> syn::Result<Vec<TokenStream>> {
    let mut out = Vec::new();
    let mut ordinal = 0u32;

    for (index, field) in fields.iter().enumerate() {
        let member_attrs = MemberAttrs::parse(&field.attrs)?;
        if member_attrs.skip {
            continue;
        }

        let (name, access) = match &field.ident {
            Some(ident) => (ident.to_string(), quote!(#ident)),
            None => {
                let index = Index::from(index);
                (index.index.to_string(), quote!(#index))
            }
        };
        let ty = &field.ty;
        let visibility = attrs::visibility(&field.vis);
        let tags = attrs::tags(&field.attrs)?;
        let readonly = member_attrs.readonly;

        let set = if readonly {
            quote!(::std::option::Option::None)
        } else {
            quote! {
                ::std::option::Option::Some(::typeshape::raw::RawSet::Instance(|__instance, __value| {
                    let __this = ::typeshape::raw::receiver::<Self>(__instance)?;
                    ::typeshape::raw::assign(&mut __this.#access, __value)
                }))
            }
        };

        out.push(quote! {
            __raw.members.fields.push(::typeshape::raw::RawField {
                name: #name,
                ordinal: #ordinal,
                visibility: #visibility,
                tags: #tags,
                ty: ::typeshape::raw::TypeLink::of::<#ty>(),
                is_static: false,
                is_literal: false,
                is_readonly: #readonly,
                get: ::typeshape::raw::RawGet::Instance(|__instance| {
                    __instance.downcast_ref::<Self>().map(|__this| {
                        ::typeshape::value::boxed(::core::clone::Clone::clone(&__this.#access))
                    })
                }),
                set: #set,
            });
        });
        ordinal += 1;
    }

    Ok(out)
}

// ============================================================================
// Enums
// ============================================================================

const REPR_INTS: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];

/// Integer type named by `#[repr(..)]`, defaulting to `isize`
fn underlying(input: &DeriveInput) -> syn::Result<Ident> {
    let mut repr = None;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("repr")) {
        attr.parse_nested_meta(|meta| {
            if let Some(ident) = meta.path.get_ident() {
                if REPR_INTS.contains(&ident.to_string().as_str()) {
                    repr = Some(ident.clone());
                }
            }
            // align(N), packed(N)
            if meta.input.peek(syn::token::Paren) {
                let _args;
                syn::parenthesized!(_args in meta.input);
            }
            Ok(())
        })?;
    }
    Ok(repr.unwrap_or_else(|| format_ident!("isize")))
}

fn expand_enum(
    input: &DeriveInput,
    type_attrs: &TypeAttrs,
    data: &DataEnum,
) -> syn::Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Introspect enums cannot be generic",
        ));
    }
    if let Some(variant) = data.variants.iter().find(|v| !matches!(v.fields, Fields::Unit)) {
        return Err(syn::Error::new_spanned(
            variant,
            "Introspect enums must be field-less",
        ));
    }

    let ident = &input.ident;
    let name = ident.to_string();
    let definition = definition(input, type_attrs);
    let underlying = underlying(input)?;

    let mut variants = Vec::new();
    for (ordinal, variant) in data.variants.iter().enumerate() {
        let member_attrs = MemberAttrs::parse(&variant.attrs)?;
        if member_attrs.skip {
            continue;
        }
        let ordinal = ordinal as u32;
        let variant_ident = &variant.ident;
        let variant_name = variant_ident.to_string();
        let tags = attrs::tags(&variant.attrs)?;
        variants.push(quote! {
            __raw.members.fields.push(::typeshape::raw::RawField {
                name: #variant_name,
                ordinal: #ordinal,
                visibility: ::typeshape::system_type::Visibility::Public,
                tags: #tags,
                ty: ::typeshape::raw::TypeLink::of::<Self>(),
                is_static: true,
                is_literal: true,
                is_readonly: true,
                get: ::typeshape::raw::RawGet::Static(|| ::typeshape::value::boxed(#ident::#variant_ident)),
                set: ::std::option::Option::None,
            });
        });
    }

    let arms = data.variants.iter().map(|variant| {
        let variant_ident = &variant.ident;
        quote! {
            if __n == (#ident::#variant_ident as i128) {
                return ::std::result::Result::Ok(::typeshape::value::boxed(#ident::#variant_ident));
            }
        }
    });

    let common = common(input, type_attrs)?;
    let default_value = default_value(type_attrs);

    Ok(quote! {
        impl ::typeshape::raw::Introspect for #ident {
            fn introspect() -> ::typeshape::raw::RawType {
                let mut __raw = ::typeshape::raw::RawType::new::<Self>(
                    #name,
                    #definition,
                    ::typeshape::system_type::Kind::Enum,
                );
                __raw.underlying = ::std::option::Option::Some(
                    ::typeshape::raw::TypeLink::of::<#underlying>(),
                );
                #(#variants)*
                #common
                __raw
            }

            /// Variants from their discriminant, through any integer shape
            fn coerce(
                value: ::typeshape::value::Value,
            ) -> ::std::result::Result<::typeshape::value::Value, ::typeshape::value::Value> {
                let __n = match ::typeshape::value::Number::of(&*value)
                    .and_then(::typeshape::value::Number::as_i128)
                {
                    ::std::option::Option::Some(__n) => __n,
                    ::std::option::Option::None => return ::std::result::Result::Err(value),
                };
                #(#arms)*
                ::std::result::Result::Err(value)
            }

            #default_value
        }
    })
}
