//! Parsing of `#[shape(..)]` and `#[tag(..)]` attributes

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Expr, ExprLit, ExprUnary, Lit, LitStr, Path, Token, Type, UnOp};

/// Strip our helper attributes, which the compiler would otherwise reject
/// on items an attribute macro re-emits
pub fn strip(attrs: &mut Vec<Attribute>) {
    attrs.retain(|a| !a.path().is_ident("shape") && !a.path().is_ident("tag"));
}

/// `::typeshape::system_type::Visibility` for a declared visibility
pub fn visibility(vis: &syn::Visibility) -> TokenStream {
    match vis {
        syn::Visibility::Public(_) => quote!(::typeshape::system_type::Visibility::Public),
        syn::Visibility::Restricted(_) => quote!(::typeshape::system_type::Visibility::Crate),
        syn::Visibility::Inherited => quote!(::typeshape::system_type::Visibility::Private),
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Collect every `#[tag(..)]` into a `Tags` expression
pub fn tags(attrs: &[Attribute]) -> syn::Result<TokenStream> {
    let mut tags = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("tag")) {
        attr.parse_nested_meta(|meta| {
            let key = meta
                .path
                .get_ident()
                .ok_or_else(|| meta.error("tag keys must be plain identifiers"))?
                .to_string();

            if meta.input.peek(Token![=]) {
                let expr: Expr = meta.value()?.parse()?;
                let value = tag_value(&expr)?;
                tags.push(quote!(::typeshape::tags::Tag::new(#key, #value)));
            } else {
                tags.push(quote!(::typeshape::tags::Tag::marker(#key)));
            }
            Ok(())
        })?;
    }

    if tags.is_empty() {
        return Ok(quote!(::typeshape::tags::Tags::new()));
    }
    Ok(quote!(::typeshape::tags::Tags::from_vec(::std::vec![#(#tags),*])))
}

fn tag_value(expr: &Expr) -> syn::Result<TokenStream> {
    match expr {
        Expr::Lit(ExprLit { lit, .. }) => literal(lit, false),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => match &**expr {
            Expr::Lit(ExprLit { lit, .. }) => literal(lit, true),
            other => Err(syn::Error::new_spanned(other, "expected a literal")),
        },
        other => Err(syn::Error::new_spanned(other, "expected a literal")),
    }
}

fn literal(lit: &Lit, negative: bool) -> syn::Result<TokenStream> {
    let value = match lit {
        Lit::Str(s) if !negative => {
            let s = s.value();
            quote!(::typeshape::tags::TagValue::Str(#s))
        }
        Lit::Bool(b) if !negative => {
            let b = b.value;
            quote!(::typeshape::tags::TagValue::Bool(#b))
        }
        Lit::Int(i) => {
            let mut v: i64 = i.base10_parse()?;
            if negative {
                v = -v;
            }
            quote!(::typeshape::tags::TagValue::Int(#v))
        }
        Lit::Float(f) => {
            let mut v: f64 = f.base10_parse()?;
            if negative {
                v = -v;
            }
            quote!(::typeshape::tags::TagValue::Float(#v))
        }
        other => return Err(syn::Error::new_spanned(other, "unsupported tag value")),
    };
    Ok(value)
}

// ============================================================================
// Type-level shape attributes
// ============================================================================

pub struct EventAttr {
    pub name: LitStr,
    pub handler: Type,
}

#[derive(Default)]
pub struct TypeAttrs {
    pub class: bool,
    pub enumerable: bool,
    pub default: bool,
    pub impl_members: bool,
    pub base: Option<Path>,
    pub implements: Vec<Path>,
    pub definition: Option<LitStr>,
    pub events: Vec<EventAttr>,
}

impl TypeAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = TypeAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("shape")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("class") {
                    out.class = true;
                } else if meta.path.is_ident("enumerable") {
                    out.enumerable = true;
                } else if meta.path.is_ident("default") {
                    out.default = true;
                } else if meta.path.is_ident("impl_members") {
                    out.impl_members = true;
                } else if meta.path.is_ident("base") {
                    out.base = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("definition") {
                    out.definition = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("implements") {
                    meta.parse_nested_meta(|inner| {
                        out.implements.push(inner.path);
                        Ok(())
                    })?;
                } else if meta.path.is_ident("event") {
                    let mut name = None;
                    let mut handler = None;
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("name") {
                            name = Some(inner.value()?.parse::<LitStr>()?);
                        } else if inner.path.is_ident("handler") {
                            let lit: LitStr = inner.value()?.parse()?;
                            handler = Some(lit.parse::<Type>()?);
                        } else {
                            return Err(inner.error("expected `name` or `handler`"));
                        }
                        Ok(())
                    })?;
                    match (name, handler) {
                        (Some(name), Some(handler)) => out.events.push(EventAttr { name, handler }),
                        _ => return Err(meta.error("events need both `name` and `handler`")),
                    }
                } else {
                    return Err(meta.error("unsupported shape attribute"));
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

// ============================================================================
// Field-, member- and parameter-level shape attributes
// ============================================================================

#[derive(Default)]
pub struct MemberAttrs {
    pub skip: bool,
    pub readonly: bool,
    pub get: bool,
    pub set: bool,
    pub default: Option<Expr>,
}

impl MemberAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = MemberAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("shape")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    out.skip = true;
                } else if meta.path.is_ident("readonly") {
                    out.readonly = true;
                } else if meta.path.is_ident("get") {
                    out.get = true;
                } else if meta.path.is_ident("set") {
                    out.set = true;
                } else if meta.path.is_ident("default") {
                    out.default = Some(meta.value()?.parse()?);
                } else {
                    return Err(meta.error("unsupported shape attribute"));
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}
