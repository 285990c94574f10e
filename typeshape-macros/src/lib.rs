//! Procedural macros for Typeshape
//!
//! This crate emits, at compile time, the raw shapes the metadata cache
//! describes:
//!
//! - `#[derive(Introspect)]` - fields, variants, tags and links of a type
//! - `#[introspect_members]` - constants, properties, methods and
//!   constructors of an inherent impl block

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemImpl, parse_macro_input};

mod attrs;
mod derive;
mod members;

/// Implement `typeshape::Introspect` for a struct or field-less enum.
///
/// # Usage
///
/// ```ignore
/// #[derive(Introspect, Clone, Default)]
/// #[shape(class, default, impl_members)]
/// #[tag(graphql_name = "Show")]
/// pub struct Show {
///     #[shape(readonly)]
///     pub id: Uuid,
///     pub title: String,
///     #[tag(deprecated)]
///     pub year: Option<i32>,
///     #[shape(skip)]
///     cache: Vec<u8>,
/// }
///
/// #[derive(Introspect, Clone, Copy)]
/// #[repr(u8)]
/// pub enum Quality {
///     Low = 1,
///     High = 2,
/// }
/// ```
///
/// # Attributes
///
/// On the type:
///
/// - `#[shape(class)]` - describe as a class rather than a struct
/// - `#[shape(enumerable)]` - the type iterates its elements
/// - `#[shape(base = Path)]` - base type link
/// - `#[shape(implements(Trait, ...))]` - implemented interfaces
/// - `#[shape(impl_members)]` - merge members from `#[introspect_members]`
/// - `#[shape(default)]` - the type implements `Default`
/// - `#[shape(definition = "...")]` - override the definition key
/// - `#[shape(event(name = "...", handler = "fn(..)"))]` - declare an event
///
/// On fields: `#[shape(skip)]`, `#[shape(readonly)]`. Anywhere:
/// `#[tag(key)]` and `#[tag(key = literal)]`.
#[proc_macro_derive(Introspect, attributes(shape, tag))]
pub fn derive_introspect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Describe the members of an inherent impl block.
///
/// Pair with `#[shape(impl_members)]` on the type's derive.
///
/// ```ignore
/// #[introspect_members]
/// impl Show {
///     pub const MAX_SEASONS: u32 = 40;
///
///     pub fn new(title: String) -> Self { .. }
///
///     #[shape(get)]
///     pub fn display_title(&self) -> String { .. }
///
///     #[shape(set)]
///     pub fn set_display_title(&mut self, value: String) { .. }
///
///     pub fn rate(&mut self, score: u8, #[shape(default = 1)] weight: u32) -> f64 { .. }
/// }
/// ```
///
/// - associated consts become literal static fields
/// - `fn .. -> Self` without a receiver becomes a constructor
/// - `#[shape(get)]` / `#[shape(set)]` fns become properties (`set_` is
///   stripped from setter names)
/// - every other fn becomes an instance or static method
///
/// Methods taking references or raw pointers, taking `self` by value, or
/// returning references are described but cannot be invoked. Generic and
/// `async` fns are left out.
#[proc_macro_attribute]
pub fn introspect_members(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = parse_macro_input!(item as ItemImpl);
    members::expand(item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
