//! Typeshape - type metadata cache and compiled accessor engine
//!
//! Describes Rust types once, at first use, and caches the result:
//!
//! - [classifier] - maps every type to one [SystemType]
//! - [enclosed] - the logical contained type of wrappers and collections
//! - [members] - immutable descriptors for types and their members
//! - [accessor] - compiled getters, setters, invokers and factories
//! - [cache] - the [MetadataCache], one descriptor per type handle
//!
//! Shapes come from the [Introspect] trait, implemented for the standard
//! types in [builtin] and for user types by `#[derive(Introspect)]` and
//! `#[introspect_members]`.
//!
//! ```ignore
//! #[derive(Introspect, Clone, Default)]
//! #[shape(default, impl_members)]
//! pub struct Show {
//!     pub title: String,
//!     pub year: Option<i32>,
//! }
//!
//! #[introspect_members]
//! impl Show {
//!     pub fn rename(&mut self, title: String) { self.title = title; }
//! }
//!
//! let cache = MetadataCache::default();
//! let show = cache.get::<Show>()?;
//! let title = show.field("title").unwrap().get_value(&instance)?;
//! ```

extern crate self as typeshape;

pub mod accessor;
pub mod builtin;
pub mod cache;
pub mod classifier;
pub mod config;
mod describe;
pub mod enclosed;
pub mod error;
pub mod handle;
pub mod logging;
pub mod members;
pub mod raw;
pub mod summary;
pub mod system_type;
pub mod tags;
pub mod value;

pub use builtin::BoxFuture;
pub use cache::MetadataCache;
pub use config::{CacheConfig, LogFormat};
pub use enclosed::KeyValuePair;
pub use error::{Result, ShapeError};
pub use handle::{MemberHandle, MemberKind, TypeHandle};
pub use members::{
    ConstructorMember, Descriptor, EventMember, FieldMember, Member, MethodMember, Parameter,
    PropertyMember, ReturnParameter, TypeMember, TypeRef,
};
pub use raw::{ImplMembers, Introspect};
pub use summary::{MemberSummary, TypeSummary};
pub use system_type::{Kind, SystemType, Visibility};
pub use tags::{Tag, TagValue, Tags};
pub use value::{Null, Value};

pub use typeshape_macros::{Introspect, introspect_members};
