//! Integration tests for the metadata cache
//!
//! These tests describe derived models end to end:
//! - Descriptor identity and member order
//! - Field, property and method access through compiled accessors
//! - Constructors and default instances
//! - Concurrent first-time lookups
//! - Build-time precondition failures
//! - Enclosed types, recursion and tags

use std::collections::HashMap;
use std::sync::Arc;

use assert_matches::assert_matches;
use typeshape::value::{self, boxed, null};
use typeshape::{
    Descriptor, Introspect, Kind, MetadataCache, ShapeError, SystemType, TagValue, TypeHandle,
    Visibility, introspect_members,
};

// ============================================================================
// Models
// ============================================================================

trait Rated {
    fn score(&self) -> f64;
}

#[derive(Introspect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[shape(default)]
#[repr(u8)]
pub enum Resolution {
    #[default]
    Sd = 1,
    Hd = 2,
    #[tag(label = "2160p")]
    Uhd = 4,
}

#[derive(Introspect, Debug, Clone, Default)]
#[shape(class, default)]
pub struct Entity {
    #[shape(readonly)]
    pub id: u64,
}

#[derive(Introspect, Debug, Clone, Default, PartialEq)]
#[shape(class, default, impl_members, base = Entity, implements(Rated))]
#[shape(event(name = "renamed", handler = "fn(String, String)"))]
#[tag(graphql_name = "Movie")]
#[tag(cache_seconds = 300)]
pub struct Movie {
    #[shape(readonly)]
    pub id: u64,
    #[tag(searchable)]
    pub title: String,
    pub year: Option<i32>,
    pub resolution: Resolution,
    pub genres: Vec<String>,
    pub(crate) runtime: u32,
    secret: String,
}

#[introspect_members]
impl Movie {
    pub const MAX_TITLE: usize = 200;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn titled(title: String) -> Self {
        Self {
            title,
            ..Self::default()
        }
    }

    pub fn full(id: u64, title: String, year: i32, resolution: Resolution, runtime: u32) -> Self {
        Self {
            id,
            title,
            year: Some(year),
            resolution,
            runtime,
            ..Self::default()
        }
    }

    #[shape(get)]
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }

    #[shape(get)]
    pub fn hours(&self) -> f64 {
        self.runtime as f64 / 60.0
    }

    #[shape(set)]
    pub fn set_hours(&mut self, hours: f64) {
        self.runtime = (hours * 60.0) as u32;
    }

    pub fn add_genre(&mut self, genre: String, #[tag(optional)] position: Option<usize>) -> usize {
        match position {
            Some(index) if index <= self.genres.len() => self.genres.insert(index, genre),
            _ => self.genres.push(genre),
        }
        self.genres.len()
    }

    pub fn rename(&mut self, title: String) {
        self.title = title;
    }

    pub fn extend_runtime(&mut self, minutes: u32, #[shape(default = 2u32)] times: u32) -> u32 {
        self.runtime += minutes * times;
        self.runtime
    }

    pub fn normalize(title: String) -> String {
        title.trim().to_lowercase()
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }

    pub fn peek_raw(&self, ptr: *const u8) -> bool {
        !ptr.is_null() && !self.title.is_empty()
    }

    pub fn title_ref(&self) -> &String {
        &self.title
    }

    pub fn into_title(self) -> String {
        self.title
    }
}

impl Rated for Movie {
    fn score(&self) -> f64 {
        self.runtime as f64
    }
}

/// Self-referencing tree
#[derive(Introspect, Debug, Clone, Default)]
#[shape(class, default)]
struct Category {
    pub name: String,
    pub children: Vec<Category>,
    pub parent: Option<Box<Category>>,
}

#[derive(Introspect, Debug, Clone)]
struct Page<T> {
    items: Vec<T>,
    total: u64,
}

#[derive(Introspect, Debug, Clone)]
#[shape(enumerable)]
struct Watchlist {
    entries: Vec<u64>,
}

/// Setter that validates its input
#[derive(Introspect, Debug, Clone, Default)]
#[shape(class, default, impl_members)]
struct Budget {
    limit: i64,
}

#[introspect_members]
impl Budget {
    #[shape(get)]
    pub fn limit(&self) -> i64 {
        self.limit
    }

    #[shape(set)]
    pub fn set_limit(&mut self, limit: i64) -> Result<(), String> {
        if limit < 0 {
            return Err(format!("limit must not be negative, got {}", limit));
        }
        self.limit = limit;
        Ok(())
    }
}

fn cache() -> MetadataCache {
    MetadataCache::default()
}

// ============================================================================
// Descriptors
// ============================================================================

mod descriptors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_descriptor_is_built_once_and_shared() {
        let cache = cache();
        let first = cache.get::<Movie>().unwrap();
        let second = cache.get::<Movie>().unwrap();
        let by_handle = cache.get_by_handle(TypeHandle::of::<Movie>()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &by_handle));
        assert_eq!(cache.build_count(TypeHandle::of::<Movie>()), 1);
    }

    #[test]
    fn test_type_level_shape() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();

        assert_eq!(movie.name(), "Movie");
        assert_eq!(movie.kind(), Kind::Class);
        assert_eq!(movie.visibility(), Visibility::Public);
        assert_eq!(movie.system_type(), SystemType::Unknown);
        assert_eq!(movie.base().unwrap().name(), "Entity");
        assert!(movie.implements::<dyn Rated>());
        assert!(movie.definition().ends_with("::Movie"));
    }

    #[test]
    fn test_fields_in_declaration_order() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let names: Vec<_> = movie.fields().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec!["id", "title", "year", "resolution", "genres", "runtime", "MAX_TITLE"]
        );

        let ordinals: Vec<_> = movie.fields().map(|f| f.handle().ordinal).collect();
        let mut sorted = ordinals.clone();
        sorted.sort();
        assert_eq!(ordinals, sorted);
    }

    #[test]
    fn test_private_fields_need_opt_in() {
        let cache = cache();
        assert!(cache.get::<Movie>().unwrap().field("secret").is_none());

        let cache = MetadataCache::new(typeshape::CacheConfig {
            include_private: true,
            ..Default::default()
        });
        let secret = cache.get::<Movie>().unwrap().field("secret").cloned().unwrap();
        assert_eq!(secret.visibility(), Visibility::Private);
    }

    #[test]
    fn test_member_kinds() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();

        let properties: Vec<_> = movie.properties().map(|p| p.name()).collect();
        assert_eq!(properties, vec!["label", "hours"]);
        assert!(movie.property("hours").unwrap().can_write());
        assert!(!movie.property("label").unwrap().can_write());

        assert_eq!(movie.constructors().len(), 3);
        assert_eq!(movie.methods("rename").len(), 1);
        assert!(movie.methods("missing").is_empty());
        assert_eq!(
            movie.event("renamed").unwrap().handler_type().name(),
            "fn(String, String) -> ()"
        );
    }

    #[test]
    fn test_declaring_type_back_reference() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        for member in movie.members() {
            let declaring = member.declaring_type().get().unwrap();
            assert!(Arc::ptr_eq(&declaring, &movie));
            assert_eq!(member.handle().declaring, TypeHandle::of::<Movie>());
        }
    }

    #[test]
    fn test_method_parameters() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let add_genre = &movie.methods("add_genre")[0];

        let params = add_genre.params();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name(), "genre");
        assert_eq!(params[0].position(), 0);
        assert!(!params[0].is_optional());
        assert!(params[1].is_optional());
        assert!(params[1].tags().has("optional"));
        assert_eq!(add_genre.return_parameter().return_type().name(), "usize");
        assert_eq!(
            add_genre.signature(),
            "add_genre(genre: String, position: Option<usize>) -> usize"
        );
    }

    #[test]
    fn test_enum_descriptor() {
        let cache = cache();
        let resolution = cache.get::<Resolution>().unwrap();

        assert_eq!(resolution.kind(), Kind::Enum);
        assert_eq!(resolution.system_type(), SystemType::U8);
        let variants: Vec<_> = resolution.fields().map(|f| f.name()).collect();
        assert_eq!(variants, vec!["Sd", "Hd", "Uhd"]);

        let uhd = resolution.field("Uhd").unwrap();
        assert!(uhd.is_literal());
        let value = uhd.get_static().unwrap();
        assert_eq!(value::into::<Resolution>(value).unwrap(), Resolution::Uhd);
    }
}

// ============================================================================
// Field and property access
// ============================================================================

mod accessors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_round_trip() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let title = movie.field("title").unwrap();

        let mut instance = Movie::default();
        title.set_value(&mut instance, boxed("Heat".to_string())).unwrap();
        assert_eq!(instance.title, "Heat");

        let read = title.get_value(&instance).unwrap();
        assert_eq!(value::into::<String>(read).unwrap(), "Heat");
    }

    #[test]
    fn test_optional_field_accepts_payload_and_null() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let year = movie.field("year").unwrap();
        let mut instance = Movie::default();

        year.set_value(&mut instance, boxed(1995i32)).unwrap();
        assert_eq!(instance.year, Some(1995));

        // narrower integer, converted once at bind time
        year.set_value(&mut instance, boxed(2001i16)).unwrap();
        assert_eq!(instance.year, Some(2001));

        year.set_value(&mut instance, null()).unwrap();
        assert_eq!(instance.year, None);
        let read = year.get_value(&instance).unwrap();
        assert_eq!(value::into::<Option<i32>>(read).unwrap(), None);
    }

    #[test]
    fn test_enum_field_from_discriminant() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let resolution = movie.field("resolution").unwrap();
        let mut instance = Movie::default();

        resolution.set_value(&mut instance, boxed(4u8)).unwrap();
        assert_eq!(instance.resolution, Resolution::Uhd);
        resolution.set_value(&mut instance, boxed(2i64)).unwrap();
        assert_eq!(instance.resolution, Resolution::Hd);
        assert_matches!(
            resolution.set_value(&mut instance, boxed(3u8)),
            Err(ShapeError::ArgumentType { .. })
        );
    }

    #[test]
    fn test_mismatched_value_is_rejected() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let mut instance = Movie::default();
        assert_matches!(
            movie.field("title").unwrap().set_value(&mut instance, boxed(5i32)),
            Err(ShapeError::ArgumentType { .. })
        );
        assert_eq!(instance.title, "");
    }

    #[test]
    fn test_default_instance_values() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let instance = value::into::<Movie>(movie.create_default().unwrap()).unwrap();
        assert_eq!(instance, Movie::default());

        let genres = movie.field("genres").unwrap().get_value(&instance).unwrap();
        assert!(value::into::<Vec<String>>(genres).unwrap().is_empty());
    }

    #[test]
    fn test_properties() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let mut instance = Movie::full(1, "Alien".into(), 1979, Resolution::Hd, 117);

        let label = movie.property("label").unwrap().get_value(&instance).unwrap();
        assert_eq!(value::into::<String>(label).unwrap(), "Alien (1979)");

        let hours = movie.property("hours").unwrap();
        hours.set_value(&mut instance, boxed(2i32)).unwrap();
        assert_eq!(instance.runtime, 120);
        let read = hours.get_value(&instance).unwrap();
        assert_eq!(value::into::<f64>(read).unwrap(), 2.0);
    }

    #[test]
    fn test_field_round_trip_with_type_defaults() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let mut instance = Movie::full(7, "Ronin".into(), 1998, Resolution::Uhd, 122);
        instance.genres.push("Thriller".into());

        let writable: Vec<_> = movie.fields().filter(|f| f.can_write()).collect();
        assert_eq!(
            writable.iter().map(|f| f.name()).collect::<Vec<_>>(),
            vec!["title", "year", "resolution", "genres", "runtime"]
        );
        for field in &writable {
            let default = cache.resolve(field.field_type()).unwrap().create_default().unwrap();
            field.set_value(&mut instance, default).unwrap();
        }

        assert_eq!(instance, Movie { id: 7, ..Movie::default() });

        let read = |name: &str| movie.field(name).unwrap().get_value(&instance).unwrap();
        assert_eq!(value::into::<String>(read("title")).unwrap(), String::new());
        assert_eq!(value::into::<Option<i32>>(read("year")).unwrap(), None);
        assert_eq!(value::into::<Resolution>(read("resolution")).unwrap(), Resolution::Sd);
        assert!(value::into::<Vec<String>>(read("genres")).unwrap().is_empty());
        assert_eq!(value::into::<u32>(read("runtime")).unwrap(), 0);
    }

    #[test]
    fn test_setter_errors_are_reported() {
        let cache = cache();
        let budget = cache.get::<Budget>().unwrap();
        let limit = budget.property("limit").unwrap();
        let mut instance = Budget::default();

        limit.set_value(&mut instance, boxed(40i64)).unwrap();
        assert_eq!(instance.limit, 40);

        assert_matches!(
            limit.set_value(&mut instance, boxed(-5i64)),
            Err(ShapeError::ValueRejected { member, reason, .. })
                if member == "limit" && reason.contains("negative")
        );
        assert_eq!(instance.limit, 40);
    }

    #[test]
    fn test_wrong_receiver() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        assert_matches!(
            movie.field("title").unwrap().get_value(&Entity::default()),
            Err(ShapeError::ReceiverType { .. })
        );
    }
}

// ============================================================================
// Invocation
// ============================================================================

mod invocation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_instance_method() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let mut instance = Movie::default();

        let rename = &movie.methods("rename")[0];
        let result = rename
            .invoke(&mut instance, vec![boxed("Ran".to_string())])
            .unwrap();
        assert!(value::is_unit(&result));
        assert_eq!(instance.title, "Ran");
    }

    #[test]
    fn test_optional_parameters_fill_from_defaults() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let mut instance = Movie::default();

        let add_genre = &movie.methods("add_genre")[0];
        add_genre
            .invoke(&mut instance, vec![boxed("drama".to_string())])
            .unwrap();
        let len = add_genre
            .invoke(
                &mut instance,
                vec![boxed("crime".to_string()), boxed(Some(0usize))],
            )
            .unwrap();
        assert_eq!(value::into::<usize>(len).unwrap(), 2);
        assert_eq!(instance.genres, vec!["crime", "drama"]);

        let extend = &movie.methods("extend_runtime")[0];
        let runtime = extend.invoke(&mut instance, vec![boxed(10u32)]).unwrap();
        assert_eq!(value::into::<u32>(runtime).unwrap(), 20);
    }

    #[test]
    fn test_argument_count_checked() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let mut instance = Movie::default();
        assert_matches!(
            movie.methods("rename")[0].invoke(&mut instance, vec![]),
            Err(ShapeError::ArgumentCount { expected: 1, found: 0, .. })
        );
    }

    #[test]
    fn test_static_method() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let normalize = &movie.methods("normalize")[0];

        assert!(normalize.is_static());
        let result = normalize
            .invoke_static(vec![boxed("  The Thing ".to_string())])
            .unwrap();
        assert_eq!(value::into::<String>(result).unwrap(), "the thing");

        let mut instance = Movie::default();
        assert_matches!(
            normalize.invoke(&mut instance, vec![boxed(String::new())]),
            Err(ShapeError::StructuralViolation { .. })
        );
    }

    #[test]
    fn test_constructors_with_zero_one_and_five_parameters() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let ctors = movie.constructors();

        let empty = ctors.iter().find(|c| c.name() == "new").unwrap();
        assert!(empty.is_parameterless());
        let created: Movie = empty.create_as(vec![]).unwrap();
        assert_eq!(created, Movie::default());

        let titled = ctors.iter().find(|c| c.name() == "titled").unwrap();
        let created: Movie = titled.create_as(vec![boxed("Solaris".to_string())]).unwrap();
        assert_eq!(created.title, "Solaris");

        let full = ctors.iter().find(|c| c.name() == "full").unwrap();
        assert_eq!(full.params().len(), 5);
        let created: Movie = full
            .create_as(vec![
                boxed(7u64),
                boxed("Stalker".to_string()),
                boxed(1979i32),
                boxed(2u8),
                boxed(161u32),
            ])
            .unwrap();
        assert_eq!(created.id, 7);
        assert_eq!(created.year, Some(1979));
        assert_eq!(created.resolution, Resolution::Hd);
        assert_eq!(created.runtime, 161);
    }

    #[test]
    fn test_lookup_through_cache() {
        let cache = cache();
        let handle = cache.register::<Movie>();
        let rename = cache.methods(handle, "rename").unwrap();
        assert_eq!(rename.len(), 1);
        assert_matches!(
            cache.property(handle, "missing"),
            Err(ShapeError::MemberNotFound { member_kind: "property", .. })
        );
    }
}

// ============================================================================
// Concurrency
// ============================================================================

mod concurrency {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_hundred_concurrent_first_lookups_share_one_descriptor() {
        let cache = Arc::new(cache());
        let barrier = Arc::new(Barrier::new(100));

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let cache = cache.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    cache.get::<Movie>().unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
        assert_eq!(cache.build_count(TypeHandle::of::<Movie>()), 1);
        assert_eq!(cache.build_count(TypeHandle::of::<Entity>()), 1);
    }

    #[test]
    fn test_unrelated_types_build_concurrently() {
        let cache = Arc::new(cache());
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = cache.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    match i % 2 {
                        0 => cache.get::<Category>().unwrap().name().to_string(),
                        _ => cache.get::<Page<Movie>>().unwrap().name().to_string(),
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.build_count(TypeHandle::of::<Category>()), 1);
        assert_eq!(cache.build_count(TypeHandle::of::<Page<Movie>>()), 1);
        assert_eq!(cache.build_count(TypeHandle::of::<Movie>()), 1);
    }
}

// ============================================================================
// Preconditions
// ============================================================================

mod preconditions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_constant_has_no_setter() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let max = movie.field("MAX_TITLE").unwrap();

        assert!(max.is_static());
        assert!(!max.can_write());
        assert_matches!(max.setter(), Err(ShapeError::StructuralViolation { .. }));
        assert_matches!(
            max.set_static(boxed(10usize)),
            Err(ShapeError::StructuralViolation { .. })
        );
        assert_eq!(value::into::<usize>(max.get_static().unwrap()).unwrap(), 200);
    }

    #[test]
    fn test_readonly_field_has_no_setter() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let id = movie.field("id").unwrap();
        let mut instance = Movie::default();

        assert!(id.is_readonly());
        assert_matches!(
            id.set_value(&mut instance, boxed(3u64)),
            Err(ShapeError::StructuralViolation { .. })
        );
    }

    #[test]
    fn test_static_and_instance_paths_do_not_mix() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        assert_matches!(
            movie.field("title").unwrap().get_static(),
            Err(ShapeError::StructuralViolation { .. })
        );
        assert_matches!(
            movie.field("MAX_TITLE").unwrap().get_value(&Movie::default()),
            Err(ShapeError::StructuralViolation { .. })
        );
    }

    #[test]
    fn test_non_invokable_members_are_flagged() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let mut instance = Movie::default();

        let peek = &movie.methods("peek_raw")[0];
        assert!(!peek.is_invokable());
        assert_matches!(
            peek.invoke(&mut instance, vec![boxed(std::ptr::null::<u8>() as usize)]),
            Err(ShapeError::UnsupportedShape { kind, member, declaring_type })
                if kind == "Pointer" && member == "peek_raw" && declaring_type == "Movie"
        );

        assert_matches!(
            movie.methods("has_genre")[0].invoker(),
            Err(ShapeError::UnsupportedShape { kind, .. }) if kind == "ByRef"
        );
        assert!(movie.methods("has_genre")[0].params()[0].is_by_ref());
        assert_matches!(
            movie.methods("title_ref")[0].invoker(),
            Err(ShapeError::UnsupportedShape { kind, .. }) if kind == "ByRef"
        );
        assert_matches!(
            movie.methods("into_title")[0].invoker(),
            Err(ShapeError::UnsupportedShape { kind, .. }) if kind == "ByValueReceiver"
        );
    }
}

// ============================================================================
// Enclosed types, recursion and tags
// ============================================================================

mod shapes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collections_expose_enclosed_type() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();
        let genres = movie.field("genres").unwrap().field_type().get().unwrap();

        assert_eq!(genres.system_type(), SystemType::List);
        assert!(genres.system_type().is_collection());
        assert_eq!(genres.enclosed_type().unwrap().name(), "String");
    }

    #[test]
    fn test_dictionary_encloses_pair_shape() {
        let cache = cache();
        let map = cache.get::<HashMap<String, Movie>>().unwrap();
        assert!(map.system_type().is_dictionary());

        let pair = cache.resolve(map.enclosed_type().unwrap()).unwrap();
        assert_eq!(pair.system_type(), SystemType::KeyValuePair);
        let value = pair.field("value").unwrap().field_type().handle();
        assert_eq!(value, TypeHandle::of::<Movie>());
    }

    #[test]
    fn test_generic_arguments() {
        let cache = cache();
        let page = cache.get::<Page<Movie>>().unwrap();
        assert_eq!(page.name(), "Page<Movie>");
        assert!(page.is_generic());
        assert_eq!(page.generic_args()[0].handle(), TypeHandle::of::<Movie>());
        assert_eq!(page.enclosed_type().unwrap().name(), "Movie");
    }

    #[test]
    fn test_enumerable_fallback() {
        let cache = cache();
        assert_eq!(cache.get::<Watchlist>().unwrap().system_type(), SystemType::Enumerable);
        assert_eq!(cache.classify::<Vec<u64>>(), SystemType::List);
    }

    #[test]
    fn test_recursive_type_resolves_to_itself() {
        let cache = cache();
        let category = cache.get::<Category>().unwrap();

        let children = category.field("children").unwrap().field_type().get().unwrap();
        let element = cache.resolve(children.enclosed_type().unwrap()).unwrap();
        assert!(Arc::ptr_eq(&element, &category));
        assert_eq!(cache.build_count(TypeHandle::of::<Category>()), 1);
    }

    #[test]
    fn test_tags_pass_through() {
        let cache = cache();
        let movie = cache.get::<Movie>().unwrap();

        let tags = movie.tags();
        assert_eq!(
            tags.get("graphql_name").unwrap().value,
            Some(TagValue::Str("Movie"))
        );
        assert_eq!(
            tags.get("cache_seconds").unwrap().value,
            Some(TagValue::Int(300))
        );
        assert!(movie.field("title").unwrap().tags().get("searchable").unwrap().is_marker());
        assert!(movie.field("year").unwrap().tags().is_empty());

        let resolution = cache.get::<Resolution>().unwrap();
        assert_eq!(
            resolution.field("Uhd").unwrap().tags().get("label").unwrap().value,
            Some(TagValue::Str("2160p"))
        );
    }

    #[test]
    fn test_summary_reflects_descriptor() {
        let cache = cache();
        let summary = cache.get::<Movie>().unwrap().summary();
        assert_eq!(summary.base.as_deref(), Some("Entity"));
        let peek = summary.members.iter().find(|m| m.name == "peek_raw").unwrap();
        assert!(!peek.is_accessible);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["kind"], "Class");
        assert_eq!(json["tags"][0]["key"], "graphql_name");
    }
}
