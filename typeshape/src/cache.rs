//! The metadata cache: one immutable [TypeMember] per type handle, built on
//! first request and shared by every caller afterwards.

use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::classifier::classify;
use crate::config::CacheConfig;
use crate::error::{Result, ShapeError};
use crate::handle::TypeHandle;
use crate::members::{
    ConstructorMember, EventMember, FieldMember, MethodMember, PropertyMember, TypeMember, TypeRef,
};
use crate::raw::{Introspect, TypeLink};
use crate::system_type::SystemType;

/// Storage for one key. The cell is written exactly once; `building`
/// serializes construction for that key only.
#[derive(Default)]
pub(crate) struct Slot {
    cell: OnceCell<Arc<TypeMember>>,
    building: Mutex<()>,
}

impl Slot {
    pub(crate) fn get(&self) -> Option<&Arc<TypeMember>> {
        self.cell.get()
    }

    /// Claim this slot for building, waiting at most `wait` for a build
    /// already running on another thread
    pub(crate) fn claim_within(&self, wait: Duration) -> Option<MutexGuard<'_, ()>> {
        self.building.try_lock_for(wait)
    }
}

thread_local! {
    /// (cache, type) pairs whose build is running on this thread
    static IN_PROGRESS: RefCell<HashSet<(usize, TypeHandle)>> = RefCell::new(HashSet::new());
}

/// Marks a build as running on the current thread until dropped
struct InProgress {
    key: (usize, TypeHandle),
}

impl InProgress {
    fn enter(cache: &MetadataCache, handle: TypeHandle) -> Self {
        let key = (cache.id(), handle);
        IN_PROGRESS.with(|set| set.borrow_mut().insert(key));
        Self { key }
    }
}

impl Drop for InProgress {
    fn drop(&mut self) {
        IN_PROGRESS.with(|set| set.borrow_mut().remove(&self.key));
    }
}

/// Process-wide store of type descriptors.
///
/// Construct one at startup and share it by `Arc`. Entries are never
/// evicted or rebuilt; a failed build leaves its key empty so the next
/// caller retries.
pub struct MetadataCache {
    pub(crate) config: CacheConfig,
    slots: DashMap<TypeHandle, Arc<Slot>>,
    sources: DashMap<TypeHandle, TypeLink>,
    builds: DashMap<TypeHandle, usize>,
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl MetadataCache {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = config.initial_capacity;
        Self {
            config,
            slots: DashMap::with_capacity(capacity),
            sources: DashMap::with_capacity(capacity),
            builds: DashMap::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Descriptor for `T`, building it on first request
    pub fn get<T: Introspect>(&self) -> Result<Arc<TypeMember>> {
        self.get_or_build(TypeLink::of::<T>())
    }

    /// Make `T` known to the cache without building it, so it can later be
    /// looked up by handle alone
    pub fn register<T: Introspect>(&self) -> TypeHandle {
        let link = TypeLink::of::<T>();
        self.sources.entry(link.handle).or_insert(link);
        link.handle
    }

    /// Descriptor for the linked type. At most one build runs per key;
    /// concurrent first requests wait for it and observe the same `Arc`.
    pub fn get_or_build(&self, link: TypeLink) -> Result<Arc<TypeMember>> {
        if let Some(member) = self.peek(link.handle) {
            return Ok(member);
        }

        let slot = self.slot(link);
        let _guard = slot.building.lock();
        if let Some(member) = slot.get() {
            return Ok(member.clone());
        }
        self.build_into(&slot, link)
    }

    /// Descriptor for a handle that has been requested or registered before
    pub fn get_by_handle(&self, handle: TypeHandle) -> Result<Arc<TypeMember>> {
        if let Some(member) = self.peek(handle) {
            return Ok(member);
        }
        let link = self
            .sources
            .get(&handle)
            .map(|link| *link)
            .ok_or_else(|| ShapeError::UnknownType {
                type_name: handle.path().to_string(),
            })?;
        self.get_or_build(link)
    }

    /// Built descriptor for `handle`, if any. Never builds.
    pub fn peek(&self, handle: TypeHandle) -> Option<Arc<TypeMember>> {
        self.slots
            .get(&handle)
            .and_then(|slot| slot.get().cloned())
    }

    /// Follow a type reference, building its target if it has not been
    /// built yet
    pub fn resolve(&self, type_ref: &TypeRef) -> Result<Arc<TypeMember>> {
        match type_ref.get() {
            Some(member) => Ok(member),
            None => self.get_by_handle(type_ref.handle()),
        }
    }

    pub fn classify<T: Introspect>(&self) -> SystemType {
        match self.peek(TypeHandle::of::<T>()) {
            Some(member) => member.system_type(),
            None => classify(&T::introspect()),
        }
    }

    pub fn field(&self, handle: TypeHandle, name: &str) -> Result<Arc<FieldMember>> {
        let ty = self.get_by_handle(handle)?;
        ty.field(name)
            .cloned()
            .ok_or_else(|| not_found("field", name, &ty))
    }

    pub fn property(&self, handle: TypeHandle, name: &str) -> Result<Arc<PropertyMember>> {
        let ty = self.get_by_handle(handle)?;
        ty.property(name)
            .cloned()
            .ok_or_else(|| not_found("property", name, &ty))
    }

    /// Overload set for `name`
    pub fn methods(&self, handle: TypeHandle, name: &str) -> Result<Vec<Arc<MethodMember>>> {
        let ty = self.get_by_handle(handle)?;
        let group = ty.methods(name);
        if group.is_empty() {
            return Err(not_found("method", name, &ty));
        }
        Ok(group.to_vec())
    }

    pub fn constructors(&self, handle: TypeHandle) -> Result<Vec<Arc<ConstructorMember>>> {
        Ok(self.get_by_handle(handle)?.constructors().to_vec())
    }

    pub fn event(&self, handle: TypeHandle, name: &str) -> Result<Arc<EventMember>> {
        let ty = self.get_by_handle(handle)?;
        ty.event(name)
            .cloned()
            .ok_or_else(|| not_found("event", name, &ty))
    }

    /// Number of built descriptors
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times the descriptor for `handle` was constructed. Never
    /// more than one.
    pub fn build_count(&self, handle: TypeHandle) -> usize {
        self.builds.get(&handle).map(|count| *count).unwrap_or(0)
    }

    /// Every built descriptor, in no particular order
    pub fn descriptors(&self) -> Vec<Arc<TypeMember>> {
        self.slots
            .iter()
            .filter_map(|slot| slot.get().cloned())
            .collect()
    }

    fn id(&self) -> usize {
        self as *const Self as usize
    }

    /// Whether `handle` is being built further up this thread's stack
    pub(crate) fn building_here(&self, handle: TypeHandle) -> bool {
        let key = (self.id(), handle);
        IN_PROGRESS.with(|set| set.borrow().contains(&key))
    }

    /// Slot for `link`, created empty on first sight
    pub(crate) fn slot(&self, link: TypeLink) -> Arc<Slot> {
        self.sources.entry(link.handle).or_insert(link);
        if let Some(slot) = self.slots.get(&link.handle) {
            return slot.clone();
        }
        self.slots.entry(link.handle).or_default().clone()
    }

    /// Build and publish the descriptor. Caller holds the slot's lock.
    pub(crate) fn build_into(&self, slot: &Arc<Slot>, link: TypeLink) -> Result<Arc<TypeMember>> {
        let raw = link.raw();
        debug!(type_name = %raw.name, "Building type descriptor");

        let in_progress = InProgress::enter(self, link.handle);
        let described = self.describe(raw, slot);
        drop(in_progress);

        let member = match described {
            Ok(member) => Arc::new(member),
            Err(e) => {
                warn!(type_handle = %link.handle, error = %e, "Type descriptor build failed");
                return Err(e);
            }
        };

        // Only reachable with the lock held and the cell empty
        let member = slot.cell.get_or_init(|| member).clone();
        *self.builds.entry(link.handle).or_insert(0) += 1;

        debug!(
            type_name = %member.name(),
            system_type = %member.system_type(),
            fields = member.fields().count(),
            methods = member.method_groups().count(),
            "Built type descriptor"
        );
        Ok(member)
    }
}

fn not_found(member_kind: &'static str, name: &str, ty: &TypeMember) -> ShapeError {
    ShapeError::MemberNotFound {
        member_kind,
        member: name.to_string(),
        declaring_type: ty.name().to_string(),
    }
}
