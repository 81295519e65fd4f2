use crate::{
    member::{MemberDescriptor, MethodDescriptor},
    obs::sink::{self, MetricsEvent},
    traits::Object,
};
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, OnceLock, RwLock},
};

///
/// MemberResolver
///
/// Capability that binds a member name to an accessor on the runtime type
/// of an object. The evaluator depends only on this trait.
///

pub trait MemberResolver: Send + Sync {
    fn resolve_member(&self, object: &dyn Object, name: &str) -> Option<MemberDescriptor>;

    fn resolve_method(&self, object: &dyn Object, name: &str) -> Option<MethodDescriptor>;
}

///
/// TableResolver
///
/// Linear lookup in the object's static tables.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct TableResolver;

impl MemberResolver for TableResolver {
    fn resolve_member(&self, object: &dyn Object, name: &str) -> Option<MemberDescriptor> {
        object
            .members()
            .iter()
            .find(|member| member.name == name)
            .copied()
    }

    fn resolve_method(&self, object: &dyn Object, name: &str) -> Option<MethodDescriptor> {
        object
            .methods()
            .iter()
            .find(|method| method.name == name)
            .copied()
    }
}

type CacheKey = (TypeId, String);

///
/// CachingResolver
///
/// Memoizes `(type, name) -> descriptor` lookups, including negative
/// results. The maps are append-only; two writers racing on the same key
/// compute the same descriptor, so the later insert simply overwrites an
/// equivalent entry.
///

#[derive(Debug, Default)]
pub struct CachingResolver {
    members: RwLock<HashMap<CacheKey, Option<MemberDescriptor>>>,
    methods: RwLock<HashMap<CacheKey, Option<MethodDescriptor>>>,
}

impl CachingResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached member bindings (positive and negative).
    #[must_use]
    pub fn cached_members(&self) -> usize {
        self.members.read().map_or(0, |map| map.len())
    }

    fn key(object: &dyn Object, name: &str) -> CacheKey {
        (Any::type_id(object.as_any()), name.to_string())
    }
}

// Shared lookup-or-populate path for both tables.
fn cached<D: Copy>(
    map: &RwLock<HashMap<CacheKey, Option<D>>>,
    key: CacheKey,
    compute: impl FnOnce() -> Option<D>,
) -> Option<D> {
    if let Ok(guard) = map.read()
        && let Some(hit) = guard.get(&key)
    {
        return *hit;
    }

    sink::record(MetricsEvent::AccessorCacheMiss);
    let resolved = compute();

    // A poisoned lock only loses the memoization, never the answer.
    if let Ok(mut guard) = map.write() {
        guard.insert(key, resolved);
    }

    resolved
}

impl MemberResolver for CachingResolver {
    fn resolve_member(&self, object: &dyn Object, name: &str) -> Option<MemberDescriptor> {
        cached(&self.members, Self::key(object, name), || {
            TableResolver.resolve_member(object, name)
        })
    }

    fn resolve_method(&self, object: &dyn Object, name: &str) -> Option<MethodDescriptor> {
        cached(&self.methods, Self::key(object, name), || {
            TableResolver.resolve_method(object, name)
        })
    }
}

static DEFAULT_RESOLVER: OnceLock<Arc<CachingResolver>> = OnceLock::new();

/// Process-wide caching resolver, created on first use.
pub fn default_resolver() -> Arc<dyn MemberResolver> {
    DEFAULT_RESOLVER
        .get_or_init(|| Arc::new(CachingResolver::new()))
        .clone()
}
