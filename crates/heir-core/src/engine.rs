//! The engine: type registration, the weak wrapper cache, and dispatch
//!
//! An `Engine` is an explicit value passed through application setup, not
//! ambient process state. Both of its indexes hold `Weak` references, so
//! registering or caching a type never extends its lifetime: a type lives
//! exactly as long as some handle or instance keeps it alive.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::construct::{run_construct, CtorArgs};
use crate::factory::build_wrapper;
use crate::object::Obj;
use crate::types::{CallCx, TypeDef, TypeHandle, TypeId};
use crate::{Error, Result};

/// Type registry and method dispatcher.
///
/// Lock order, where both are taken: wrapper cache before type index. No
/// user callable ever runs while either lock is held.
pub struct Engine {
    /// Every registered type, by ID
    types: RwLock<FxHashMap<TypeId, Weak<TypeDef>>>,
    /// Synthesized wrappers, keyed by the base type's ID
    wrappers: RwLock<FxHashMap<TypeId, Weak<TypeDef>>>,
}

impl Engine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self {
            types: RwLock::new(FxHashMap::default()),
            wrappers: RwLock::new(FxHashMap::default()),
        }
    }

    pub(crate) fn register_def(&self, def: TypeDef) -> TypeHandle {
        let def = Arc::new(def);
        self.index(&def);
        TypeHandle::from_def(def)
    }

    fn index(&self, def: &Arc<TypeDef>) {
        self.types.write().insert(def.id(), Arc::downgrade(def));
    }

    /// Resolve a type ID to a handle, if the type is still alive
    pub fn resolve(&self, id: TypeId) -> Option<TypeHandle> {
        self.types
            .read()
            .get(&id)
            .and_then(Weak::upgrade)
            .map(TypeHandle::from_def)
    }

    /// Get or create the wrapper type for `base`.
    ///
    /// Memoized: repeated calls for the same live base return the
    /// identical type. The cache entry is weak; once every handle and
    /// instance of the wrapper is gone, a later call synthesizes a fresh
    /// one. Creation is single-flight: concurrent callers for the same
    /// base never install two different wrappers.
    pub fn wrap(&self, base: TypeId) -> Result<TypeHandle> {
        let base_handle = self.resolve(base).ok_or_else(|| Error::UnsupportedBaseType {
            detail: format!("no live type registered under id {}", base.as_u64()),
        })?;

        if let Some(hit) = self.wrappers.read().get(&base).and_then(Weak::upgrade) {
            trace!(base = %base_handle.name(), "wrapper cache hit");
            return Ok(TypeHandle::from_def(hit));
        }

        let mut cache = self.wrappers.write();
        // Re-check under the write lock: another caller may have built
        // the wrapper while we waited.
        if let Some(hit) = cache.get(&base).and_then(Weak::upgrade) {
            return Ok(TypeHandle::from_def(hit));
        }

        let wrapper = build_wrapper(base_handle.def());
        self.index(&wrapper);
        cache.retain(|_, entry| entry.strong_count() > 0);
        cache.insert(base, Arc::downgrade(&wrapper));
        debug!(base = %base_handle.name(), wrapper = %wrapper.name(), "wrapper type cached");
        Ok(TypeHandle::from_def(wrapper))
    }

    /// Construct an instance of `ty` from `value` with extra arguments
    pub fn construct(&self, ty: &TypeHandle, value: &Obj, extra: CtorArgs) -> Result<Obj> {
        run_construct(self, ty, value, extra)
    }

    /// Invoke `name` on `recv`, resolving through the type chain
    pub fn call_method(&self, recv: &Obj, name: &str, args: &[Obj]) -> Result<Obj> {
        let mut cur = recv.type_def().clone();
        loop {
            if let Some(entry) = cur.methods.get(name).cloned() {
                let owner = TypeHandle::from_def(cur);
                let cx = CallCx::new(self, &owner);
                return entry.callable.invoke(&cx, recv, args);
            }
            match cur.parent().cloned() {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        Err(Error::UnknownMethod {
            type_name: recv.type_name().to_string(),
            method: name.to_string(),
        })
    }

    /// Drop dead entries from both indexes, returning how many went
    pub fn purge(&self) -> usize {
        let mut removed = 0;
        {
            let mut types = self.types.write();
            let before = types.len();
            types.retain(|_, entry| entry.strong_count() > 0);
            removed += before - types.len();
        }
        {
            let mut wrappers = self.wrappers.write();
            let before = wrappers.len();
            wrappers.retain(|_, entry| entry.strong_count() > 0);
            removed += before - wrappers.len();
        }
        if removed > 0 {
            debug!(removed, "purged dead type entries");
        }
        removed
    }

    /// Number of entries in the type index, dead ones included
    pub fn type_count(&self) -> usize {
        self.types.read().len()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
