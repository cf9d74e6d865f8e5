//! Wrapper synthesis and subclass finalization
//!
//! `build_wrapper` turns a base type into its wrapper: same storage, same
//! allocation rule, and a method table where every eligible inherited
//! callable is intercepted. `SubclassBuilder` finalizes user subclasses
//! of a wrapper: declared callables that shadow a base method are
//! intercepted too (unless excluded), everything else installs as
//! written, and inherited entries stay as the parent finalized them.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::construct::CtorArgs;
use crate::engine::Engine;
use crate::exclude::is_excluded;
use crate::intercept::{intercept, rebind};
use crate::object::{is_reserved_slot, Obj};
use crate::types::{
    CallCx, Callable, EntryKind, InitFn, MethodEntry, StorageKind, TypeDef, TypeHandle, TypeId,
};
use crate::{Error, Result};

/// Synthesize the wrapper type for `base`.
pub(crate) fn build_wrapper(base: &Arc<TypeDef>) -> Arc<TypeDef> {
    let mut methods: FxHashMap<String, MethodEntry> = FxHashMap::default();
    for (name, entry) in base.flattened_methods() {
        if is_reserved_slot(&name) {
            continue;
        }
        methods.insert(name, install(entry, base));
    }

    let wrapper = Arc::new(TypeDef {
        id: TypeId::new(),
        name: format!("Wrapped{}", base.name()),
        parent: Some(base.clone()),
        origin: Some(base.clone()),
        storage: base.storage().clone(),
        alloc: base.alloc.clone(),
        methods,
        init: None,
    });
    debug!(
        base = %base.name(),
        wrapper = %wrapper.name,
        methods = wrapper.methods.len(),
        "synthesized wrapper type"
    );
    wrapper
}

/// Decide how a callable lands in a synthesized table. Entries that were
/// already intercepted or excluded by an earlier pass are reused as-is,
/// so a second pass never wraps the wrapping.
fn install(entry: MethodEntry, base: &Arc<TypeDef>) -> MethodEntry {
    match entry.kind {
        EntryKind::Intercepted | EntryKind::Excluded => entry,
        EntryKind::Declared if is_excluded(&entry.callable) => MethodEntry {
            callable: rebind(&entry.callable, base),
            kind: EntryKind::Excluded,
        },
        EntryKind::Declared => MethodEntry {
            callable: intercept(&entry.callable, base),
            kind: EntryKind::Intercepted,
        },
    }
}

/// Builder for subclasses of a wrapper type.
///
/// Created through [`TypeHandle::subclass`]. The builder collects the
/// class body (methods, initializer, declared slots) and `build` runs
/// finalization over it.
pub struct SubclassBuilder {
    parent: TypeHandle,
    name: String,
    methods: Vec<(String, Callable)>,
    init: Option<InitFn>,
    slots: Option<Vec<String>>,
}

impl SubclassBuilder {
    pub(crate) fn new(parent: TypeHandle, name: &str) -> Self {
        Self {
            parent,
            name: name.to_string(),
            methods: Vec::new(),
            init: None,
            slots: None,
        }
    }

    /// Declare a method in the class body
    pub fn method(mut self, name: &str, callable: Callable) -> Self {
        self.methods.push((name.to_string(), callable));
        self
    }

    /// Declare the initializer
    pub fn init(
        mut self,
        f: impl Fn(&CallCx<'_>, &Obj, &CtorArgs) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.init = Some(Arc::new(f));
        self
    }

    /// Restrict instances to a declared attribute set (unioned with the
    /// parent's declaration)
    pub fn slots(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.slots = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Finalize and register the subclass.
    ///
    /// Fails with [`Error::UnsupportedBaseType`] when the parent has no
    /// wrapper lineage: promotion needs an origin base to compare
    /// results against, so plain base types must be wrapped first.
    pub fn build(self, engine: &Engine) -> Result<TypeHandle> {
        let parent_def = self.parent.def().clone();
        let origin = parent_def.origin.clone().ok_or_else(|| Error::UnsupportedBaseType {
            detail: format!(
                "`{}` has no wrapper lineage; wrap the base type before subclassing",
                parent_def.name()
            ),
        })?;

        // The class-body snapshot: explicitly declared callables take
        // precedence over anything re-derived from the base. Entries the
        // subclass does not declare are inherited through the parent
        // chain exactly as the parent finalized them.
        let mut methods: FxHashMap<String, MethodEntry> = FxHashMap::default();
        let mut shadowed = 0usize;
        for (name, callable) in self.methods {
            let entry = if origin.has_method(&name) {
                if is_excluded(&callable) {
                    MethodEntry {
                        callable: rebind(&callable, &origin),
                        kind: EntryKind::Excluded,
                    }
                } else {
                    shadowed += 1;
                    MethodEntry {
                        callable: intercept(&callable, &origin),
                        kind: EntryKind::Intercepted,
                    }
                }
            } else {
                MethodEntry::declared(callable)
            };
            methods.insert(name, entry);
        }

        let storage = resolve_storage(parent_def.storage(), self.slots);
        let subclass = engine.register_def(TypeDef {
            id: TypeId::new(),
            name: self.name,
            parent: Some(parent_def.clone()),
            origin: Some(origin),
            storage,
            alloc: parent_def.alloc.clone(),
            methods,
            init: self.init,
        });
        debug!(
            ty = %subclass.name(),
            parent = %parent_def.name(),
            declared = subclass.def().methods.len(),
            shadowed,
            "finalized subclass"
        );
        Ok(subclass)
    }
}

/// Combine the parent's storage declaration with the class body's.
/// Declaring slots narrows where it can; omitting them under a fixed
/// parent opens a dynamic overflow alongside the inherited set.
fn resolve_storage(parent: &StorageKind, declared: Option<Vec<String>>) -> StorageKind {
    match (parent, declared) {
        (StorageKind::Dynamic, None) => StorageKind::Dynamic,
        (StorageKind::Dynamic, Some(slots)) => StorageKind::Mixed(slots),
        (StorageKind::Fixed(inherited), Some(slots)) => {
            StorageKind::Fixed(union(inherited, slots))
        }
        (StorageKind::Fixed(inherited), None) => StorageKind::Mixed(inherited.clone()),
        (StorageKind::Mixed(inherited), Some(slots)) => {
            StorageKind::Mixed(union(inherited, slots))
        }
        (StorageKind::Mixed(inherited), None) => StorageKind::Mixed(inherited.clone()),
    }
}

fn union(inherited: &[String], declared: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = inherited.to_vec();
    for name in declared {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclude::exclude;
    use crate::types::TypeBuilder;
    use crate::value::Payload;

    fn counting_base(engine: &Engine) -> TypeHandle {
        TypeBuilder::new("Base")
            .method(
                "step",
                Callable::new(|cx, recv, _args| {
                    let n = recv.payload().as_int().unwrap_or(0);
                    Ok(cx.alloc(Payload::Int(n + 1)))
                }),
            )
            .register(engine)
    }

    #[test]
    fn test_wrapper_intercepts_base_methods() {
        let engine = Engine::new();
        let base = counting_base(&engine);
        let wrapper = engine.wrap(base.id()).unwrap();

        let entry = wrapper.def().methods.get("step").unwrap();
        assert_eq!(entry.kind, EntryKind::Intercepted);
        // A fresh wrapping, not the base's callable.
        assert_ne!(entry.callable.id(), base.callable("step").unwrap().id());
    }

    #[test]
    fn test_rewrap_does_not_double_wrap() {
        let engine = Engine::new();
        let base = counting_base(&engine);
        let wrapper = engine.wrap(base.id()).unwrap();
        let rewrapped = engine.wrap(wrapper.id()).unwrap();

        let inner = wrapper.def().methods.get("step").unwrap();
        let outer = rewrapped.def().methods.get("step").unwrap();
        assert_eq!(outer.kind, EntryKind::Intercepted);
        // The already-intercepted callable is reused, not wrapped again.
        assert_eq!(outer.callable.id(), inner.callable.id());
    }

    #[test]
    fn test_excluded_base_method_is_pinned_to_base() {
        let engine = Engine::new();
        let base = counting_base(&engine);
        exclude(base.callable("step").unwrap());
        let wrapper = engine.wrap(base.id()).unwrap();

        let entry = wrapper.def().methods.get("step").unwrap();
        assert_eq!(entry.kind, EntryKind::Excluded);

        // Pinned entries survive a rewrap untouched.
        let rewrapped = engine.wrap(wrapper.id()).unwrap();
        let outer = rewrapped.def().methods.get("step").unwrap();
        assert_eq!(outer.kind, EntryKind::Excluded);
        assert_eq!(outer.callable.id(), entry.callable.id());
    }

    #[test]
    fn test_subclass_requires_wrapper_lineage() {
        let engine = Engine::new();
        let base = counting_base(&engine);
        let err = base.subclass("Sub").build(&engine).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBaseType { .. }));
    }

    #[test]
    fn test_declared_method_shadowing_base_is_intercepted() {
        let engine = Engine::new();
        let base = counting_base(&engine);
        let wrapper = engine.wrap(base.id()).unwrap();
        let sub = wrapper
            .subclass("Sub")
            .method(
                "step",
                Callable::new(|cx, recv, _args| {
                    let n = recv.payload().as_int().unwrap_or(0);
                    Ok(cx.alloc(Payload::Int(n + 10)))
                }),
            )
            .method("novel", Callable::new(|cx, _recv, _args| Ok(cx.alloc(Payload::Null))))
            .build(&engine)
            .unwrap();

        assert_eq!(sub.def().methods.get("step").unwrap().kind, EntryKind::Intercepted);
        assert_eq!(sub.def().methods.get("novel").unwrap().kind, EntryKind::Declared);
    }

    #[test]
    fn test_declared_excluded_method_is_pinned_to_base() {
        let engine = Engine::new();
        let base = counting_base(&engine);
        let wrapper = engine.wrap(base.id()).unwrap();
        let sub = wrapper
            .subclass("Sub")
            .method(
                "step",
                exclude(Callable::new(|cx, _recv, _args| Ok(cx.alloc(Payload::Int(0))))),
            )
            .build(&engine)
            .unwrap();

        assert_eq!(sub.def().methods.get("step").unwrap().kind, EntryKind::Excluded);
    }

    #[test]
    fn test_storage_resolution() {
        let fixed = StorageKind::Fixed(vec!["a".into()]);
        let mixed = StorageKind::Mixed(vec!["a".into()]);

        assert_eq!(resolve_storage(&StorageKind::Dynamic, None), StorageKind::Dynamic);
        assert_eq!(
            resolve_storage(&StorageKind::Dynamic, Some(vec!["x".into()])),
            StorageKind::Mixed(vec!["x".into()])
        );
        assert_eq!(
            resolve_storage(&fixed, Some(vec!["b".into(), "a".into()])),
            StorageKind::Fixed(vec!["a".into(), "b".into()])
        );
        assert_eq!(resolve_storage(&fixed, None), StorageKind::Mixed(vec!["a".into()]));
        assert_eq!(
            resolve_storage(&mixed, Some(vec!["b".into()])),
            StorageKind::Mixed(vec!["a".into(), "b".into()])
        );
        assert_eq!(resolve_storage(&mixed, None), StorageKind::Mixed(vec!["a".into()]));
    }
}
