//! Instances
//!
//! An `Obj` is a cheap `Arc` handle to an instance cell: the payload and
//! the user attributes sit behind their own locks, and the construction
//! context lives in a write-once slot. Nothing in the engine holds a
//! strong reference to an instance.

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;

use crate::construct::CtorArgs;
use crate::types::{TypeDef, TypeHandle, TypeId};
use crate::value::{Payload, PayloadKind};
use crate::{Error, Result};

/// Reserved attribute name backing the captured extra positional arguments
pub const CTOR_ARGS_SLOT: &str = "__ctor_args__";
/// Reserved attribute name backing the captured extra named arguments
pub const CTOR_NAMED_SLOT: &str = "__ctor_named__";

/// Whether `name` is one of the internal capture slots
pub fn is_reserved_slot(name: &str) -> bool {
    name == CTOR_ARGS_SLOT || name == CTOR_NAMED_SLOT
}

struct ObjCell {
    ty: Arc<TypeDef>,
    payload: RwLock<Payload>,
    attrs: RwLock<FxHashMap<String, Obj>>,
    ctx: OnceLock<CtorArgs>,
}

/// Handle to an instance
#[derive(Clone)]
pub struct Obj {
    cell: Arc<ObjCell>,
}

impl Obj {
    pub(crate) fn with_def(ty: Arc<TypeDef>, payload: Payload) -> Self {
        Self {
            cell: Arc::new(ObjCell {
                ty,
                payload: RwLock::new(payload),
                attrs: RwLock::new(FxHashMap::default()),
                ctx: OnceLock::new(),
            }),
        }
    }

    /// ID of the instance's concrete type
    pub fn type_id(&self) -> TypeId {
        self.cell.ty.id()
    }

    /// Name of the instance's concrete type
    pub fn type_name(&self) -> &str {
        self.cell.ty.name()
    }

    pub(crate) fn type_def(&self) -> &Arc<TypeDef> {
        &self.cell.ty
    }

    /// Handle to the instance's concrete type
    pub fn type_handle(&self) -> TypeHandle {
        TypeHandle::from_def(self.cell.ty.clone())
    }

    /// Whether this instance satisfies a type check against `ty`,
    /// i.e. `ty` is the concrete type or appears in its parent chain.
    pub fn is_instance_of(&self, ty: &TypeHandle) -> bool {
        self.cell.ty.is_subtype_of(ty.id())
    }

    /// Read access to the payload. Holds a read lock while alive.
    pub fn payload(&self) -> RwLockReadGuard<'_, Payload> {
        self.cell.payload.read()
    }

    /// Write access to the payload. Holds the write lock while alive.
    pub fn payload_mut(&self) -> RwLockWriteGuard<'_, Payload> {
        self.cell.payload.write()
    }

    /// Read a user attribute
    pub fn get_attr(&self, name: &str) -> Result<Obj> {
        if is_reserved_slot(name) {
            return Err(Error::RestrictedAttribute {
                type_name: self.type_name().to_string(),
                attr: name.to_string(),
            });
        }
        self.cell
            .attrs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownAttribute {
                type_name: self.type_name().to_string(),
                attr: name.to_string(),
            })
    }

    /// Write a user attribute, honoring the type's storage declaration
    pub fn set_attr(&self, name: &str, value: Obj) -> Result<()> {
        if is_reserved_slot(name) || !self.cell.ty.storage().allows(name) {
            return Err(Error::RestrictedAttribute {
                type_name: self.type_name().to_string(),
                attr: name.to_string(),
            });
        }
        self.cell.attrs.write().insert(name.to_string(), value);
        Ok(())
    }

    /// Read a user attribute without raising on absence
    pub fn try_attr(&self, name: &str) -> Option<Obj> {
        if is_reserved_slot(name) {
            return None;
        }
        self.cell.attrs.read().get(name).cloned()
    }

    /// Names of the attributes currently set, sorted
    pub fn attr_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cell.attrs.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn attrs_snapshot(&self) -> Vec<(String, Obj)> {
        self.cell
            .attrs
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// The construction context captured for this instance, if any
    pub fn ctor_args(&self) -> Option<&CtorArgs> {
        self.cell.ctx.get()
    }

    /// Record the construction context. The first write wins; later
    /// writes are ignored and reported as `false`.
    pub(crate) fn record_ctor_args(&self, args: CtorArgs) -> bool {
        self.cell.ctx.set(args).is_ok()
    }

    /// Whether two handles refer to the same instance
    pub fn ptr_eq(&self, other: &Obj) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    fn cell_addr(&self) -> usize {
        Arc::as_ptr(&self.cell) as usize
    }

    /// Shared cycle cutoff for `Display` and `Debug`. A container cell
    /// already being rendered higher up the same call writes an elision
    /// marker instead of recursing into itself.
    fn fmt_guarded(
        &self,
        f: &mut fmt::Formatter<'_>,
        write: impl FnOnce(&mut fmt::Formatter<'_>, &Payload) -> fmt::Result,
    ) -> fmt::Result {
        let addr = self.cell_addr();
        let active = RENDERING.with(|stack| {
            stack
                .borrow()
                .iter()
                .find(|(seen, _)| *seen == addr)
                .map(|(_, kind)| *kind)
        });
        if let Some(kind) = active {
            return f.write_str(elided(kind));
        }
        let payload = self.payload();
        let kind = payload.kind();
        if !matches!(kind, PayloadKind::List | PayloadKind::Map) {
            return write(f, &payload);
        }
        RENDERING.with(|stack| stack.borrow_mut().push((addr, kind)));
        let out = write(f, &payload);
        RENDERING.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(popped.map(|(seen, _)| seen), Some(addr));
        });
        out
    }
}

// Containers hold `Obj` handles and can come to hold their own, so the
// deep traversals track which cells are already on the stack and cut
// off when one comes around again.
thread_local! {
    static RENDERING: RefCell<Vec<(usize, PayloadKind)>> = const { RefCell::new(Vec::new()) };
    static COMPARING: RefCell<Vec<(usize, usize)>> = const { RefCell::new(Vec::new()) };
}

fn elided(kind: PayloadKind) -> &'static str {
    match kind {
        PayloadKind::Map => "{...}",
        _ => "[...]",
    }
}

impl PartialEq for Obj {
    /// Value equality over payloads; attributes and types do not
    /// participate, so a wrapper equals the plain value it wraps. A
    /// container pair already under comparison higher up the same call
    /// reports unequal instead of recursing forever.
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let lhs = self.payload().clone();
        let rhs = other.payload().clone();
        let containers = matches!(lhs.kind(), PayloadKind::List | PayloadKind::Map)
            && matches!(rhs.kind(), PayloadKind::List | PayloadKind::Map);
        if !containers {
            return lhs == rhs;
        }
        let pair = (self.cell_addr(), other.cell_addr());
        let entered = COMPARING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&pair) {
                false
            } else {
                stack.push(pair);
                true
            }
        });
        if !entered {
            return false;
        }
        let equal = lhs == rhs;
        COMPARING.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(popped, Some(pair));
        });
        equal
    }
}

impl fmt::Display for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_guarded(f, |f, payload| write!(f, "{}", payload))
    }
}

impl fmt::Debug for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.type_name();
        self.fmt_guarded(f, |f, payload| write!(f, "{}({:?})", name, payload))
    }
}
