//! Type descriptors, callables, and the base-type builder
//!
//! A `TypeDef` is immutable once registered: its method table, storage
//! declaration, allocation rule, and parent links never change. Wrapper
//! synthesis and subclass finalization always produce fresh descriptors.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::construct::CtorArgs;
use crate::engine::Engine;
use crate::object::Obj;
use crate::value::Payload;
use crate::Result;

/// Unique identifier for a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u64);

impl TypeId {
    /// Mint a new unique type ID
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        TypeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for TypeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a callable.
///
/// Clones of a [`Callable`] share its ID, so an exclusion mark placed on
/// one clone is visible through all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallableId(u64);

impl CallableId {
    /// Mint a new unique callable ID
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        CallableId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for CallableId {
    fn default() -> Self {
        Self::new()
    }
}

/// Call context handed to every method, initializer, and allocator body.
///
/// `owner` is the type the running callable is defined on, which is how a
/// method body allocates results of its own type without holding a handle
/// to itself.
pub struct CallCx<'a> {
    engine: &'a Engine,
    owner: &'a TypeHandle,
}

impl<'a> CallCx<'a> {
    pub(crate) fn new(engine: &'a Engine, owner: &'a TypeHandle) -> Self {
        Self { engine, owner }
    }

    /// The engine the call is running under
    pub fn engine(&self) -> &'a Engine {
        self.engine
    }

    /// The type the running callable is defined on
    pub fn owner(&self) -> &TypeHandle {
        self.owner
    }

    /// Allocate a fresh instance of the owning type
    pub fn alloc(&self, payload: Payload) -> Obj {
        self.owner.instance(payload)
    }
}

/// Method body signature
pub type MethodFn = Arc<dyn Fn(&CallCx<'_>, &Obj, &[Obj]) -> Result<Obj> + Send + Sync>;
/// Initializer signature: runs after allocation, receives the extra args
pub type InitFn = Arc<dyn Fn(&CallCx<'_>, &Obj, &CtorArgs) -> Result<()> + Send + Sync>;
/// Custom allocation signature: derives the new payload from `value`
pub type AllocFn = Arc<dyn Fn(&CallCx<'_>, &Obj) -> Result<Payload> + Send + Sync>;

/// A named piece of behavior attached to a type.
///
/// Identity (not structure) is what the exclusion registry tracks, so a
/// `Callable` can be marked once and recognized wherever it was installed.
#[derive(Clone)]
pub struct Callable {
    id: CallableId,
    func: MethodFn,
}

impl Callable {
    /// Wrap a function as a callable with a fresh identity
    pub fn new(f: impl Fn(&CallCx<'_>, &Obj, &[Obj]) -> Result<Obj> + Send + Sync + 'static) -> Self {
        Self {
            id: CallableId::new(),
            func: Arc::new(f),
        }
    }

    /// The callable's identity
    pub fn id(&self) -> CallableId {
        self.id
    }

    /// Invoke the underlying function
    pub fn invoke(&self, cx: &CallCx<'_>, recv: &Obj, args: &[Obj]) -> Result<Obj> {
        (self.func)(cx, recv, args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable(#{})", self.id.as_u64())
    }
}

/// How a method-table entry was installed. Synthesis passes skip entries
/// that are already `Intercepted` or `Excluded`, which is what keeps
/// re-finalization from wrapping a wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    /// As the type's author wrote it; runs owned by its defining level
    Declared,
    /// Wrapped for promotion
    Intercepted,
    /// Pinned to base behavior, never promoted
    Excluded,
}

/// A method-table entry
#[derive(Debug, Clone)]
pub(crate) struct MethodEntry {
    pub(crate) callable: Callable,
    pub(crate) kind: EntryKind,
}

impl MethodEntry {
    pub(crate) fn declared(callable: Callable) -> Self {
        Self {
            callable,
            kind: EntryKind::Declared,
        }
    }
}

/// How a type stores user attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    /// Arbitrary attribute names
    Dynamic,
    /// Only the declared names; anything else is rejected
    Fixed(Vec<String>),
    /// Declared names plus a dynamic overflow
    Mixed(Vec<String>),
}

impl StorageKind {
    /// The declared name set, if this kind has one
    pub fn declared(&self) -> Option<&[String]> {
        match self {
            StorageKind::Dynamic => None,
            StorageKind::Fixed(names) | StorageKind::Mixed(names) => Some(names),
        }
    }

    /// Whether an attribute write under `name` is permitted
    pub fn allows(&self, name: &str) -> bool {
        match self {
            StorageKind::Dynamic | StorageKind::Mixed(_) => true,
            StorageKind::Fixed(names) => names.iter().any(|n| n == name),
        }
    }
}

/// How construction derives an instance's payload from the value argument
#[derive(Clone)]
pub enum AllocRule {
    /// Bare allocation: clone the value's payload, copy its attributes,
    /// adopt its recorded construction context
    Default,
    /// Delegate to the base type's own allocation logic; no state copy
    Custom(AllocFn),
}

impl fmt::Debug for AllocRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocRule::Default => f.write_str("Default"),
            AllocRule::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Immutable type descriptor
pub struct TypeDef {
    pub(crate) id: TypeId,
    pub(crate) name: String,
    pub(crate) parent: Option<Arc<TypeDef>>,
    pub(crate) origin: Option<Arc<TypeDef>>,
    pub(crate) storage: StorageKind,
    pub(crate) alloc: AllocRule,
    pub(crate) methods: FxHashMap<String, MethodEntry>,
    pub(crate) init: Option<InitFn>,
}

impl TypeDef {
    /// The type's ID
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type's attribute-storage declaration
    pub fn storage(&self) -> &StorageKind {
        &self.storage
    }

    /// The base type this type promotes to, if it has wrapper lineage
    pub fn origin(&self) -> Option<&Arc<TypeDef>> {
        self.origin.as_ref()
    }

    /// Direct parent in the type chain
    pub fn parent(&self) -> Option<&Arc<TypeDef>> {
        self.parent.as_ref()
    }

    /// Whether `other` appears in this type's parent chain (inclusive)
    pub fn is_subtype_of(&self, other: TypeId) -> bool {
        let mut cur = Some(self);
        while let Some(def) = cur {
            if def.id == other {
                return true;
            }
            cur = def.parent.as_deref();
        }
        false
    }

    /// Whether a method under `name` is reachable through the chain
    pub fn has_method(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&MethodEntry> {
        let mut cur = Some(self);
        while let Some(def) = cur {
            if let Some(entry) = def.methods.get(name) {
                return Some(entry);
            }
            cur = def.parent.as_deref();
        }
        None
    }

    /// Every callable reachable through the chain, nearest definition wins.
    pub(crate) fn flattened_methods(&self) -> FxHashMap<String, MethodEntry> {
        let mut out: FxHashMap<String, MethodEntry> = FxHashMap::default();
        let mut cur = Some(self);
        while let Some(def) = cur {
            for (name, entry) in &def.methods {
                out.entry(name.clone()).or_insert_with(|| entry.clone());
            }
            cur = def.parent.as_deref();
        }
        out
    }

    /// Nearest initializer in the chain
    pub(crate) fn resolve_init(&self) -> Option<&InitFn> {
        let mut cur = Some(self);
        while let Some(def) = cur {
            if let Some(init) = &def.init {
                return Some(init);
            }
            cur = def.parent.as_deref();
        }
        None
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("id", &self.id.as_u64())
            .field("name", &self.name)
            .field("storage", &self.storage)
            .field("origin", &self.origin.as_ref().map(|o| o.name.as_str()))
            .finish()
    }
}

/// Shared handle to a registered type.
///
/// Handles are cheap to clone and are the only thing keeping a type alive:
/// the engine's indexes hold weak references only.
#[derive(Clone)]
pub struct TypeHandle {
    def: Arc<TypeDef>,
}

impl TypeHandle {
    pub(crate) fn from_def(def: Arc<TypeDef>) -> Self {
        Self { def }
    }

    pub(crate) fn def(&self) -> &Arc<TypeDef> {
        &self.def
    }

    /// The type's ID
    pub fn id(&self) -> TypeId {
        self.def.id
    }

    /// The type's name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// The type's attribute-storage declaration
    pub fn storage(&self) -> &StorageKind {
        &self.def.storage
    }

    /// The base type this type promotes to, if it has wrapper lineage
    pub fn origin(&self) -> Option<TypeHandle> {
        self.def.origin.clone().map(TypeHandle::from_def)
    }

    /// Direct parent in the type chain
    pub fn parent(&self) -> Option<TypeHandle> {
        self.def.parent.clone().map(TypeHandle::from_def)
    }

    /// Allocate an instance of this type directly, bypassing construction.
    ///
    /// This is the raw value constructor used by base-type libraries and
    /// method bodies; it applies no allocation rule and runs no
    /// initializer.
    pub fn instance(&self, payload: Payload) -> Obj {
        Obj::with_def(self.def.clone(), payload)
    }

    /// Construct through the full pipeline: allocation by the base's
    /// rule, context capture, then the nearest initializer.
    pub fn construct(&self, engine: &Engine, value: &Obj, extra: CtorArgs) -> Result<Obj> {
        engine.construct(self, value, extra)
    }

    /// Start a subclass of this type. Only types with wrapper lineage can
    /// be subclassed; see [`SubclassBuilder::build`](crate::SubclassBuilder::build).
    pub fn subclass(&self, name: &str) -> crate::factory::SubclassBuilder {
        crate::factory::SubclassBuilder::new(self.clone(), name)
    }

    /// Whether a method under `name` is reachable through the chain
    pub fn has_method(&self, name: &str) -> bool {
        self.def.has_method(name)
    }

    /// The reachable method names, sorted
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.def.flattened_methods().into_keys().collect();
        names.sort();
        names
    }

    /// Look up a method's callable so it can be excluded before wrapping
    pub fn callable(&self, name: &str) -> Option<Callable> {
        self.def.lookup(name).map(|entry| entry.callable.clone())
    }

    /// Whether `self` and `other` are the same registered type
    pub fn ptr_eq(&self, other: &TypeHandle) -> bool {
        Arc::ptr_eq(&self.def, &other.def)
    }

    /// Whether this type has `other` in its parent chain (inclusive)
    pub fn is_descendant_of(&self, other: &TypeHandle) -> bool {
        self.def.is_subtype_of(other.id())
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for TypeHandle {}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({}#{})", self.def.name, self.def.id.as_u64())
    }
}

/// Builder for base types
pub struct TypeBuilder {
    name: String,
    parent: Option<TypeHandle>,
    storage: StorageKind,
    alloc: AllocRule,
    methods: FxHashMap<String, MethodEntry>,
    init: Option<InitFn>,
}

impl TypeBuilder {
    /// Start a base type with dynamic storage and default allocation
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            storage: StorageKind::Dynamic,
            alloc: AllocRule::Default,
            methods: FxHashMap::default(),
            init: None,
        }
    }

    /// Inherit from another base type
    pub fn parent(mut self, parent: &TypeHandle) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Set the attribute-storage declaration
    pub fn storage(mut self, storage: StorageKind) -> Self {
        self.storage = storage;
        self
    }

    /// Install a custom allocation rule deriving the payload from the
    /// value argument
    pub fn custom_alloc(
        mut self,
        f: impl Fn(&CallCx<'_>, &Obj) -> Result<Payload> + Send + Sync + 'static,
    ) -> Self {
        self.alloc = AllocRule::Custom(Arc::new(f));
        self
    }

    /// Add a method
    pub fn method(mut self, name: &str, callable: Callable) -> Self {
        self.methods.insert(name.to_string(), MethodEntry::declared(callable));
        self
    }

    /// Set the initializer
    pub fn init(
        mut self,
        f: impl Fn(&CallCx<'_>, &Obj, &CtorArgs) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.init = Some(Arc::new(f));
        self
    }

    /// Register the type with `engine` and return its handle
    pub fn register(self, engine: &Engine) -> TypeHandle {
        engine.register_def(TypeDef {
            id: TypeId::new(),
            name: self.name,
            parent: self.parent.map(|p| p.def.clone()),
            origin: None,
            storage: self.storage,
            alloc: self.alloc,
            methods: self.methods,
            init: self.init,
        })
    }
}
