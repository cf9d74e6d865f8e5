//! Construction pipeline
//!
//! Construction is two-phase: allocate by the base type's rule, then run
//! the nearest initializer in the type chain. Between the phases the
//! extra arguments are captured as the instance's construction context,
//! which is what promotion later replays.

use tracing::trace;

use crate::engine::Engine;
use crate::object::Obj;
use crate::project::project;
use crate::types::{AllocRule, CallCx, TypeHandle};
use crate::Result;

/// Extra constructor arguments: everything beyond the leading value.
///
/// Opaque to the engine. Forwarded verbatim to the initializer at
/// construction time and replayed verbatim on every promotion.
#[derive(Debug, Clone, Default)]
pub struct CtorArgs {
    positional: Vec<Obj>,
    named: Vec<(String, Obj)>,
}

impl CtorArgs {
    /// Empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: Obj) -> Self {
        self.positional.push(value);
        self
    }

    /// Append a named argument
    pub fn named(mut self, name: &str, value: Obj) -> Self {
        self.named.push((name.to_string(), value));
        self
    }

    /// The positional arguments, in order
    pub fn args(&self) -> &[Obj] {
        &self.positional
    }

    /// The named arguments, in order
    pub fn named_args(&self) -> &[(String, Obj)] {
        &self.named
    }

    /// Look up a named argument
    pub fn get_named(&self, name: &str) -> Option<&Obj> {
        self.named
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// True when no extras were supplied
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// Run the full construction pipeline for `ty`.
pub(crate) fn run_construct(
    engine: &Engine,
    ty: &TypeHandle,
    value: &Obj,
    extra: CtorArgs,
) -> Result<Obj> {
    let cx = CallCx::new(engine, ty);

    let obj = match &ty.def().alloc {
        AllocRule::Custom(f) => {
            let payload = f(&cx, value)?;
            ty.instance(payload)
        }
        AllocRule::Default => {
            // Bare allocation: the value's payload, attributes, and
            // recorded context all carry over, so re-wrapping a value
            // that already holds state preserves that state.
            let obj = ty.instance(value.payload().clone());
            project(value, &obj)?;
            if let Some(ctx) = value.ctor_args() {
                obj.record_ctor_args(ctx.clone());
            }
            obj
        }
    };

    // First write wins: if the context was adopted above, this is a no-op.
    obj.record_ctor_args(extra.clone());

    if let Some(init) = ty.def().resolve_init() {
        init(&cx, &obj, &extra)?;
    }

    trace!(ty = %ty.name(), extras = !extra.is_empty(), "constructed instance");
    Ok(obj)
}
