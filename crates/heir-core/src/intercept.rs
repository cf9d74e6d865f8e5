//! Method interception
//!
//! An intercepted callable runs the base type's behavior, then inspects
//! the finished result. A result of exactly the base type is promoted to
//! the receiver's concrete type by reconstructing it through the full
//! pipeline with the receiver's captured context replayed, then carrying
//! the receiver's user attributes over. Anything else passes through
//! untouched, which keeps results that are already of the receiver's
//! type, of a foreign type, or still pending (deferred values an async
//! base method hands back) out of promotion entirely.

use std::sync::Arc;

use tracing::trace;

use crate::project::project;
use crate::types::{CallCx, Callable, TypeDef, TypeHandle};

/// Bind `callable` to run owned by `base`, with no promotion. Excluded
/// callables install through this, so their results are exactly what the
/// base type produces.
pub(crate) fn rebind(callable: &Callable, base: &Arc<TypeDef>) -> Callable {
    let base = base.clone();
    let inner = callable.clone();
    Callable::new(move |cx, recv, args| {
        let base_handle = TypeHandle::from_def(base.clone());
        let base_cx = CallCx::new(cx.engine(), &base_handle);
        inner.invoke(&base_cx, recv, args)
    })
}

/// Wrap `callable` so exact-`base` results are promoted to the
/// receiver's type.
pub(crate) fn intercept(callable: &Callable, base: &Arc<TypeDef>) -> Callable {
    let base = base.clone();
    let inner = callable.clone();
    Callable::new(move |cx, recv, args| {
        // The original behavior runs owned by the base type, so any
        // results it allocates for itself come out as plain base values.
        let base_handle = TypeHandle::from_def(base.clone());
        let base_cx = CallCx::new(cx.engine(), &base_handle);
        let raw = inner.invoke(&base_cx, recv, args)?;

        if raw.type_id() != base.id() {
            return Ok(raw);
        }
        let target = recv.type_handle();
        if target.id() == base.id() {
            return Ok(raw);
        }

        trace!(base = %base.name(), target = %target.name(), "promoting result");
        let ctx = recv.ctor_args().cloned().unwrap_or_default();
        // A rejection here is the same failure direct construction
        // would raise; it propagates to the method's caller unchanged.
        let promoted = cx.engine().construct(&target, &raw, ctx)?;
        project(recv, &promoted)?;
        Ok(promoted)
    })
}
