//! Attribute-only records
//!
//! A record carries no payload; its state is whatever attributes the
//! caller sets. Records keep the default allocation rule, so wrapping
//! one copies its attributes and adopts its construction context.

use heir_core::{Callable, Engine, TypeBuilder, TypeHandle};

pub(crate) fn register(engine: &Engine) -> TypeHandle {
    TypeBuilder::new("Record")
        .method(
            "copy",
            Callable::new(|cx, recv, args| {
                crate::arity("copy", args, 0)?;
                let fresh = cx.alloc(recv.payload().clone());
                for name in recv.attr_names() {
                    if let Some(value) = recv.try_attr(&name) {
                        fresh.set_attr(&name, value)?;
                    }
                }
                Ok(fresh)
            }),
        )
        .register(engine)
}
