//! The null singleton type

use heir_core::{Engine, Error, Payload, TypeBuilder, TypeHandle};

pub(crate) fn register(engine: &Engine) -> TypeHandle {
    TypeBuilder::new("Null")
        .custom_alloc(|cx, value| {
            let payload = value.payload();
            if payload.is_null() {
                Ok(Payload::Null)
            } else {
                Err(Error::construction(
                    cx.owner().name(),
                    format!("expected a null value, got {}", payload.kind()),
                ))
            }
        })
        .register(engine)
}
