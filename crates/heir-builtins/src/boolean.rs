//! Booleans

use heir_core::{Callable, Engine, Error, Obj, Payload, Result, TypeBuilder, TypeHandle};

use crate::{arity, bool_arg};

fn recv_bool(method: &str, recv: &Obj) -> Result<bool> {
    recv.payload()
        .as_bool()
        .ok_or_else(|| Error::invocation(method, "receiver payload is not a boolean"))
}

pub(crate) fn register(engine: &Engine) -> TypeHandle {
    TypeBuilder::new("Bool")
        .custom_alloc(|cx, value| {
            let payload = value.payload();
            match &*payload {
                Payload::Bool(b) => Ok(Payload::Bool(*b)),
                other => Err(Error::construction(
                    cx.owner().name(),
                    format!("expected a boolean value, got {}", other.kind()),
                )),
            }
        })
        .method(
            "negate",
            Callable::new(|cx, recv, args| {
                arity("negate", args, 0)?;
                Ok(cx.alloc(Payload::Bool(!recv_bool("negate", recv)?)))
            }),
        )
        .method(
            "and",
            Callable::new(|cx, recv, args| {
                arity("and", args, 1)?;
                let a = recv_bool("and", recv)?;
                let b = bool_arg("and", args, 0)?;
                Ok(cx.alloc(Payload::Bool(a && b)))
            }),
        )
        .method(
            "or",
            Callable::new(|cx, recv, args| {
                arity("or", args, 1)?;
                let a = recv_bool("or", recv)?;
                let b = bool_arg("or", args, 0)?;
                Ok(cx.alloc(Payload::Bool(a || b)))
            }),
        )
        .register(engine)
}
