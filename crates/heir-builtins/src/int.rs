//! 64-bit signed integers
//!
//! Arithmetic is checked: overflow and division by zero surface as
//! invocation errors instead of wrapping or panicking. Comparison results
//! are plain booleans, which deliberately never promote.

use heir_core::{Callable, Engine, Error, Obj, Payload, Result, TypeBuilder, TypeHandle};

use crate::{arity, int_arg};

fn recv_int(method: &str, recv: &Obj) -> Result<i64> {
    recv.payload()
        .as_int()
        .ok_or_else(|| Error::invocation(method, "receiver payload is not an integer"))
}

fn checked(method: &str, result: Option<i64>) -> Result<i64> {
    result.ok_or_else(|| Error::invocation(method, "integer overflow"))
}

fn arith(
    name: &'static str,
    op: impl Fn(i64, i64) -> Option<i64> + Send + Sync + 'static,
) -> Callable {
    Callable::new(move |cx, recv, args| {
        arity(name, args, 1)?;
        let a = recv_int(name, recv)?;
        let b = int_arg(name, args, 0)?;
        Ok(cx.alloc(Payload::Int(checked(name, op(a, b))?)))
    })
}

fn compare(
    name: &'static str,
    boolean: &TypeHandle,
    op: impl Fn(i64, i64) -> bool + Send + Sync + 'static,
) -> Callable {
    let boolean = boolean.clone();
    Callable::new(move |_cx, recv, args| {
        arity(name, args, 1)?;
        let a = recv_int(name, recv)?;
        let b = int_arg(name, args, 0)?;
        Ok(boolean.instance(Payload::Bool(op(a, b))))
    })
}

pub(crate) fn register(engine: &Engine, boolean: &TypeHandle) -> TypeHandle {
    TypeBuilder::new("Int")
        .custom_alloc(|cx, value| {
            let payload = value.payload();
            match &*payload {
                Payload::Int(i) => Ok(Payload::Int(*i)),
                other => Err(Error::construction(
                    cx.owner().name(),
                    format!("expected an integer value, got {}", other.kind()),
                )),
            }
        })
        .method("add", arith("add", i64::checked_add))
        .method("sub", arith("sub", i64::checked_sub))
        .method("mul", arith("mul", i64::checked_mul))
        .method(
            "div",
            Callable::new(|cx, recv, args| {
                arity("div", args, 1)?;
                let a = recv_int("div", recv)?;
                let b = int_arg("div", args, 0)?;
                if b == 0 {
                    return Err(Error::invocation("div", "division by zero"));
                }
                Ok(cx.alloc(Payload::Int(checked("div", a.checked_div(b))?)))
            }),
        )
        .method(
            "rem",
            Callable::new(|cx, recv, args| {
                arity("rem", args, 1)?;
                let a = recv_int("rem", recv)?;
                let b = int_arg("rem", args, 0)?;
                if b == 0 {
                    return Err(Error::invocation("rem", "division by zero"));
                }
                Ok(cx.alloc(Payload::Int(checked("rem", a.checked_rem(b))?)))
            }),
        )
        .method("min", arith("min", |a, b| Some(a.min(b))))
        .method("max", arith("max", |a, b| Some(a.max(b))))
        .method(
            "neg",
            Callable::new(|cx, recv, args| {
                arity("neg", args, 0)?;
                let a = recv_int("neg", recv)?;
                Ok(cx.alloc(Payload::Int(checked("neg", a.checked_neg())?)))
            }),
        )
        .method(
            "abs",
            Callable::new(|cx, recv, args| {
                arity("abs", args, 0)?;
                let a = recv_int("abs", recv)?;
                Ok(cx.alloc(Payload::Int(checked("abs", a.checked_abs())?)))
            }),
        )
        .method("lt", compare("lt", boolean, |a, b| a < b))
        .method("le", compare("le", boolean, |a, b| a <= b))
        .method("gt", compare("gt", boolean, |a, b| a > b))
        .method("ge", compare("ge", boolean, |a, b| a >= b))
        .method("eq", compare("eq", boolean, |a, b| a == b))
        .register(engine)
}
