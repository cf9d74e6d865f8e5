//! 64-bit floats
//!
//! Integer arguments coerce to floats; rounding operations hand back
//! integers.

use heir_core::{Callable, Engine, Error, Obj, Payload, Result, TypeBuilder, TypeHandle};

use crate::{arity, float_arg};

fn recv_float(method: &str, recv: &Obj) -> Result<f64> {
    recv.payload()
        .as_float()
        .ok_or_else(|| Error::invocation(method, "receiver payload is not a float"))
}

fn arith(
    name: &'static str,
    op: impl Fn(f64, f64) -> f64 + Send + Sync + 'static,
) -> Callable {
    Callable::new(move |cx, recv, args| {
        arity(name, args, 1)?;
        let a = recv_float(name, recv)?;
        let b = float_arg(name, args, 0)?;
        Ok(cx.alloc(Payload::Float(op(a, b))))
    })
}

fn rounding(
    name: &'static str,
    int: &TypeHandle,
    op: impl Fn(f64) -> f64 + Send + Sync + 'static,
) -> Callable {
    let int = int.clone();
    Callable::new(move |_cx, recv, args| {
        arity(name, args, 0)?;
        let a = recv_float(name, recv)?;
        let rounded = op(a);
        if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
            return Err(Error::invocation(
                name,
                format!("{} does not fit an integer", a),
            ));
        }
        Ok(int.instance(Payload::Int(rounded as i64)))
    })
}

pub(crate) fn register(engine: &Engine, boolean: &TypeHandle, int: &TypeHandle) -> TypeHandle {
    let lt_bool = boolean.clone();
    let gt_bool = boolean.clone();

    TypeBuilder::new("Float")
        .custom_alloc(|cx, value| {
            let payload = value.payload();
            match &*payload {
                Payload::Float(f) => Ok(Payload::Float(*f)),
                Payload::Int(i) => Ok(Payload::Float(*i as f64)),
                other => Err(Error::construction(
                    cx.owner().name(),
                    format!("expected a number, got {}", other.kind()),
                )),
            }
        })
        .method("add", arith("add", |a, b| a + b))
        .method("sub", arith("sub", |a, b| a - b))
        .method("mul", arith("mul", |a, b| a * b))
        .method(
            "div",
            Callable::new(|cx, recv, args| {
                arity("div", args, 1)?;
                let a = recv_float("div", recv)?;
                let b = float_arg("div", args, 0)?;
                if b == 0.0 {
                    return Err(Error::invocation("div", "division by zero"));
                }
                Ok(cx.alloc(Payload::Float(a / b)))
            }),
        )
        .method(
            "neg",
            Callable::new(|cx, recv, args| {
                arity("neg", args, 0)?;
                Ok(cx.alloc(Payload::Float(-recv_float("neg", recv)?)))
            }),
        )
        .method(
            "abs",
            Callable::new(|cx, recv, args| {
                arity("abs", args, 0)?;
                Ok(cx.alloc(Payload::Float(recv_float("abs", recv)?.abs())))
            }),
        )
        .method(
            "sqrt",
            Callable::new(|cx, recv, args| {
                arity("sqrt", args, 0)?;
                let a = recv_float("sqrt", recv)?;
                if a < 0.0 {
                    return Err(Error::invocation(
                        "sqrt",
                        "cannot take the square root of a negative number",
                    ));
                }
                Ok(cx.alloc(Payload::Float(a.sqrt())))
            }),
        )
        .method("floor", rounding("floor", int, f64::floor))
        .method("ceil", rounding("ceil", int, f64::ceil))
        .method("round", rounding("round", int, f64::round))
        .method(
            "lt",
            Callable::new(move |_cx, recv, args| {
                arity("lt", args, 1)?;
                let a = recv_float("lt", recv)?;
                let b = float_arg("lt", args, 0)?;
                Ok(lt_bool.instance(Payload::Bool(a < b)))
            }),
        )
        .method(
            "gt",
            Callable::new(move |_cx, recv, args| {
                arity("gt", args, 1)?;
                let a = recv_float("gt", recv)?;
                let b = float_arg("gt", args, 0)?;
                Ok(gt_bool.instance(Payload::Bool(a > b)))
            }),
        )
        .register(engine)
}
