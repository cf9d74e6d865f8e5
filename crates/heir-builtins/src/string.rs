//! UTF-8 strings
//!
//! Indexing operations count characters, not bytes.

use heir_core::{Callable, Engine, Error, Obj, Payload, Result, TypeBuilder, TypeHandle};

use crate::{arity, int_arg, str_arg};

fn recv_str(method: &str, recv: &Obj) -> Result<String> {
    recv.payload()
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| Error::invocation(method, "receiver payload is not a string"))
}

fn transform(
    name: &'static str,
    op: impl Fn(&str) -> String + Send + Sync + 'static,
) -> Callable {
    Callable::new(move |cx, recv, args| {
        arity(name, args, 0)?;
        Ok(cx.alloc(Payload::Str(op(&recv_str(name, recv)?))))
    })
}

fn predicate(
    name: &'static str,
    boolean: &TypeHandle,
    op: impl Fn(&str, &str) -> bool + Send + Sync + 'static,
) -> Callable {
    let boolean = boolean.clone();
    Callable::new(move |_cx, recv, args| {
        arity(name, args, 1)?;
        let s = recv_str(name, recv)?;
        let needle = str_arg(name, args, 0)?;
        Ok(boolean.instance(Payload::Bool(op(&s, &needle))))
    })
}

pub(crate) fn register(engine: &Engine, boolean: &TypeHandle, int: &TypeHandle) -> TypeHandle {
    let length_int = int.clone();
    let find_int = int.clone();

    TypeBuilder::new("Str")
        .custom_alloc(|cx, value| {
            let payload = value.payload();
            match &*payload {
                Payload::Str(s) => Ok(Payload::Str(s.clone())),
                other => Err(Error::construction(
                    cx.owner().name(),
                    format!("expected a string value, got {}", other.kind()),
                )),
            }
        })
        .method(
            "concat",
            Callable::new(|cx, recv, args| {
                arity("concat", args, 1)?;
                let mut s = recv_str("concat", recv)?;
                s.push_str(&str_arg("concat", args, 0)?);
                Ok(cx.alloc(Payload::Str(s)))
            }),
        )
        .method("upper", transform("upper", str::to_uppercase))
        .method("lower", transform("lower", str::to_lowercase))
        .method("trim", transform("trim", |s| s.trim().to_string()))
        .method(
            "replace",
            Callable::new(|cx, recv, args| {
                arity("replace", args, 2)?;
                let s = recv_str("replace", recv)?;
                let from = str_arg("replace", args, 0)?;
                let to = str_arg("replace", args, 1)?;
                Ok(cx.alloc(Payload::Str(s.replace(&from, &to))))
            }),
        )
        .method(
            "repeat",
            Callable::new(|cx, recv, args| {
                arity("repeat", args, 1)?;
                let s = recv_str("repeat", recv)?;
                let count = int_arg("repeat", args, 0)?;
                if count < 0 {
                    return Err(Error::invocation("repeat", "count must be non-negative"));
                }
                Ok(cx.alloc(Payload::Str(s.repeat(count as usize))))
            }),
        )
        .method(
            "slice",
            Callable::new(|cx, recv, args| {
                arity("slice", args, 2)?;
                let s = recv_str("slice", recv)?;
                let start = int_arg("slice", args, 0)?;
                let end = int_arg("slice", args, 1)?;
                if start < 0 || end < start {
                    return Err(Error::invocation(
                        "slice",
                        format!("invalid range {}..{}", start, end),
                    ));
                }
                let sliced: String = s
                    .chars()
                    .skip(start as usize)
                    .take((end - start) as usize)
                    .collect();
                Ok(cx.alloc(Payload::Str(sliced)))
            }),
        )
        .method(
            "length",
            Callable::new(move |_cx, recv, args| {
                arity("length", args, 0)?;
                let s = recv_str("length", recv)?;
                Ok(length_int.instance(Payload::Int(s.chars().count() as i64)))
            }),
        )
        .method(
            "find",
            Callable::new(move |_cx, recv, args| {
                arity("find", args, 1)?;
                let s = recv_str("find", recv)?;
                let needle = str_arg("find", args, 0)?;
                let index = match s.find(&needle) {
                    Some(byte_idx) => s[..byte_idx].chars().count() as i64,
                    None => -1,
                };
                Ok(find_int.instance(Payload::Int(index)))
            }),
        )
        .method("contains", predicate("contains", boolean, |s, n| s.contains(n)))
        .method(
            "starts_with",
            predicate("starts_with", boolean, |s, n| s.starts_with(n)),
        )
        .method(
            "ends_with",
            predicate("ends_with", boolean, |s, n| s.ends_with(n)),
        )
        .register(engine)
}
