//! Ordered collections
//!
//! `push`, `pop`, and `set_at` mutate the receiver in place; the rest
//! hand back fresh values. In-place mutation never changes the
//! receiver's type, so these methods return null or the element rather
//! than the receiver.

use heir_core::{Callable, Engine, Error, Obj, Payload, Result, TypeBuilder, TypeHandle};

use crate::{arity, int_arg, str_arg};

fn recv_items(method: &str, recv: &Obj) -> Result<Vec<Obj>> {
    recv.payload()
        .as_list()
        .cloned()
        .ok_or_else(|| Error::invocation(method, "receiver payload is not a list"))
}

fn index_in(method: &str, index: i64, len: usize) -> Result<usize> {
    if index < 0 || index as usize >= len {
        return Err(Error::invocation(
            method,
            format!("index {} out of range for length {}", index, len),
        ));
    }
    Ok(index as usize)
}

pub(crate) fn register(
    engine: &Engine,
    null: &TypeHandle,
    boolean: &TypeHandle,
    int: &TypeHandle,
    string: &TypeHandle,
) -> TypeHandle {
    let push_null = null.clone();
    let set_null = null.clone();
    let contains_bool = boolean.clone();
    let length_int = int.clone();
    let join_str = string.clone();

    TypeBuilder::new("List")
        .custom_alloc(|cx, value| {
            let payload = value.payload();
            match &*payload {
                Payload::List(items) => Ok(Payload::List(items.clone())),
                other => Err(Error::construction(
                    cx.owner().name(),
                    format!("expected a list value, got {}", other.kind()),
                )),
            }
        })
        .method(
            "push",
            Callable::new(move |_cx, recv, args| {
                arity("push", args, 1)?;
                let mut payload = recv.payload_mut();
                let items = payload
                    .as_list_mut()
                    .ok_or_else(|| Error::invocation("push", "receiver payload is not a list"))?;
                items.push(args[0].clone());
                Ok(push_null.instance(Payload::Null))
            }),
        )
        .method(
            "pop",
            Callable::new(|_cx, recv, args| {
                arity("pop", args, 0)?;
                let mut payload = recv.payload_mut();
                let items = payload
                    .as_list_mut()
                    .ok_or_else(|| Error::invocation("pop", "receiver payload is not a list"))?;
                items
                    .pop()
                    .ok_or_else(|| Error::invocation("pop", "empty list"))
            }),
        )
        .method(
            "get",
            Callable::new(|_cx, recv, args| {
                arity("get", args, 1)?;
                let index = int_arg("get", args, 0)?;
                let items = recv_items("get", recv)?;
                let at = index_in("get", index, items.len())?;
                Ok(items[at].clone())
            }),
        )
        .method(
            "set_at",
            Callable::new(move |_cx, recv, args| {
                arity("set_at", args, 2)?;
                let index = int_arg("set_at", args, 0)?;
                let mut payload = recv.payload_mut();
                let items = payload
                    .as_list_mut()
                    .ok_or_else(|| Error::invocation("set_at", "receiver payload is not a list"))?;
                let at = index_in("set_at", index, items.len())?;
                items[at] = args[1].clone();
                Ok(set_null.instance(Payload::Null))
            }),
        )
        .method(
            "concat",
            Callable::new(|cx, recv, args| {
                arity("concat", args, 1)?;
                let mut items = recv_items("concat", recv)?;
                let other = args[0]
                    .payload()
                    .as_list()
                    .cloned()
                    .ok_or_else(|| Error::invocation("concat", "argument 1 must be a list"))?;
                items.extend(other);
                Ok(cx.alloc(Payload::List(items)))
            }),
        )
        .method(
            "sliced",
            Callable::new(|cx, recv, args| {
                arity("sliced", args, 2)?;
                let start = int_arg("sliced", args, 0)?;
                let end = int_arg("sliced", args, 1)?;
                if start < 0 || end < start {
                    return Err(Error::invocation(
                        "sliced",
                        format!("invalid range {}..{}", start, end),
                    ));
                }
                let items = recv_items("sliced", recv)?;
                let sliced: Vec<Obj> = items
                    .into_iter()
                    .skip(start as usize)
                    .take((end - start) as usize)
                    .collect();
                Ok(cx.alloc(Payload::List(sliced)))
            }),
        )
        .method(
            "reversed",
            Callable::new(|cx, recv, args| {
                arity("reversed", args, 0)?;
                let mut items = recv_items("reversed", recv)?;
                items.reverse();
                Ok(cx.alloc(Payload::List(items)))
            }),
        )
        .method(
            "length",
            Callable::new(move |_cx, recv, args| {
                arity("length", args, 0)?;
                let items = recv_items("length", recv)?;
                Ok(length_int.instance(Payload::Int(items.len() as i64)))
            }),
        )
        .method(
            "contains",
            Callable::new(move |_cx, recv, args| {
                arity("contains", args, 1)?;
                let items = recv_items("contains", recv)?;
                let found = items.iter().any(|item| item == &args[0]);
                Ok(contains_bool.instance(Payload::Bool(found)))
            }),
        )
        .method(
            "join",
            Callable::new(move |_cx, recv, args| {
                arity("join", args, 1)?;
                let sep = str_arg("join", args, 0)?;
                let items = recv_items("join", recv)?;
                let mut parts = Vec::with_capacity(items.len());
                for item in &items {
                    let piece = item.payload().as_str().map(str::to_owned).ok_or_else(|| {
                        Error::invocation("join", "every element must be a string")
                    })?;
                    parts.push(piece);
                }
                Ok(join_str.instance(Payload::Str(parts.join(&sep))))
            }),
        )
        .register(engine)
}
