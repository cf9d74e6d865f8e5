//! String-keyed collections
//!
//! Key listings come out sorted so callers see a stable order.

use heir_core::{Callable, Engine, Error, Obj, Payload, Result, TypeBuilder, TypeHandle};
use rustc_hash::FxHashMap;

use crate::{arity, str_arg};

fn recv_entries(method: &str, recv: &Obj) -> Result<FxHashMap<String, Obj>> {
    recv.payload()
        .as_map()
        .cloned()
        .ok_or_else(|| Error::invocation(method, "receiver payload is not a map"))
}

fn sorted_keys(entries: &FxHashMap<String, Obj>) -> Vec<String> {
    let mut keys: Vec<String> = entries.keys().cloned().collect();
    keys.sort();
    keys
}

pub(crate) fn register(
    engine: &Engine,
    null: &TypeHandle,
    boolean: &TypeHandle,
    int: &TypeHandle,
    list: &TypeHandle,
    string: &TypeHandle,
) -> TypeHandle {
    let insert_null = null.clone();
    let has_bool = boolean.clone();
    let length_int = int.clone();
    let keys_list = list.clone();
    let keys_str = string.clone();
    let values_list = list.clone();

    TypeBuilder::new("Map")
        .custom_alloc(|cx, value| {
            let payload = value.payload();
            match &*payload {
                Payload::Map(entries) => Ok(Payload::Map(entries.clone())),
                other => Err(Error::construction(
                    cx.owner().name(),
                    format!("expected a map value, got {}", other.kind()),
                )),
            }
        })
        .method(
            "insert",
            Callable::new(move |_cx, recv, args| {
                arity("insert", args, 2)?;
                let key = str_arg("insert", args, 0)?;
                let mut payload = recv.payload_mut();
                let entries = payload
                    .as_map_mut()
                    .ok_or_else(|| Error::invocation("insert", "receiver payload is not a map"))?;
                entries.insert(key, args[1].clone());
                Ok(insert_null.instance(Payload::Null))
            }),
        )
        .method(
            "remove",
            Callable::new(|_cx, recv, args| {
                arity("remove", args, 1)?;
                let key = str_arg("remove", args, 0)?;
                let mut payload = recv.payload_mut();
                let entries = payload
                    .as_map_mut()
                    .ok_or_else(|| Error::invocation("remove", "receiver payload is not a map"))?;
                entries
                    .remove(&key)
                    .ok_or_else(|| Error::invocation("remove", format!("no key `{}`", key)))
            }),
        )
        .method(
            "get",
            Callable::new(|_cx, recv, args| {
                arity("get", args, 1)?;
                let key = str_arg("get", args, 0)?;
                let entries = recv_entries("get", recv)?;
                entries
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| Error::invocation("get", format!("no key `{}`", key)))
            }),
        )
        .method(
            "has",
            Callable::new(move |_cx, recv, args| {
                arity("has", args, 1)?;
                let key = str_arg("has", args, 0)?;
                let entries = recv_entries("has", recv)?;
                Ok(has_bool.instance(Payload::Bool(entries.contains_key(&key))))
            }),
        )
        .method(
            "length",
            Callable::new(move |_cx, recv, args| {
                arity("length", args, 0)?;
                let entries = recv_entries("length", recv)?;
                Ok(length_int.instance(Payload::Int(entries.len() as i64)))
            }),
        )
        .method(
            "keys",
            Callable::new(move |_cx, recv, args| {
                arity("keys", args, 0)?;
                let entries = recv_entries("keys", recv)?;
                let items: Vec<Obj> = sorted_keys(&entries)
                    .into_iter()
                    .map(|k| keys_str.instance(Payload::Str(k)))
                    .collect();
                Ok(keys_list.instance(Payload::List(items)))
            }),
        )
        .method(
            "values",
            Callable::new(move |_cx, recv, args| {
                arity("values", args, 0)?;
                let entries = recv_entries("values", recv)?;
                let items: Vec<Obj> = sorted_keys(&entries)
                    .into_iter()
                    .filter_map(|k| entries.get(&k).cloned())
                    .collect();
                Ok(values_list.instance(Payload::List(items)))
            }),
        )
        .method(
            "merged",
            Callable::new(|cx, recv, args| {
                arity("merged", args, 1)?;
                let mut entries = recv_entries("merged", recv)?;
                let other = args[0]
                    .payload()
                    .as_map()
                    .cloned()
                    .ok_or_else(|| Error::invocation("merged", "argument 1 must be a map"))?;
                entries.extend(other);
                Ok(cx.alloc(Payload::Map(entries)))
            }),
        )
        .register(engine)
}
