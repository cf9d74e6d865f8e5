//! Built-in value types for heir
//!
//! Registers the stock base types against an [`Engine`] and hands back
//! their handles: null, booleans, integers, floats, strings, lists, maps,
//! and attribute records. Every method body allocates results of its own
//! type through the call context, so wrapped and subclassed variants of
//! these types keep their identity through the stock operations.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

use heir_core::{Engine, Error, Obj, Payload, Result, TypeHandle};
use rustc_hash::FxHashMap;

mod boolean;
mod float;
mod int;
mod list;
mod map;
mod null;
mod record;
mod string;

/// Handles to the stock base types registered by [`install`].
///
/// The bundle owns the only strong references the library creates; drop
/// it and the engine forgets the types.
#[derive(Debug, Clone)]
pub struct Builtins {
    /// The null singleton type
    pub null: TypeHandle,
    /// Booleans
    pub boolean: TypeHandle,
    /// 64-bit signed integers
    pub int: TypeHandle,
    /// 64-bit floats
    pub float: TypeHandle,
    /// UTF-8 strings
    pub string: TypeHandle,
    /// Ordered collections
    pub list: TypeHandle,
    /// String-keyed collections
    pub map: TypeHandle,
    /// Attribute-only records
    pub record: TypeHandle,
}

/// Register every built-in type with `engine`.
///
/// Types that hand back foreign-typed results capture the handles of the
/// types they produce, so registration order is fixed and the captures
/// only ever point backwards.
pub fn install(engine: &Engine) -> Builtins {
    let null = null::register(engine);
    let boolean = boolean::register(engine);
    let int = int::register(engine, &boolean);
    let float = float::register(engine, &boolean, &int);
    let string = string::register(engine, &boolean, &int);
    let list = list::register(engine, &null, &boolean, &int, &string);
    let map = map::register(engine, &null, &boolean, &int, &list, &string);
    let record = record::register(engine);

    Builtins {
        null,
        boolean,
        int,
        float,
        string,
        list,
        map,
        record,
    }
}

impl Builtins {
    /// The null value
    pub fn null_obj(&self) -> Obj {
        self.null.instance(Payload::Null)
    }

    /// A boolean value
    pub fn bool_of(&self, value: bool) -> Obj {
        self.boolean.instance(Payload::Bool(value))
    }

    /// An integer value
    pub fn int_of(&self, value: i64) -> Obj {
        self.int.instance(Payload::Int(value))
    }

    /// A float value
    pub fn float_of(&self, value: f64) -> Obj {
        self.float.instance(Payload::Float(value))
    }

    /// A string value
    pub fn str_of(&self, value: impl Into<String>) -> Obj {
        self.string.instance(Payload::Str(value.into()))
    }

    /// A list value
    pub fn list_of(&self, items: Vec<Obj>) -> Obj {
        self.list.instance(Payload::List(items))
    }

    /// A map value
    pub fn map_of(&self, entries: Vec<(String, Obj)>) -> Obj {
        self.map
            .instance(Payload::Map(entries.into_iter().collect::<FxHashMap<_, _>>()))
    }

    /// An empty record; state lives in its attributes
    pub fn record_obj(&self) -> Obj {
        self.record.instance(Payload::Null)
    }
}

pub(crate) fn arity(method: &str, args: &[Obj], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(Error::invocation(
            method,
            format!("expected {} argument(s), got {}", expected, args.len()),
        ));
    }
    Ok(())
}

pub(crate) fn int_arg(method: &str, args: &[Obj], idx: usize) -> Result<i64> {
    args[idx].payload().as_int().ok_or_else(|| {
        Error::invocation(method, format!("argument {} must be an integer", idx + 1))
    })
}

/// Accepts an integer where a float is expected.
pub(crate) fn float_arg(method: &str, args: &[Obj], idx: usize) -> Result<f64> {
    let payload = args[idx].payload();
    match &*payload {
        Payload::Float(f) => Ok(*f),
        Payload::Int(i) => Ok(*i as f64),
        _ => Err(Error::invocation(
            method,
            format!("argument {} must be a number", idx + 1),
        )),
    }
}

pub(crate) fn str_arg(method: &str, args: &[Obj], idx: usize) -> Result<String> {
    args[idx]
        .payload()
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| {
            Error::invocation(method, format!("argument {} must be a string", idx + 1))
        })
}

pub(crate) fn bool_arg(method: &str, args: &[Obj], idx: usize) -> Result<bool> {
    args[idx].payload().as_bool().ok_or_else(|| {
        Error::invocation(method, format!("argument {} must be a boolean", idx + 1))
    })
}
