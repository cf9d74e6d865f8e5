//! Intrinsic payloads
//!
//! Every instance carries exactly one `Payload`: the base-type value the
//! object is "about". User attributes and the construction context live
//! beside the payload, never inside it.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::object::Obj;

/// The intrinsic value of an instance.
///
/// Containers hold `Obj` handles, so elements keep their own types
/// (a list of wrapped ints stays a list of wrapped ints).
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Absence of a value
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Ordered sequence of objects
    List(Vec<Obj>),
    /// String-keyed mapping of objects
    Map(FxHashMap<String, Obj>),
}

/// Discriminant of a [`Payload`], used in diagnostics and kind checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// [`Payload::Null`]
    Null,
    /// [`Payload::Bool`]
    Bool,
    /// [`Payload::Int`]
    Int,
    /// [`Payload::Float`]
    Float,
    /// [`Payload::Str`]
    Str,
    /// [`Payload::List`]
    List,
    /// [`Payload::Map`]
    Map,
}

impl Payload {
    /// Get the payload's kind tag
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Null => PayloadKind::Null,
            Payload::Bool(_) => PayloadKind::Bool,
            Payload::Int(_) => PayloadKind::Int,
            Payload::Float(_) => PayloadKind::Float,
            Payload::Str(_) => PayloadKind::Str,
            Payload::List(_) => PayloadKind::List,
            Payload::Map(_) => PayloadKind::Map,
        }
    }

    /// True for [`Payload::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Null)
    }

    /// Extract a bool, if that is what this payload is
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Payload::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract an integer, if that is what this payload is
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Payload::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract a float, if that is what this payload is
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Payload::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrow the string payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the list payload
    pub fn as_list(&self) -> Option<&Vec<Obj>> {
        match self {
            Payload::List(items) => Some(items),
            _ => None,
        }
    }

    /// Mutably borrow the list payload
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Obj>> {
        match self {
            Payload::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the map payload
    pub fn as_map(&self) -> Option<&FxHashMap<String, Obj>> {
        match self {
            Payload::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Mutably borrow the map payload
    pub fn as_map_mut(&mut self) -> Option<&mut FxHashMap<String, Obj>> {
        match self {
            Payload::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayloadKind::Null => "null",
            PayloadKind::Bool => "bool",
            PayloadKind::Int => "int",
            PayloadKind::Float => "float",
            PayloadKind::Str => "str",
            PayloadKind::List => "list",
            PayloadKind::Map => "map",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Null => f.write_str("null"),
            Payload::Bool(b) => write!(f, "{}", b),
            Payload::Int(i) => write!(f, "{}", i),
            Payload::Float(x) => write!(f, "{}", x),
            Payload::Str(s) => f.write_str(s),
            Payload::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Payload::Map(entries) => {
                // Sorted so the output is stable regardless of hash order.
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                f.write_str("{")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, entries[key])?;
                }
                f.write_str("}")
            }
        }
    }
}
