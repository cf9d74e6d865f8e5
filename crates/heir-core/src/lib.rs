//! Heir Wrapping Engine
//!
//! This crate provides the wrapping/coercion engine including:
//! - Weak, memoized wrapper-type registry (the `Engine`)
//! - Wrapper synthesis and subclass finalization
//! - Method interception with result promotion and context replay
//! - Attribute projection between instances
//! - A process-wide exclusion registry for opting callables out
//!
//! A wrapper type synthesized over a base type keeps its identity through
//! inherited operations: a method that would hand back a plain base value
//! instead hands back the receiver's own type, rebuilt through the user's
//! initializer with the original construction arguments replayed.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod construct;
pub mod engine;
pub mod exclude;
mod factory;
mod intercept;
pub mod object;
mod project;
pub mod types;
pub mod value;

pub use construct::CtorArgs;
pub use engine::Engine;
pub use exclude::{exclude, is_excluded};
pub use factory::SubclassBuilder;
pub use object::{is_reserved_slot, Obj, CTOR_ARGS_SLOT, CTOR_NAMED_SLOT};
pub use types::{
    AllocFn, AllocRule, CallCx, Callable, CallableId, InitFn, MethodFn, StorageKind, TypeBuilder,
    TypeDef, TypeHandle, TypeId,
};
pub use value::{Payload, PayloadKind};

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value or its extra arguments were rejected during construction.
    /// Promotion replay raises this same variant through the same path,
    /// so a caller cannot tell a rejected method result from a rejected
    /// direct construction.
    #[error("construction of `{type_name}` rejected: {reason}")]
    Construction {
        /// Type being constructed
        type_name: String,
        /// Why the initializer or allocation rule said no
        reason: String,
    },

    /// The wrap target is not a live registered type, or subclassing was
    /// attempted outside a wrapper lineage
    #[error("unsupported base type: {detail}")]
    UnsupportedBaseType {
        /// What was wrong with the target
        detail: String,
    },

    /// Attribute read of a name that is not set
    #[error("`{type_name}` has no attribute `{attr}`")]
    UnknownAttribute {
        /// Type of the instance
        type_name: String,
        /// Attribute name
        attr: String,
    },

    /// Attribute write outside the storage declaration, or access to a
    /// reserved capture slot
    #[error("`{type_name}` does not allow attribute `{attr}`")]
    RestrictedAttribute {
        /// Type of the instance
        type_name: String,
        /// Attribute name
        attr: String,
    },

    /// Method dispatch found nothing under the name
    #[error("`{type_name}` has no method `{method}`")]
    UnknownMethod {
        /// Type of the receiver
        type_name: String,
        /// Method name
        method: String,
    },

    /// A method body rejected its arguments
    #[error("`{method}`: {reason}")]
    Invocation {
        /// Method name
        method: String,
        /// What was wrong
        reason: String,
    },
}

impl Error {
    /// Build a [`Error::Construction`]
    pub fn construction(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Construction {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`Error::Invocation`]
    pub fn invocation(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Invocation {
            method: method.into(),
            reason: reason.into(),
        }
    }
}

/// Engine result
pub type Result<T> = std::result::Result<T, Error>;
