//! Exclusion registry
//!
//! A process-wide set of callable identities that the factory and
//! subclass finalization consult: an excluded callable is bound straight
//! to the base type with no promotion step, so its results keep the
//! base type.

use dashmap::DashSet;
use once_cell::sync::Lazy;
use tracing::trace;

use crate::types::{Callable, CallableId};

static EXCLUDED: Lazy<DashSet<CallableId>> = Lazy::new(DashSet::default);

/// Mark a callable as exempt from interception and hand it back, so the
/// mark can be applied inline where the callable is defined.
pub fn exclude(callable: Callable) -> Callable {
    EXCLUDED.insert(callable.id());
    trace!(id = callable.id().as_u64(), "callable excluded from promotion");
    callable
}

/// Whether a callable carries the exclusion mark
pub fn is_excluded(callable: &Callable) -> bool {
    EXCLUDED.contains(&callable.id())
}
