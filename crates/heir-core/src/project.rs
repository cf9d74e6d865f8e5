//! Attribute projection
//!
//! Copies user-level state from one instance onto another. Only
//! attributes move: the target's payload and construction context are
//! never touched.

use crate::object::Obj;
use crate::types::StorageKind;
use crate::Result;

/// Project `source`'s user attributes onto `target`.
///
/// Dynamic and mixed sources contribute their whole attribute map; a
/// fixed source contributes its declared names, silently skipping any
/// that were never set. Writes go through the target's ordinary storage
/// rules, so a declaration mismatch surfaces instead of being hidden.
pub(crate) fn project(source: &Obj, target: &Obj) -> Result<()> {
    match source.type_def().storage() {
        StorageKind::Dynamic | StorageKind::Mixed(_) => {
            for (name, value) in source.attrs_snapshot() {
                target.set_attr(&name, value)?;
            }
        }
        StorageKind::Fixed(declared) => {
            for name in declared {
                if let Some(value) = source.try_attr(name) {
                    target.set_attr(name, value)?;
                }
            }
        }
    }
    Ok(())
}
