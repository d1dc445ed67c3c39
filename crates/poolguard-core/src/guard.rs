//! Identity guards.
//!
//! Two checks keep a slot down to one logical instance:
//!
//! - **Construction guard**: before an instance is built the guard confirms
//!   the slot is still empty and hands out a [`ConstructionPermit`]. The lock
//!   protocol in [`SingletonSlot`](crate::SingletonSlot) is what actually
//!   serializes construction; the guard is a second assertion on that path.
//! - **Decode resolution**: a decoded representation never becomes an
//!   instance. It is matched against the canonical one and discarded.

use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::codec::DecodedInstance;
use crate::error::{Result, SlotError};
use crate::instance::{ConstructionPermit, Instance};

/// Guard over the storage cell of a slot.
#[derive(Debug)]
pub struct IdentityGuard<'a, R> {
    cell: &'a OnceLock<Instance<R>>,
}

impl<'a, R> IdentityGuard<'a, R> {
    pub(crate) fn new(cell: &'a OnceLock<Instance<R>>) -> Self {
        Self { cell }
    }

    /// Admit a construction if the slot is still empty.
    ///
    /// # Errors
    ///
    /// [`SlotError::Construction`] naming the existing instance when the slot
    /// already holds one. The slot is not modified.
    pub fn check_construction(&self) -> Result<ConstructionPermit> {
        match self.cell.get() {
            Some(existing) => {
                warn!(existing = %existing.token(), "rejected construction of a second instance");
                Err(SlotError::Construction {
                    existing: existing.token(),
                })
            }
            None => Ok(ConstructionPermit::issue()),
        }
    }

    /// The canonical instance, if one is published.
    pub fn canonical(&self) -> Option<&'a Instance<R>> {
        self.cell.get()
    }
}

/// Map a decoded representation onto the canonical instance.
///
/// The decoded payload is always dropped. A token that does not match the
/// canonical instance (an encoding from another process or an earlier slot)
/// is logged and still resolves to the canonical instance.
pub fn resolve_decoded<'a, R>(
    decoded: &DecodedInstance,
    canonical: &'a Instance<R>,
) -> &'a Instance<R> {
    if decoded.token == canonical.token() {
        debug!(token = %decoded.token, "decoded instance resolved to canonical");
    } else {
        warn!(
            decoded = %decoded.token,
            canonical = %canonical.token(),
            "decoded instance does not match the live one; resolving to canonical"
        );
    }
    canonical
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::IdentityToken;

    #[test]
    fn test_empty_cell_issues_permit() {
        let cell: OnceLock<Instance<u8>> = OnceLock::new();
        let guard = IdentityGuard::new(&cell);

        assert!(guard.check_construction().is_ok());
        assert!(guard.canonical().is_none());
    }

    #[test]
    fn test_occupied_cell_rejects_construction() {
        let cell = OnceLock::new();
        let _ = cell.set(Instance::new(ConstructionPermit::issue(), 1u8));
        let token = cell.get().unwrap().token();
        let guard = IdentityGuard::new(&cell);

        match guard.check_construction() {
            Err(SlotError::Construction { existing }) => assert_eq!(existing, token),
            other => panic!("Expected Construction error, got {other:?}"),
        }
        assert_eq!(guard.canonical().unwrap().token(), token);
    }

    #[test]
    fn test_resolve_matching_token() {
        let canonical = Instance::new(ConstructionPermit::issue(), "live");
        let decoded = DecodedInstance {
            token: canonical.token(),
            created_at: Some(canonical.created_at()),
        };

        assert!(resolve_decoded(&decoded, &canonical).is_same(&canonical));
    }

    #[test]
    fn test_resolve_foreign_token_still_canonical() {
        let canonical = Instance::new(ConstructionPermit::issue(), "live");
        let decoded = DecodedInstance {
            token: IdentityToken::generate(),
            created_at: None,
        };

        let resolved = resolve_decoded(&decoded, &canonical);
        assert!(resolved.is_same(&canonical));
        assert_ne!(resolved.token(), decoded.token);
    }
}
