//! Eagerly constructed singleton.
//!
//! [`EagerSlot`] builds its instance when the slot itself is built. Once a
//! value of this type exists there is no construction path left, so a bypass
//! attempt has nothing to call.

use tracing::info;

use crate::error::{Result, SlotError};
use crate::factory::ResourceFactory;
use crate::guard::IdentityGuard;
use crate::instance::{ConstructionPermit, Instance};
use crate::slot::SingletonAccess;

/// A singleton whose instance exists for as long as the slot does.
///
/// ```rust
/// use poolguard_core::{EagerSlot, SingletonAccess, from_fn};
///
/// let slot = EagerSlot::new(from_fn(|| Ok::<_, std::io::Error>("ready")))?;
/// assert_eq!(**slot.get(), "ready");
/// assert!(slot.construction_guard().is_none());
/// # Ok::<(), poolguard_core::SlotError>(())
/// ```
#[derive(Debug)]
pub struct EagerSlot<R> {
    instance: Instance<R>,
}

impl<R: Send + Sync> EagerSlot<R> {
    /// Run `factory` now and freeze the result.
    ///
    /// # Errors
    ///
    /// [`SlotError::ResourceInit`] if the factory fails. No slot exists in
    /// that case, so there is nothing to reset.
    pub fn new<F>(factory: F) -> Result<Self>
    where
        F: ResourceFactory<Resource = R>,
    {
        let resource = factory.create().map_err(SlotError::resource_init)?;
        let instance = Instance::new(ConstructionPermit::issue(), resource);
        info!(token = %instance.token(), "eager singleton instance built");
        Ok(Self { instance })
    }

    /// The instance. Infallible: it was built with the slot.
    pub fn get(&self) -> &Instance<R> {
        &self.instance
    }
}

impl<R: Send + Sync> SingletonAccess for EagerSlot<R> {
    type Resource = R;

    fn instance(&self) -> Result<&Instance<R>> {
        Ok(self.get())
    }

    fn construction_guard(&self) -> Option<IdentityGuard<'_, R>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::InstanceCodec;
    use crate::factory::from_fn;
    use crate::instance::IdentityToken;
    use serde_json::json;
    use std::io;

    #[test]
    fn test_eager_slot_builds_immediately() {
        let slot = EagerSlot::new(from_fn(|| Ok::<_, io::Error>(11u16))).unwrap();

        assert_eq!(**slot.get(), 11);
        assert!(slot.get().is_same(slot.instance().unwrap()));
    }

    #[test]
    fn test_eager_slot_failure_is_resource_init() {
        let result = EagerSlot::new(from_fn(|| {
            Err::<u16, _>(io::Error::new(io::ErrorKind::AddrNotAvailable, "no route"))
        }));

        assert!(matches!(result, Err(SlotError::ResourceInit { .. })));
    }

    #[test]
    fn test_eager_slot_resolves_decoded_instances() {
        let slot = EagerSlot::new(from_fn(|| Ok::<_, io::Error>("frozen".to_string()))).unwrap();

        let own = slot.get().encode_json().unwrap();
        assert!(slot.resolve_json(&own).unwrap().is_same(slot.get()));

        let foreign = json!({ "token": IdentityToken::generate(), "resource": "other" });
        assert!(slot.resolve_value(foreign).unwrap().is_same(slot.get()));
    }

    #[test]
    fn test_eager_slot_has_no_construction_path() {
        let slot = EagerSlot::new(from_fn(|| Ok::<_, io::Error>(()))).unwrap();
        assert!(slot.construction_guard().is_none());
    }
}
