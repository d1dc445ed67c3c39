//! Identity-bearing wrapper around a guarded resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use uuid::Uuid;

/// Stable identity of an [`Instance`].
///
/// Generated once when the instance is built and carried through its encoded
/// form, so a decoded representation can be matched against the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityToken(Uuid);

impl IdentityToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Proof that the identity guard admitted a construction.
///
/// Only the slots in this crate can obtain one with an empty slot, and
/// [`Instance`] cannot be built without one.
#[derive(Debug)]
#[must_use = "a construction permit is only useful when spent on an instance"]
pub struct ConstructionPermit {
    _private: (),
}

impl ConstructionPermit {
    pub(crate) fn issue() -> Self {
        Self { _private: () }
    }
}

/// The unique, identity-bearing wrapper around a guarded resource.
///
/// Instances are owned by a slot; callers only ever hold `&Instance<R>`.
/// `Instance` is neither `Clone` nor `Deserialize`, and its constructor is
/// private to this crate:
///
/// ```compile_fail
/// use poolguard_core::{ConstructionPermit, Instance};
///
/// fn forge(permit: ConstructionPermit) -> Instance<u32> {
///     Instance::new(permit, 1)
/// }
/// ```
///
/// ```compile_fail
/// use poolguard_core::{SingletonSlot, from_fn};
///
/// let slot = SingletonSlot::new(from_fn(|| Ok::<_, std::io::Error>(1u32)));
/// let copy: poolguard_core::Instance<u32> = slot.get().unwrap().clone();
/// ```
///
/// Domain methods of the resource are reachable through `Deref`.
#[derive(Debug, Serialize)]
pub struct Instance<R> {
    token: IdentityToken,
    created_at: DateTime<Utc>,
    resource: R,
}

impl<R> Instance<R> {
    pub(crate) fn new(_permit: ConstructionPermit, resource: R) -> Self {
        Self {
            token: IdentityToken::generate(),
            created_at: Utc::now(),
            resource,
        }
    }

    /// Identity token of this instance.
    pub fn token(&self) -> IdentityToken {
        self.token
    }

    /// When the instance was published.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The guarded resource.
    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Identity comparison: true only if both references point at the same
    /// instance. Structural equality is never used for instances.
    pub fn is_same(&self, other: &Instance<R>) -> bool {
        std::ptr::eq(self, other)
    }
}

impl<R> Deref for Instance<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<_> = (0..1000).map(|_| IdentityToken::generate()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_token_serializes_as_plain_uuid() {
        let token = IdentityToken::generate();
        let json = serde_json::to_string(&token).unwrap();

        assert_eq!(json, format!("\"{}\"", token.as_uuid()));
        let back: IdentityToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn test_identity_is_address_not_structure() {
        let a = Instance::new(ConstructionPermit::issue(), 5u8);
        let b = Instance::new(ConstructionPermit::issue(), 5u8);

        assert!(a.is_same(&a));
        assert!(!a.is_same(&b));
        assert_ne!(a.token(), b.token());
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_serialized_form_carries_token() {
        let instance = Instance::new(ConstructionPermit::issue(), "conn".to_string());
        let value = serde_json::to_value(&instance).unwrap();

        assert_eq!(value["token"], instance.token().as_uuid().to_string());
        assert_eq!(value["resource"], "conn");
        assert!(value["created_at"].is_string());
    }
}
