//! Encoded form of an instance and the decode hook that resolves it.
//!
//! An instance encodes to JSON as
//!
//! ```text
//! {"token": "<uuid>", "created_at": "<rfc3339>", "resource": { ... }}
//! ```
//!
//! Decoding never rebuilds an [`Instance`]: only the identity fields are read
//! ([`DecodedInstance`]), the resource payload is skipped, and the slot hands
//! back its canonical instance (resolve-on-read).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeSeed, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::instance::{IdentityToken, Instance};
use crate::slot::SingletonAccess;

/// Serialization helpers for instances.
///
/// Blanket-implemented for every `Instance<R>` whose resource is `Serialize`.
///
/// # Example
///
/// ```
/// use poolguard_core::{InstanceCodec, SingletonAccess, SingletonSlot, from_fn};
///
/// let slot = SingletonSlot::new(from_fn(|| Ok::<_, std::io::Error>(String::from("conn-7"))));
/// let live = slot.get()?;
///
/// let json = live.encode_json()?;
/// let resolved = slot.resolve_json(&json)?;
///
/// assert!(resolved.is_same(live));
/// # Ok::<(), poolguard_core::SlotError>(())
/// ```
pub trait InstanceCodec {
    /// Encode to a compact JSON string.
    fn encode_json(&self) -> Result<String>;

    /// Encode to a JSON value.
    fn encode_value(&self) -> Result<Value>;
}

impl<R: Serialize> InstanceCodec for Instance<R> {
    fn encode_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn encode_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Identity fields read back from an encoded instance.
///
/// Any other fields, including the resource payload, are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecodedInstance {
    /// Token of the instance that was encoded
    pub token: IdentityToken,
    /// Creation timestamp, if the encoding carried one
    pub created_at: Option<DateTime<Utc>>,
}

pub(crate) fn decode_json(encoded: &str) -> Result<DecodedInstance> {
    Ok(serde_json::from_str(encoded)?)
}

pub(crate) fn decode_value(encoded: Value) -> Result<DecodedInstance> {
    Ok(serde_json::from_value(encoded)?)
}

/// A [`DeserializeSeed`] resolving an embedded instance onto a slot.
///
/// Use it when the encoded instance sits inside a larger document that is
/// being deserialized field by field.
///
/// ```
/// use poolguard_core::{InstanceCodec, InstanceSeed, SingletonSlot, from_fn};
/// use serde::de::DeserializeSeed;
///
/// let slot = SingletonSlot::new(from_fn(|| Ok::<_, std::io::Error>(5u64)));
/// let json = slot.get()?.encode_json()?;
///
/// let mut de = serde_json::Deserializer::from_str(&json);
/// let resolved = InstanceSeed::new(&slot).deserialize(&mut de)?;
/// assert!(resolved.is_same(slot.get()?));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct InstanceSeed<'a, S: ?Sized> {
    slot: &'a S,
}

impl<'a, S: SingletonAccess + ?Sized> InstanceSeed<'a, S> {
    /// Seed resolving onto `slot`.
    pub fn new(slot: &'a S) -> Self {
        Self { slot }
    }
}

impl<S: ?Sized> fmt::Debug for InstanceSeed<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceSeed").finish_non_exhaustive()
    }
}

impl<'de, 'a, S> DeserializeSeed<'de> for InstanceSeed<'a, S>
where
    S: SingletonAccess + ?Sized,
{
    type Value = &'a Instance<S::Resource>;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        let decoded = DecodedInstance::deserialize(deserializer)?;
        self.slot.resolve(&decoded).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlotError;
    use crate::factory::from_fn;
    use crate::slot::{SingletonSlot, SlotState};
    use serde_json::json;
    use std::io;

    #[derive(Debug, Serialize)]
    struct Conn {
        id: String,
        port: u16,
    }

    fn conn_slot() -> SingletonSlot<impl crate::ResourceFactory<Resource = Conn>> {
        SingletonSlot::new(from_fn(|| {
            Ok::<_, io::Error>(Conn {
                id: "conn-1".into(),
                port: 5432,
            })
        }))
    }

    #[test]
    fn test_round_trip_preserves_identity() {
        let slot = conn_slot();
        let live = slot.get().unwrap();

        let json = live.encode_json().unwrap();
        let resolved = slot.resolve_json(&json).unwrap();

        assert!(resolved.is_same(live));
        assert_eq!(resolved.token(), live.token());
    }

    #[test]
    fn test_value_round_trip() {
        let slot = conn_slot();
        let live = slot.get().unwrap();

        let value = live.encode_value().unwrap();
        assert_eq!(value["resource"]["port"], 5432);

        let resolved = slot.resolve_value(value).unwrap();
        assert!(resolved.is_same(live));
    }

    #[test]
    fn test_tampered_payload_is_discarded() {
        let slot = conn_slot();
        let live = slot.get().unwrap();

        let mut value = live.encode_value().unwrap();
        value["resource"]["id"] = json!("conn-forged");
        let resolved = slot.resolve_value(value).unwrap();

        assert!(resolved.is_same(live));
        assert_eq!(resolved.id, "conn-1");
    }

    #[test]
    fn test_decode_on_empty_slot_initializes_normally() {
        let slot = conn_slot();
        let foreign = json!({ "token": IdentityToken::generate() }).to_string();

        let resolved = slot.resolve_json(&foreign).unwrap();

        assert_eq!(slot.state(), SlotState::Ready);
        assert_eq!(slot.factory_invocations(), 1);
        assert!(resolved.is_same(slot.get().unwrap()));
    }

    #[test]
    fn test_missing_token_is_codec_error() {
        let slot = conn_slot();

        let err = slot.resolve_json(r#"{"resource": {}}"#).unwrap_err();
        assert!(matches!(err, SlotError::Codec(_)));
        assert_eq!(slot.state(), SlotState::Uninitialized);
    }

    #[test]
    fn test_seed_inside_larger_document() {
        let slot = conn_slot();
        let live = slot.get().unwrap();
        let doc = json!({ "name": "primary", "pool": live.encode_value().unwrap() });

        let pool = doc.get("pool").cloned().unwrap();
        let resolved = InstanceSeed::new(&slot).deserialize(pool).unwrap();

        assert!(resolved.is_same(live));
    }

    #[test]
    fn test_seed_surfaces_factory_failure() {
        let slot = SingletonSlot::new(from_fn(|| {
            Err::<Conn, _>(io::Error::new(io::ErrorKind::NotConnected, "offline"))
        }));
        let encoded = json!({ "token": IdentityToken::generate() });

        let err = InstanceSeed::new(&slot).deserialize(encoded).unwrap_err();
        assert!(err.to_string().contains("offline"));
    }
}
