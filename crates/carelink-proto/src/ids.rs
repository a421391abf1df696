//! Opaque identifiers.
//!
//! The portal's server hands out integer ids for some records and string ids
//! for others, and JSON object keys always arrive as strings. Identifiers
//! therefore compare by their textual form: `7` and `"7"` name the same user.
//! Numeric ids serialize back as numbers.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};

#[derive(Debug, Clone)]
struct Repr {
    raw: String,
    numeric: bool,
}

impl Repr {
    fn numeric(value: impl fmt::Display) -> Self {
        Self { raw: value.to_string(), numeric: true }
    }

    fn text(value: impl Into<String>) -> Self {
        Self { raw: value.into(), numeric: false }
    }

    /// Numeric order when both sides parse as integers, textual otherwise.
    /// Falls back to the raw text so the order stays consistent with `Eq`.
    fn order(&self, other: &Self) -> Ordering {
        match (self.raw.parse::<i128>(), other.raw.parse::<i128>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.raw.cmp(&other.raw)),
            _ => self.raw.cmp(&other.raw),
        }
    }
}

impl Serialize for Repr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.raw.parse::<i64>() {
            Ok(n) if self.numeric => serializer.serialize_i64(n),
            _ => serializer.serialize_str(&self.raw),
        }
    }
}

struct ReprVisitor;

impl Visitor<'_> for ReprVisitor {
    type Value = Repr;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or string identifier")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Repr, E> {
        Ok(Repr::numeric(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Repr, E> {
        Ok(Repr::numeric(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Repr, E> {
        if v.is_empty() {
            return Err(E::invalid_value(de::Unexpected::Str(v), &self));
        }
        Ok(Repr::text(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Repr, E> {
        if v.is_empty() {
            return Err(E::invalid_value(de::Unexpected::Str(&v), &self));
        }
        Ok(Repr::text(v))
    }
}

impl<'de> Deserialize<'de> for Repr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ReprVisitor)
    }
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(Repr);

        impl $name {
            /// Textual form of the identifier.
            pub fn as_str(&self) -> &str {
                &self.0.raw
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0.raw == other.0.raw
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.raw.hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.order(&other.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0.raw)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(Repr::numeric(value))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(Repr::text(value))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(Repr::text(value))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.0.serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Repr::deserialize(deserializer).map(Self)
            }
        }
    };
}

opaque_id!(
    /// Portal user (doctor or patient).
    UserId
);

opaque_id!(
    /// Server-assigned chat room. Never derived client-side.
    RoomId
);

opaque_id!(
    /// Server-assigned message id, orderable for display tie-breaks.
    MessageId
);

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn integer_and_string_forms_are_equal() {
        let from_int: UserId = serde_json::from_str("7").unwrap();
        let from_str: UserId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(from_int, from_str);
        assert_eq!(from_int, UserId::from(7));
    }

    #[test]
    fn map_keys_match_numeric_ids() {
        let counts: HashMap<UserId, u32> = serde_json::from_str(r#"{"7": 3, "u-9": 1}"#).unwrap();
        assert_eq!(counts.get(&UserId::from(7)), Some(&3));
        assert_eq!(counts.get(&UserId::from("u-9")), Some(&1));
    }

    #[test]
    fn numeric_ids_serialize_as_numbers() {
        assert_eq!(serde_json::to_string(&RoomId::from(12)).unwrap(), "12");
        assert_eq!(serde_json::to_string(&RoomId::from("r1")).unwrap(), "\"r1\"");
    }

    #[test]
    fn numeric_order_is_not_lexicographic() {
        assert!(MessageId::from(9) < MessageId::from(10));
        assert!(MessageId::from("a") < MessageId::from("b"));
    }

    #[test]
    fn empty_string_is_rejected() {
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }
}
