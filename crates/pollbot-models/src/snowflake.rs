//! Serde helpers for platform ids.
//!
//! The platform encodes 64-bit ids as JSON strings so that JavaScript clients
//! do not lose precision. Internally every id is an `i64`; these helpers accept
//! either a string or a bare integer and always write a string back out.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(id)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    deserializer.deserialize_any(SnowflakeVisitor)
}

struct SnowflakeVisitor;

impl<'de> Visitor<'de> for SnowflakeVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a snowflake id as a string or integer")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
        i64::try_from(value).map_err(|_| E::custom(format!("snowflake out of range: {value}")))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<i64, E> {
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| E::custom(format!("invalid snowflake: {value:?}")))
    }
}

/// Same as the parent module, for `Option<i64>` fields.
pub mod option {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.collect_str(id),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "super")] i64);

        let value = Option::<Wrapper>::deserialize(deserializer)?;
        Ok(value.map(|Wrapper(id)| id))
    }
}

/// For sets of ids, written as a JSON array of strings.
pub mod set {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::HashSet;

    pub fn serialize<S: Serializer>(ids: &HashSet<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut sorted: Vec<i64> = ids.iter().copied().collect();
        sorted.sort_unstable();
        let mut seq = serializer.serialize_seq(Some(sorted.len()))?;
        for id in sorted {
            seq.serialize_element(&id.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<HashSet<i64>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "super")] i64);

        let ids = Vec::<Wrapper>::deserialize(deserializer)?;
        Ok(ids.into_iter().map(|Wrapper(id)| id).collect())
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use std::collections::HashSet;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Holder {
        #[serde(with = "super")]
        id: i64,
        #[serde(default, with = "super::option")]
        parent: Option<i64>,
        #[serde(default, with = "super::set")]
        members: HashSet<i64>,
    }

    #[test]
    fn accepts_string_and_integer_ids() {
        let from_str: Holder = serde_json::from_str(r#"{"id":"1234567890123"}"#).unwrap();
        let from_int: Holder = serde_json::from_str(r#"{"id":1234567890123}"#).unwrap();
        assert_eq!(from_str, from_int);
        assert_eq!(from_str.parent, None);
    }

    #[test]
    fn writes_ids_as_strings() {
        let json = serde_json::to_value(Holder {
            id: 42,
            parent: Some(7),
            members: HashSet::from([9_007_199_254_740_993, 3]),
        })
        .unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["parent"], "7");
        assert_eq!(json["members"], serde_json::json!(["3", "9007199254740993"]));
    }

    #[test]
    fn id_sets_accept_mixed_encodings() {
        let holder: Holder =
            serde_json::from_str(r#"{"id":1,"members":["9007199254740993",5]}"#).unwrap();
        assert_eq!(holder.members, HashSet::from([9_007_199_254_740_993, 5]));
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Holder>(r#"{"id":"abc"}"#).is_err());
    }
}
