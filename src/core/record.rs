//! Purpose: Typed domain records and the cell decoder that produces them.
//! Exports: `User`, `Thing`, `FeedItem`, `Record`, `decode`.
//! Role: Turns opaque executor cells into records; pure, no I/O.
//! Invariants: A cell is a node property map, or a REST node payload whose properties sit under `data`.
//! Invariants: Unknown properties are ignored; missing or mistyped fields are `Decode` errors.
use crate::core::error::{Error, ErrorKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

/// A Thing carries no creator. Who created it is a query-time join, see `FeedItem`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Thing {
    pub title: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeedItem {
    pub page: usize,
    pub thing: Thing,
    pub creator: User,
}

pub trait Record: DeserializeOwned {
    const SHAPE: &'static str;
}

impl Record for User {
    const SHAPE: &'static str = "User";
}

impl Record for Thing {
    const SHAPE: &'static str = "Thing";
}

pub fn decode<T: Record>(cell: &Value) -> Result<T, Error> {
    let properties = node_properties(cell).ok_or_else(|| {
        Error::new(ErrorKind::Decode).with_message(format!(
            "expected a {} node, got {}",
            T::SHAPE,
            value_kind(cell)
        ))
    })?;
    T::deserialize(properties).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message(format!("cell does not match {} shape: {err}", T::SHAPE))
            .with_source(err)
    })
}

fn node_properties(cell: &Value) -> Option<&Value> {
    let object = cell.as_object()?;
    // Legacy REST payloads wrap properties as {"self": "...", "data": {...}}.
    if object.contains_key("self") {
        if let Some(data) = object.get("data").filter(|data| data.is_object()) {
            return Some(data);
        }
    }
    Some(cell)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::{Thing, User, decode};
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn decodes_row_format_property_maps() {
        let user: User = decode(&json!({"username": "qwertyuiopas", "seq": 4})).expect("user");
        assert_eq!(user.username, "qwertyuiopas");
        let thing: Thing = decode(&json!({"title": "zxcvbnmasdfg"})).expect("thing");
        assert_eq!(thing.title, "zxcvbnmasdfg");
    }

    #[test]
    fn decodes_rest_node_payloads() {
        let cell = json!({
            "self": "http://localhost:7474/db/data/node/12",
            "data": {"title": "abc"},
            "metadata": {"id": 12, "labels": ["Thing"]}
        });
        let thing: Thing = decode(&cell).expect("thing");
        assert_eq!(thing.title, "abc");
    }

    #[test]
    fn missing_field_is_decode_error() {
        let err = decode::<Thing>(&json!({"name": "abc"})).expect_err("missing title");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.message().unwrap_or_default().contains("Thing"));
    }

    #[test]
    fn wrong_value_kind_is_decode_error() {
        let err = decode::<User>(&json!({"username": 42})).expect_err("number username");
        assert_eq!(err.kind(), ErrorKind::Decode);

        let err = decode::<User>(&json!("alice")).expect_err("scalar cell");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.message(), Some("expected a User node, got a string"));
    }
}
