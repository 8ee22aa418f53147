//! Purpose: Parameterized statement value passed to every executor.
//! Exports: `Statement`, `Params`.
//! Role: Pairs a template containing `$name` placeholders with its bound parameters.
//! Invariants: Parameters are JSON values; nested objects build node property maps.
use serde_json::{Map, Value};
use std::borrow::Cow;

pub type Params = Map<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    text: Cow<'static, str>,
    params: Params,
}

impl Statement {
    pub fn new(text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            text: text.into(),
            params: Params::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::Statement;
    use serde_json::json;

    #[test]
    fn params_accumulate_and_overwrite() {
        let statement = Statement::new("MATCH (u:User) WITH u SKIP $skip LIMIT 1 RETURN u")
            .param("skip", 1)
            .param("props", json!({"username": "abc"}))
            .param("skip", 2);
        assert_eq!(statement.get("skip"), Some(&json!(2)));
        assert_eq!(statement.get("props"), Some(&json!({"username": "abc"})));
        assert_eq!(statement.params().len(), 2);
        assert!(statement.get("missing").is_none());
    }
}
