//! Purpose: The fixed Cypher statement set issued by the seeder and feed reader.
//! Exports: statement constants and builders for each operation.
//! Role: Single home for query text so executors can recognize statements by identity.
//! Invariants: Users are listed by their `seq` property for positional selection.
//! Invariants: Label and property names are validated before being spliced into text.
use crate::core::error::{Error, ErrorKind};
use crate::core::statement::Statement;
use serde_json::json;

pub const WIPE: &str = "MATCH (n) DETACH DELETE n";

pub const CREATE_USER: &str = "CREATE (n:User $props)";

pub const CREATE_THING: &str = "MATCH (n:User) WHERE n.username = $username \
CREATE (n)-[:HAS]->(t:Thing $props)";

pub const MERGE_KNOWS: &str = "MATCH (u:User) WITH u AS u1 ORDER BY u1.seq SKIP $skip1 LIMIT 1 \
MATCH (u:User) WITH u1, u AS u2 ORDER BY u2.seq SKIP $skip2 LIMIT 1 \
MERGE (u1)-[:KNOWS]->(u2)";

pub const FEED_PAGE: &str = "MATCH (u:User) WITH u ORDER BY u.seq SKIP $skip LIMIT 1 \
MATCH (u)-[:HAS]->(t:Thing) RETURN t, u";

pub const CREATE_INDEX_PREFIX: &str = "CREATE INDEX IF NOT EXISTS FOR ";

pub fn wipe() -> Statement {
    Statement::new(WIPE)
}

pub fn create_index(label: &str, property: &str) -> Result<Statement, Error> {
    ensure_identifier(label, "label")?;
    ensure_identifier(property, "property")?;
    Ok(Statement::new(format!(
        "{CREATE_INDEX_PREFIX}(n:{label}) ON (n.{property})"
    )))
}

pub fn create_user(username: &str, seq: u64) -> Statement {
    Statement::new(CREATE_USER).param("props", json!({"username": username, "seq": seq}))
}

pub fn create_thing(username: &str, title: &str) -> Statement {
    Statement::new(CREATE_THING)
        .param("username", username)
        .param("props", json!({"title": title}))
}

pub fn merge_knows(skip1: usize, skip2: usize) -> Statement {
    Statement::new(MERGE_KNOWS)
        .param("skip1", skip1)
        .param("skip2", skip2)
}

pub fn feed_page(skip: usize) -> Statement {
    Statement::new(FEED_PAGE).param("skip", skip)
}

/// Parses `(n:Label) ON (n.property)` back out of an index statement.
pub fn parse_create_index(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(CREATE_INDEX_PREFIX)?;
    let rest = rest.strip_prefix("(n:")?;
    let (label, rest) = rest.split_once(") ON (n.")?;
    let property = rest.strip_suffix(')')?;
    Some((label, property))
}

fn ensure_identifier(value: &str, what: &str) -> Result<(), Error> {
    let mut chars = value.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    };
    if !valid {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("invalid index {what} `{value}`"))
            .with_hint("Use ASCII letters, digits and underscores, starting with a letter."));
    }
    Ok(())
}
