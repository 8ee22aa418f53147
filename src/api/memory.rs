//! Purpose: In-process store that runs the crate's own Cypher statement set.
//! Exports: `MemoryGraph`.
//! Role: `QueryExecutor` for tests and for `--store memory` runs without a database.
//! Invariants: Only statements from `core::cypher` are understood; anything else is `Execution`.
//! Invariants: Nodes and edges keep insertion order; User listings sort by `seq` (missing last, stable).
//! Invariants: KNOWS uses MERGE semantics: at most one edge per ordered pair.
#![allow(clippy::result_large_err)]

use super::executor::{QueryExecutor, QueryResult};
use crate::core::cypher;
use crate::core::error::{Error, ErrorKind};
use crate::core::statement::Statement;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const USER: &str = "User";
const THING: &str = "Thing";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum EdgeKind {
    Has,
    Knows,
}

#[derive(Clone, Debug)]
struct Node {
    label: &'static str,
    props: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Edge {
    kind: EdgeKind,
    from: usize,
    to: usize,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    indexes: BTreeSet<(String, String)>,
    executed: usize,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.live(USER).count()
    }

    pub fn thing_count(&self) -> usize {
        self.live(THING).count()
    }

    /// Usernames in listing order (by `seq`).
    pub fn usernames(&self) -> Vec<String> {
        self.users_in_order()
            .into_iter()
            .map(|id| self.text_prop(id, "username"))
            .collect()
    }

    /// `(username, title)` for every HAS edge, in creation order.
    pub fn has_edges(&self) -> Vec<(String, String)> {
        self.edges_of(EdgeKind::Has, "username", "title")
    }

    /// `(from, to)` usernames for every KNOWS edge, in creation order.
    pub fn knows_edges(&self) -> Vec<(String, String)> {
        self.edges_of(EdgeKind::Knows, "username", "username")
    }

    pub fn indexes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.indexes
            .iter()
            .map(|(label, property)| (label.as_str(), property.as_str()))
    }

    pub fn statements_executed(&self) -> usize {
        self.executed
    }

    fn live(&self, label: &'static str) -> impl Iterator<Item = (usize, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.label == label)
    }

    fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn text_prop(&self, id: usize, key: &str) -> String {
        self.node(id)
            .and_then(|node| node.props.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn edges_of(&self, kind: EdgeKind, from_key: &str, to_key: &str) -> Vec<(String, String)> {
        self.edges
            .iter()
            .filter(|edge| edge.kind == kind)
            .map(|edge| (self.text_prop(edge.from, from_key), self.text_prop(edge.to, to_key)))
            .collect()
    }

    fn users_in_order(&self) -> Vec<usize> {
        let mut users: Vec<(usize, Option<u64>)> = self
            .live(USER)
            .map(|(id, node)| (id, node.props.get("seq").and_then(Value::as_u64)))
            .collect();
        users.sort_by_key(|(_, seq)| (seq.is_none(), seq.unwrap_or(0)));
        users.into_iter().map(|(id, _)| id).collect()
    }

    fn insert(&mut self, label: &'static str, props: Map<String, Value>) -> usize {
        self.nodes.push(Node { label, props });
        self.nodes.len() - 1
    }

    fn wipe(&mut self) -> QueryResult {
        self.nodes.clear();
        self.edges.clear();
        QueryResult::empty()
    }

    fn create_user(&mut self, statement: &Statement) -> Result<QueryResult, Error> {
        let props = object_param(statement, "props")?;
        self.insert(USER, props);
        Ok(QueryResult::empty())
    }

    fn create_thing(&mut self, statement: &Statement) -> Result<QueryResult, Error> {
        let username = text_param(statement, "username")?;
        let props = object_param(statement, "props")?;
        let owners: Vec<usize> = self
            .live(USER)
            .filter(|(_, node)| node.props.get("username").and_then(Value::as_str) == Some(username))
            .map(|(id, _)| id)
            .collect();
        for owner in owners {
            let thing = self.insert(THING, props.clone());
            self.edges.push(Edge {
                kind: EdgeKind::Has,
                from: owner,
                to: thing,
            });
        }
        Ok(QueryResult::empty())
    }

    fn merge_knows(&mut self, statement: &Statement) -> Result<QueryResult, Error> {
        let skip1 = index_param(statement, "skip1")?;
        let skip2 = index_param(statement, "skip2")?;
        let users = self.users_in_order();
        let (Some(&from), Some(&to)) = (users.get(skip1), users.get(skip2)) else {
            return Ok(QueryResult::empty());
        };
        let edge = Edge {
            kind: EdgeKind::Knows,
            from,
            to,
        };
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
        Ok(QueryResult::empty())
    }

    fn feed_page(&self, statement: &Statement) -> Result<QueryResult, Error> {
        let skip = index_param(statement, "skip")?;
        let mut result = QueryResult {
            columns: vec!["t".to_string(), "u".to_string()],
            rows: Vec::new(),
        };
        let Some(&user) = self.users_in_order().get(skip) else {
            return Ok(result);
        };
        let Some(user_node) = self.node(user) else {
            return Ok(result);
        };
        for edge in &self.edges {
            if edge.kind != EdgeKind::Has || edge.from != user {
                continue;
            }
            if let Some(thing) = self.node(edge.to) {
                result.rows.push(vec![
                    Value::Object(thing.props.clone()),
                    Value::Object(user_node.props.clone()),
                ]);
            }
        }
        Ok(result)
    }
}

impl QueryExecutor for MemoryGraph {
    fn execute(&mut self, statement: &Statement) -> Result<QueryResult, Error> {
        self.executed += 1;
        let text = statement.text();
        let result = match text {
            cypher::WIPE => Ok(self.wipe()),
            cypher::CREATE_USER => self.create_user(statement),
            cypher::CREATE_THING => self.create_thing(statement),
            cypher::MERGE_KNOWS => self.merge_knows(statement),
            cypher::FEED_PAGE => self.feed_page(statement),
            other => match cypher::parse_create_index(other) {
                Some((label, property)) => {
                    self.indexes.insert((label.to_string(), property.to_string()));
                    Ok(QueryResult::empty())
                }
                None => Err(Error::new(ErrorKind::Execution)
                    .with_message("statement not supported by the memory store")),
            },
        };
        result.map_err(|err| err.with_statement(text))
    }
}

fn param<'a>(statement: &'a Statement, name: &str) -> Result<&'a Value, Error> {
    statement.get(name).ok_or_else(|| {
        Error::new(ErrorKind::Execution)
            .with_message(format!("expected parameter missing: ${name}"))
    })
}

fn mistyped(name: &str, expected: &str) -> Error {
    Error::new(ErrorKind::Execution)
        .with_message(format!("parameter ${name} must be {expected}"))
}

fn object_param(statement: &Statement, name: &str) -> Result<Map<String, Value>, Error> {
    param(statement, name)?
        .as_object()
        .cloned()
        .ok_or_else(|| mistyped(name, "a map"))
}

fn text_param<'a>(statement: &'a Statement, name: &str) -> Result<&'a str, Error> {
    param(statement, name)?
        .as_str()
        .ok_or_else(|| mistyped(name, "a string"))
}

fn index_param(statement: &Statement, name: &str) -> Result<usize, Error> {
    param(statement, name)?
        .as_u64()
        .and_then(|value| usize::try_from(value).ok())
        .ok_or_else(|| mistyped(name, "a non-negative integer"))
}

#[cfg(test)]
mod tests {
    use super::{EdgeKind, MemoryGraph};
    use crate::api::executor::QueryExecutor;
    use crate::core::cypher;
    use crate::core::error::ErrorKind;
    use crate::core::statement::Statement;
    use serde_json::json;

    fn run(graph: &mut MemoryGraph, statement: Statement) {
        graph.execute(&statement).expect("statement");
    }

    #[test]
    fn things_attach_to_every_matching_user_once() {
        let mut graph = MemoryGraph::new();
        run(&mut graph, cypher::create_user("alice", 0));
        run(&mut graph, cypher::create_user("bob", 1));
        run(&mut graph, cypher::create_thing("alice", "first"));
        run(&mut graph, cypher::create_thing("alice", "second"));
        run(&mut graph, cypher::create_thing("nobody", "orphan"));

        assert_eq!(graph.thing_count(), 2);
        assert_eq!(
            graph.has_edges(),
            vec![
                ("alice".to_string(), "first".to_string()),
                ("alice".to_string(), "second".to_string())
            ]
        );
        for (thing, _) in graph.live("Thing") {
            let incoming = graph
                .edges
                .iter()
                .filter(|edge| edge.kind == EdgeKind::Has && edge.to == thing)
                .count();
            assert_eq!(incoming, 1);
        }
    }

    #[test]
    fn knows_merge_is_idempotent_and_positional() {
        let mut graph = MemoryGraph::new();
        run(&mut graph, cypher::create_user("late", 1));
        run(&mut graph, cypher::create_user("early", 0));
        run(&mut graph, cypher::merge_knows(0, 1));
        run(&mut graph, cypher::merge_knows(0, 1));
        run(&mut graph, cypher::merge_knows(1, 1));
        run(&mut graph, cypher::merge_knows(5, 0));

        assert_eq!(graph.usernames(), vec!["early", "late"]);
        assert_eq!(
            graph.knows_edges(),
            vec![
                ("early".to_string(), "late".to_string()),
                ("late".to_string(), "late".to_string())
            ]
        );
    }

    #[test]
    fn feed_page_returns_thing_then_user_cells() {
        let mut graph = MemoryGraph::new();
        run(&mut graph, cypher::create_user("alice", 0));
        run(&mut graph, cypher::create_thing("alice", "first"));

        let result = graph.execute(&cypher::feed_page(0)).expect("page");
        assert_eq!(result.columns, vec!["t", "u"]);
        assert_eq!(
            result.rows,
            vec![vec![json!({"title": "first"}), json!({"username": "alice", "seq": 0})]]
        );
        assert!(graph.execute(&cypher::feed_page(1)).expect("page").is_empty());
    }

    #[test]
    fn wipe_keeps_indexes_and_clears_data() {
        let mut graph = MemoryGraph::new();
        run(&mut graph, cypher::create_index("User", "username").expect("index"));
        run(&mut graph, cypher::create_index("User", "username").expect("index"));
        run(&mut graph, cypher::create_user("alice", 0));
        run(&mut graph, cypher::wipe());

        assert_eq!(graph.user_count(), 0);
        assert_eq!(graph.indexes().collect::<Vec<_>>(), vec![("User", "username")]);
        assert_eq!(graph.statements_executed(), 4);
    }

    #[test]
    fn unknown_statements_and_bad_params_are_execution_errors() {
        let mut graph = MemoryGraph::new();
        let err = graph
            .execute(&Statement::new("MATCH (n) RETURN n"))
            .expect_err("unsupported");
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(err.statement(), Some("MATCH (n) RETURN n"));

        let err = graph
            .execute(&Statement::new(cypher::FEED_PAGE).param("skip", -1))
            .expect_err("negative skip");
        assert_eq!(err.kind(), ErrorKind::Execution);

        let err = graph
            .execute(&Statement::new(cypher::CREATE_USER))
            .expect_err("missing props");
        assert_eq!(err.message(), Some("expected parameter missing: $props"));
    }
}
