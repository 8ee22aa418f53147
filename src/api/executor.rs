//! Purpose: The query execution contract consumed by the seeder and feed reader.
//! Exports: `QueryExecutor`, `QueryResult`, `Row`.
//! Role: Seam between the engine and whatever store runs the statements.
//! Invariants: One call is one statement; implementations never retry.
//! Invariants: Failures of any kind surface as `ErrorKind::Execution`.
use crate::core::error::Error;
use crate::core::statement::Statement;
use serde_json::Value;

pub type Row = Vec<Value>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub trait QueryExecutor {
    /// Runs one statement and blocks until the store answers.
    fn execute(&mut self, statement: &Statement) -> Result<QueryResult, Error>;
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for &mut E {
    fn execute(&mut self, statement: &Statement) -> Result<QueryResult, Error> {
        (**self).execute(statement)
    }
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for Box<E> {
    fn execute(&mut self, statement: &Statement) -> Result<QueryResult, Error> {
        (**self).execute(statement)
    }
}
