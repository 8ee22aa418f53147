//! Purpose: Blocking HTTP executor for the Neo4j transactional Cypher endpoint.
//! Exports: `Neo4jClient`, `DEFAULT_BASE_URL`, `DEFAULT_DATABASE`.
//! Role: `QueryExecutor` implementation that talks JSON to `POST /db/{database}/tx/commit`.
//! Invariants: One statement per request, auto-committed; no retries, no timeouts.
//! Invariants: Base URL is scheme + authority only; credentials travel as URL userinfo (basic auth).
//! Invariants: Store `errors` entries, HTTP failures and transport failures all map to `Execution`.
#![allow(clippy::result_large_err)]

use super::executor::{QueryExecutor, QueryResult, Row};
use crate::core::error::{Error, ErrorKind};
use crate::core::statement::{Params, Statement};
use serde::{Deserialize, Serialize};
use url::Url;

type ApiResult<T> = Result<T, Error>;

pub const DEFAULT_BASE_URL: &str = "http://localhost:7474";
pub const DEFAULT_DATABASE: &str = "neo4j";

#[derive(Clone)]
pub struct Neo4jClient {
    base_url: Url,
    database: String,
    agent: ureq::Agent,
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    statements: [StatementRequest<'a>; 1],
}

#[derive(Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    parameters: &'a Params,
    #[serde(rename = "resultDataContents")]
    result_data_contents: [&'static str; 1],
}

#[derive(Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<StoreError>,
}

#[derive(Deserialize)]
struct StatementResult {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<DataRow>,
}

#[derive(Deserialize)]
struct DataRow {
    row: Row,
}

#[derive(Deserialize)]
struct StoreError {
    code: String,
    #[serde(default)]
    message: Option<String>,
}

impl Neo4jClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = parse_base_url(&base_url.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            base_url,
            database: DEFAULT_DATABASE.to_string(),
            agent,
        })
    }

    pub fn with_database(mut self, database: impl Into<String>) -> ApiResult<Self> {
        let database = database.into();
        if database.is_empty() || database.contains('/') {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("invalid database name `{database}`")));
        }
        self.database = database;
        Ok(self)
    }

    pub fn with_credentials(mut self, user: &str, password: &str) -> ApiResult<Self> {
        let applied = self
            .base_url
            .set_username(user)
            .and_then(|()| self.base_url.set_password(Some(password)));
        if applied.is_err() {
            return Err(
                Error::new(ErrorKind::Usage).with_message("base url cannot carry credentials")
            );
        }
        Ok(self)
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Base URL with any credentials removed, safe to log.
    pub fn display_url(&self) -> String {
        let mut url = self.base_url.clone();
        let _ = url.set_username("");
        let _ = url.set_password(None);
        url.to_string()
    }

    pub fn commit_url(&self) -> ApiResult<Url> {
        let path = format!("db/{}/tx/commit", self.database);
        self.base_url.join(&path).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("cannot build commit url for database `{}`", self.database))
                .with_source(err)
        })
    }

    fn post(&self, url: &Url, statement: &Statement) -> ApiResult<QueryResult> {
        let payload = CommitRequest {
            statements: [StatementRequest {
                statement: statement.text(),
                parameters: statement.params(),
                result_data_contents: ["row"],
            }],
        };
        let payload = serde_json::to_string(&payload).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode request json")
                .with_source(err)
        })?;

        let response = self
            .agent
            .post(url.as_str())
            .set("Accept", "application/json;charset=UTF-8")
            .set("Content-Type", "application/json")
            .send_string(&payload);

        match response {
            Ok(resp) => {
                let body = read_body(resp)?;
                result_from_body(&body)
            }
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(error_from_status(code, &body))
            }
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Execution)
                .with_message("request failed")
                .with_hint("Is the store running and reachable at --url?")
                .with_transient()
                .with_source(err)),
        }
    }
}

impl QueryExecutor for Neo4jClient {
    fn execute(&mut self, statement: &Statement) -> ApiResult<QueryResult> {
        let url = self.commit_url()?;
        tracing::debug!(statement = statement.text(), "executing statement");
        let result = self
            .post(&url, statement)
            .map_err(|err| err.with_statement(statement.text()))?;
        tracing::trace!(rows = result.rows.len(), "statement finished");
        Ok(result)
    }
}

/// Accepts `http(s)://host[:port]` with nothing after the authority.
fn parse_base_url(raw: &str) -> ApiResult<Url> {
    let url = Url::parse(raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid store base url `{raw}`"))
            .with_source(err)
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("unsupported store url scheme `{}`", url.scheme()))
            .with_hint("Neo4j's HTTP endpoint is served over http or https."));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("store base url must stop at host and port")
            .with_hint("Pass e.g. http://localhost:7474 and choose the database with --database."));
    }
    Ok(url)
}

fn read_body(response: ureq::Response) -> ApiResult<String> {
    response.into_string().map_err(|err| {
        Error::new(ErrorKind::Execution)
            .with_message("failed to read response body")
            .with_transient()
            .with_source(err)
    })
}

fn result_from_body(body: &str) -> ApiResult<QueryResult> {
    let response: CommitResponse = serde_json::from_str(body).map_err(|err| {
        Error::new(ErrorKind::Execution)
            .with_message("invalid response json")
            .with_source(err)
    })?;
    if let Some(first) = response.errors.into_iter().next() {
        return Err(error_from_store(first));
    }
    let Some(result) = response.results.into_iter().next() else {
        return Ok(QueryResult::empty());
    };
    Ok(QueryResult {
        columns: result.columns,
        rows: result.data.into_iter().map(|data| data.row).collect(),
    })
}

fn error_from_store(remote: StoreError) -> Error {
    let message = remote
        .message
        .unwrap_or_else(|| "store rejected statement".to_string());
    Error::new(ErrorKind::Execution)
        .with_message(message)
        .with_code(remote.code)
}

fn error_from_status(status: u16, body: &str) -> Error {
    let from_body = serde_json::from_str::<CommitResponse>(body)
        .ok()
        .and_then(|response| response.errors.into_iter().next())
        .map(error_from_store);
    let mut err = from_body.unwrap_or_else(|| {
        Error::new(ErrorKind::Execution).with_message(format!("store returned status {status}"))
    });
    match status {
        401 | 403 => {
            err = err.with_hint("Check --user/--password (or GRAPHFEED_USER/GRAPHFEED_PASSWORD).");
        }
        404 => {
            err = err.with_hint("Check --database; the endpoint was not found.");
        }
        502..=504 => {
            err = err.with_transient();
        }
        _ => {}
    }
    err
}

#[cfg(test)]
mod tests {
    use super::{Neo4jClient, error_from_status, parse_base_url, result_from_body};
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn base_url_with_or_without_slash_is_accepted() {
        for raw in ["http://localhost:7474", "http://localhost:7474/"] {
            let url = parse_base_url(raw).expect("url");
            assert_eq!(url.as_str(), "http://localhost:7474/");
        }
    }

    #[test]
    fn base_url_rejects_paths_queries_and_schemes() {
        for raw in [
            "http://localhost:7474/db/data",
            "http://localhost:7474/?x=1",
            "bolt://localhost:7687",
            "not a url",
        ] {
            let err = parse_base_url(raw).expect_err(raw);
            assert_eq!(err.kind(), ErrorKind::Usage);
        }
    }

    #[test]
    fn commit_url_uses_database_segment() {
        let client = Neo4jClient::new("http://localhost:7474")
            .and_then(|client| client.with_database("feeds"))
            .expect("client");
        assert_eq!(
            client.commit_url().expect("url").as_str(),
            "http://localhost:7474/db/feeds/tx/commit"
        );
    }

    #[test]
    fn credentials_ride_in_userinfo_but_not_in_display() {
        let client = Neo4jClient::new("http://localhost:7474")
            .and_then(|client| client.with_credentials("neo4j", "1234"))
            .expect("client");
        let url = client.commit_url().expect("url");
        assert_eq!(url.username(), "neo4j");
        assert_eq!(url.password(), Some("1234"));
        assert_eq!(client.display_url(), "http://localhost:7474/");
    }

    #[test]
    fn database_names_cannot_escape_the_path() {
        let err = Neo4jClient::new("http://localhost:7474")
            .and_then(|client| client.with_database("a/b"))
            .err()
            .expect("invalid database");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn result_body_maps_rows_in_order() {
        let body = json!({
            "results": [{
                "columns": ["t", "u"],
                "data": [
                    {"row": [{"title": "a"}, {"username": "x"}], "meta": [null, null]},
                    {"row": [{"title": "b"}, {"username": "x"}], "meta": [null, null]}
                ]
            }],
            "errors": []
        })
        .to_string();
        let result = result_from_body(&body).expect("result");
        assert_eq!(result.columns, vec!["t", "u"]);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[1][0], json!({"title": "b"}));
    }

    #[test]
    fn store_errors_become_execution_errors_with_code() {
        let body = json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Statement.SyntaxError", "message": "bad"}]
        })
        .to_string();
        let err = result_from_body(&body).expect_err("store error");
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(err.code(), Some("Neo.ClientError.Statement.SyntaxError"));
        assert_eq!(err.message(), Some("bad"));
        assert!(!err.is_transient());
    }

    #[test]
    fn unauthorized_status_adds_credentials_hint() {
        let body = json!({
            "errors": [{"code": "Neo.ClientError.Security.Unauthorized", "message": "no auth"}]
        })
        .to_string();
        let err = error_from_status(401, &body);
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(err.code(), Some("Neo.ClientError.Security.Unauthorized"));
        assert!(err.hint().unwrap_or_default().contains("--password"));

        let err = error_from_status(503, "<html>unavailable</html>");
        assert_eq!(err.message(), Some("store returned status 503"));
        assert!(err.is_transient());
    }

    #[test]
    fn invalid_json_is_execution_error() {
        let err = result_from_body("not json").expect_err("invalid json");
        assert_eq!(err.kind(), ErrorKind::Execution);
    }
}
