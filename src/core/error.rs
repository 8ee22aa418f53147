//! Purpose: Error model shared by the executors, seeder, feed reader and CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: One error type for every fallible operation; context is attached builder-style.
//! Invariants: `Execution` covers anything the store rejected or never answered.
//! Invariants: `Decode` covers rows whose cells do not match the expected record shape.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    Execution,
    Decode,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    statement: Option<String>,
    page: Option<usize>,
    code: Option<String>,
    transient: bool,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            statement: None,
            page: None,
            code: None,
            transient: false,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn statement(&self) -> Option<&str> {
        self.statement.as_deref()
    }

    pub fn page(&self) -> Option<usize> {
        self.page
    }

    /// Store-assigned status code, e.g. `Neo.ClientError.Statement.SyntaxError`.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// True when the store classified the failure as transient or the request
    /// never reached it. Nothing in this crate retries; callers may.
    pub fn is_transient(&self) -> bool {
        self.transient
            || self
                .code
                .as_deref()
                .is_some_and(|code| code.starts_with("Neo.TransientError."))
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = Some(statement.into());
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(code) = &self.code {
            write!(f, " (code: {code})")?;
        }
        if let Some(page) = self.page {
            write!(f, " (page: {page})")?;
        }
        if let Some(statement) = &self.statement {
            write!(f, " (statement: {})", statement.split_whitespace().collect::<Vec<_>>().join(" "))?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Execution => 3,
        ErrorKind::Decode => 4,
        ErrorKind::Io => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::Execution, 3),
            (ErrorKind::Decode, 4),
            (ErrorKind::Io, 5),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_context_on_one_line() {
        let err = Error::new(ErrorKind::Execution)
            .with_message("store rejected statement")
            .with_code("Neo.ClientError.Statement.SyntaxError")
            .with_page(3)
            .with_statement("MATCH (n)\n  RETURN n");
        assert_eq!(
            err.to_string(),
            "Execution: store rejected statement \
             (code: Neo.ClientError.Statement.SyntaxError) (page: 3) (statement: MATCH (n) RETURN n)"
        );
    }

    #[test]
    fn transient_follows_store_code_or_flag() {
        let deadlock = Error::new(ErrorKind::Execution)
            .with_code("Neo.TransientError.Transaction.DeadlockDetected");
        assert!(deadlock.is_transient());

        let syntax =
            Error::new(ErrorKind::Execution).with_code("Neo.ClientError.Statement.SyntaxError");
        assert!(!syntax.is_transient());

        assert!(Error::new(ErrorKind::Execution).with_transient().is_transient());
    }

    #[test]
    fn source_chain_is_preserved() {
        use std::error::Error as _;
        let io = std::io::Error::other("broken pipe");
        let err = Error::new(ErrorKind::Io).with_source(io);
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("broken pipe"));
    }
}
