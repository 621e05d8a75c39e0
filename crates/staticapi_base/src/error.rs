use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # Why a custom error type and not use anyhow/eyre/thiserror etc?

- Better control over error handling
- Span traces are captured at the point of failure via tracing-error
- More transparency into error handling logic
 */

/// Error variants that can occur in staticapi operations.
/// Each variant represents a specific error category with its associated context.
#[derive(Debug)]
pub enum ErrorKind {
    /// File system operation failed
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file was read but its contents are not valid JSON
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Two data files map to the same route path
    DuplicateRoute {
        route: String,
        first: String,
        second: String,
    },

    /// Catch-all for other errors with a message
    Message { message: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::InvalidJson { path, source } => {
                write!(f, "Invalid JSON in {}: {}", path.display(), source)
            }
            ErrorKind::DuplicateRoute {
                route,
                first,
                second,
            } => {
                write!(
                    f,
                    "Duplicate route '{}' derived from both '{}' and '{}'",
                    route, first, second
                )
            }
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }
}

/* 📖 # Why separate ErrorKind and StaticApiError?
ErrorKind carries the structural variants (file paths, route paths) that callers
pattern match on. StaticApiError wraps it with the runtime context stack, an
optional cause and the span trace captured when the error was created.
*/

/// Error type wrapping ErrorKind with context, cause and span trace.
pub struct StaticApiError {
    kind: ErrorKind,
    context: Vec<String>,
    cause: Option<Box<StaticApiError>>,
    span_trace: SpanTrace,
}

impl StaticApiError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            cause: None,
            span_trace: SpanTrace::capture(),
        }
    }

    /// Creates a message error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Attaches context to an error.
    /// Context is displayed before the error message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Records the error that led to this one.
    pub fn caused_by(mut self, cause: StaticApiError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the attached context entries, oldest first.
    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    /// Returns the error this one was caused by, if any.
    pub fn cause(&self) -> Option<&StaticApiError> {
        self.cause.as_deref()
    }

    /// Returns the span trace captured at construction.
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// Returns true if this error stems from a file that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            &self.kind,
            ErrorKind::FileError { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Returns the innermost error in the chain.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        let child_count = self.context.len() + usize::from(self.cause.is_some());
        for (i, ctx) in self.context.iter().enumerate() {
            let connector = if i + 1 == child_count { "└─" } else { "├─" };
            writeln!(f, "{}{} {}", indent, connector, ctx)?;
        }
        if let Some(cause) = &self.cause {
            writeln!(f, "{}└─ cause: {}", indent, cause.kind)?;
            cause.fmt_tree(f, &format!("{}   ", indent))?;
        }
        Ok(())
    }
}

impl From<ErrorKind> for StaticApiError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl StdError for StaticApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::FileError { source, .. } => Some(source),
            ErrorKind::InvalidJson { source, .. } => Some(source),
            ErrorKind::DuplicateRoute { .. } | ErrorKind::Message { .. } => self
                .cause
                .as_deref()
                .map(|cause| cause as &(dyn StdError + 'static)),
        }
    }
}

impl fmt::Display for StaticApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{}: ", ctx)?;
        }
        write!(f, "{}", self.kind)
    }
}

impl fmt::Debug for StaticApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;
        self.fmt_tree(f, "")?;
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            writeln!(f, "Trace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

/* 📖 # Why use Box<StaticApiError> in the result type?

Boxing the error reduces the size of the result type, making it more efficient to return in the common case.

*/

/// Standard result type for staticapi operations.
pub type StaticApiResult<T> = std::result::Result<T, Box<StaticApiError>>;

/// Extension trait for attaching context to Results.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> StaticApiResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> StaticApiResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for StaticApiResult<T> {
    fn context(self, context: impl Into<String>) -> StaticApiResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> StaticApiResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

/// Create a boxed message error from format arguments.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        ::std::boxed::Box::new($crate::error::StaticApiError::message(format!($($arg)*)))
    };
}

/// Return early with a boxed message error.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::err!($($arg)*))
    };
}
