//! Error types and result definitions for the load pipeline.
//!
//! [`EtlError`] carries a classification ([`ErrorKind`]), a static description, optional
//! dynamic detail, an optional source error and the callsite it was raised from. Several
//! errors can be aggregated into one, which the pipeline uses when both a phase and the
//! destination shutdown fail.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use bigdecimal::ParseBigDecimalError;

/// Convenient result type for pipeline operations using [`EtlError`] as the error type.
pub type EtlResult<T> = Result<T, EtlError>;

/// Detailed payload stored for single [`EtlError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type of the pipeline.
#[derive(Debug, Clone)]
pub struct EtlError {
    repr: ErrorRepr,
}

/// Internal representation of error data.
#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Single error payload holding rich metadata.
    Single(ErrorPayload),
    /// Multiple aggregated errors.
    Many {
        errors: Vec<EtlError>,
        location: &'static Location<'static>,
    },
}

/// Categories of errors raised while extracting, canonicalizing and loading.
///
/// The projector relies on [`ErrorKind::DestinationConnectionFailed`] to tell a failure of
/// the whole store connection apart from the rejection of a single row.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Source Errors
    SourceIoError,

    // Data & Transformation Errors
    ConversionError,
    InvalidData,
    SerializationError,
    DeserializationError,

    // Destination Errors
    DestinationConnectionFailed,
    DestinationQueryFailed,
    DestinationSchemaError,
    DestinationTableMissing,

    // Configuration Errors
    ConfigError,

    // IO Errors
    IoError,

    // State Errors
    InvalidState,

    // Unknown / Uncategorized
    Unknown,
}

impl EtlError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For aggregated errors, returns the kind of the first error or [`ErrorKind::Unknown`]
    /// if the aggregate is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error, flattening aggregates.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => errors
                .iter()
                .flat_map(|err| err.kinds())
                .collect::<Vec<_>>(),
        }
    }

    /// Returns the static description, or `None` for aggregated errors.
    pub fn description(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.description.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the detailed error information if available.
    ///
    /// For aggregated errors, returns the detail of the first error that has one.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the aggregated errors, or `None` for a single error.
    pub fn errors(&self) -> Option<&[EtlError]> {
        match self.repr {
            ErrorRepr::Single(_) => None,
            ErrorRepr::Many { ref errors, .. } => Some(errors),
        }
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating [`error::Error`] to this error and returns it.
    ///
    /// Has no effect on aggregated errors, which forward their first error as source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }

        self
    }

    /// Creates an [`EtlError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        EtlError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }

    /// Creates an [`EtlError`] that wraps `source`, using its rendering as detail.
    #[track_caller]
    fn from_source<E>(kind: ErrorKind, description: &'static str, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        let detail = source.to_string();
        EtlError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(source)),
        )
    }
}

impl PartialEq for EtlError {
    fn eq(&self, other: &EtlError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (
                ErrorRepr::Many {
                    errors: errors_a, ..
                },
                ErrorRepr::Many {
                    errors: errors_b, ..
                },
            ) => {
                errors_a.len() == errors_b.len()
                    && errors_a.iter().zip(errors_b.iter()).all(|(a, b)| a == b)
            }
            _ => false,
        }
    }
}

impl fmt::Display for EtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                write_detail(payload.detail.as_deref(), f, 1)?;
                write_backtrace(payload.backtrace.as_ref(), f, 1)?;

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = format!("{error}");
                    let mut lines = rendered.lines();
                    if let Some(first_line) = lines.next() {
                        write!(f, "\n  {}. {}", index + 1, first_line)?;
                    }

                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for EtlError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Writes the captured backtrace with indentation.
fn write_backtrace(
    backtrace: &Backtrace,
    f: &mut fmt::Formatter<'_>,
    indent: usize,
) -> fmt::Result {
    let rendered_backtrace = format!("{backtrace}");
    if rendered_backtrace.trim().is_empty() {
        return Ok(());
    }

    let indent_str = "  ".repeat(indent);
    write!(f, "\n{indent_str}Backtrace:")?;
    for line in rendered_backtrace.lines() {
        write!(f, "\n{indent_str}  {line}")?;
    }

    Ok(())
}

/// Writes the detail block with indentation.
fn write_detail(detail: Option<&str>, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    let Some(detail) = detail else {
        return Ok(());
    };

    let indent_str = "  ".repeat(indent);
    if detail.trim().is_empty() {
        return write!(f, "\n{indent_str}Detail: <empty>");
    }

    write!(f, "\n{indent_str}Detail:")?;
    for line in detail.lines() {
        write!(f, "\n{indent_str}  {line}")?;
    }

    Ok(())
}

/// Creates an [`EtlError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for EtlError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> EtlError {
        EtlError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates an [`EtlError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for EtlError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> EtlError {
        EtlError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Aggregates a vector of errors.
///
/// A vector holding exactly one error yields that error unchanged.
impl<E> From<Vec<E>> for EtlError
where
    E: Into<EtlError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> EtlError {
        let location = Location::caller();

        let mut errors: Vec<EtlError> = errors.into_iter().map(Into::into).collect();
        if errors.len() == 1 {
            if let Some(error) = errors.pop() {
                return error;
            }
        }

        EtlError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

/// Converts [`std::io::Error`] to [`EtlError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for EtlError {
    #[track_caller]
    fn from(err: std::io::Error) -> EtlError {
        EtlError::from_source(ErrorKind::IoError, "I/O operation failed", err)
    }
}

/// Converts [`csv::Error`] to [`EtlError`], classifying by the failing stage.
impl From<csv::Error> for EtlError {
    #[track_caller]
    fn from(err: csv::Error) -> EtlError {
        let (kind, description) = match err.kind() {
            csv::ErrorKind::Io(_) => (ErrorKind::IoError, "CSV I/O operation failed"),
            csv::ErrorKind::Serialize(_) => {
                (ErrorKind::SerializationError, "CSV serialization failed")
            }
            csv::ErrorKind::Deserialize { .. } => {
                (ErrorKind::DeserializationError, "CSV deserialization failed")
            }
            _ => (ErrorKind::InvalidData, "CSV parsing failed"),
        };

        EtlError::from_source(kind, description, err)
    }
}

/// Converts [`std::num::ParseIntError`] to [`EtlError`] with [`ErrorKind::ConversionError`].
impl From<std::num::ParseIntError> for EtlError {
    #[track_caller]
    fn from(err: std::num::ParseIntError) -> EtlError {
        EtlError::from_source(ErrorKind::ConversionError, "Integer parsing failed", err)
    }
}

/// Converts [`ParseBigDecimalError`] to [`EtlError`] with [`ErrorKind::ConversionError`].
impl From<ParseBigDecimalError> for EtlError {
    #[track_caller]
    fn from(err: ParseBigDecimalError) -> EtlError {
        EtlError::from_source(ErrorKind::ConversionError, "Decimal parsing failed", err)
    }
}

/// Converts [`scylla::transport::errors::NewSessionError`] to [`EtlError`].
///
/// Failing to open a session always means the cluster is unreachable or refused us.
#[cfg(feature = "cassandra")]
impl From<scylla::transport::errors::NewSessionError> for EtlError {
    #[track_caller]
    fn from(err: scylla::transport::errors::NewSessionError) -> EtlError {
        EtlError::from_source(
            ErrorKind::DestinationConnectionFailed,
            "Cassandra session could not be established",
            err,
        )
    }
}

/// Converts [`scylla::transport::errors::QueryError`] to [`EtlError`].
///
/// Rejections of a single statement map to [`ErrorKind::DestinationQueryFailed`] while
/// anything that means the cluster can no longer be reached maps to
/// [`ErrorKind::DestinationConnectionFailed`].
#[cfg(feature = "cassandra")]
impl From<scylla::transport::errors::QueryError> for EtlError {
    #[track_caller]
    fn from(err: scylla::transport::errors::QueryError) -> EtlError {
        let (kind, description) = classify_query_error(&err);

        EtlError::from_source(kind, description, err)
    }
}

#[cfg(feature = "cassandra")]
fn classify_query_error(
    err: &scylla::transport::errors::QueryError,
) -> (ErrorKind, &'static str) {
    use scylla::transport::errors::{DbError, QueryError};

    match err {
        QueryError::DbError(DbError::Unavailable { .. } | DbError::IsBootstrapping, _) => (
            ErrorKind::DestinationConnectionFailed,
            "Cassandra cluster is unavailable",
        ),
        QueryError::DbError(
            DbError::SyntaxError | DbError::Invalid | DbError::AlreadyExists { .. },
            _,
        ) => (
            ErrorKind::DestinationSchemaError,
            "Cassandra rejected the statement definition",
        ),
        QueryError::DbError(_, _) => (
            ErrorKind::DestinationQueryFailed,
            "Cassandra rejected the statement",
        ),
        QueryError::BadQuery(_) => (
            ErrorKind::ConversionError,
            "Cassandra statement values could not be serialized",
        ),
        QueryError::BrokenConnection(_) | QueryError::UnableToAllocStreamId => (
            ErrorKind::DestinationConnectionFailed,
            "Cassandra connection failed",
        ),
        QueryError::TimeoutError | QueryError::RequestTimeout(_) => (
            ErrorKind::DestinationQueryFailed,
            "Cassandra request timed out",
        ),
        // Protocol, parse and serialization failures concern a single request.
        _ => (
            ErrorKind::DestinationQueryFailed,
            "Cassandra request failed",
        ),
    }
}
