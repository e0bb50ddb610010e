use crate::types;
use error_stack::{Context, Report};
use thiserror::Error as ThisError;
use tracing_error::SpanTrace;

mod impls;

pub type Result<T> = std::result::Result<T, Error>;

pub struct Error {
    error_type: types::Error,
    report: Report<Box<dyn Context>>,
    trace: SpanTrace,
}

impl Error {
    #[must_use]
    pub fn from_context(error_type: types::Error, context: impl Context) -> Self {
        Self {
            error_type,
            report: to_any_report(context),
            trace: SpanTrace::capture(),
        }
    }

    #[must_use]
    pub fn from_report(error_type: types::Error, report: Report<impl Context>) -> Self {
        Self {
            error_type,
            report: cast_to_any_report(report),
            trace: SpanTrace::capture(),
        }
    }
}

impl Error {
    #[must_use]
    pub fn as_type(&self) -> &types::Error {
        &self.error_type
    }
}

impl Error {
    #[must_use]
    pub fn not_found() -> Self {
        #[derive(Debug, ThisError)]
        #[error("Requested entity does not exist")]
        struct NotFound;
        Self::from_context(types::Error::NotFound, NotFound)
    }

    #[must_use]
    pub fn forbidden() -> Self {
        #[derive(Debug, ThisError)]
        #[error("Actor is not the author of the entity")]
        struct OwnershipViolation;
        Self::from_context(types::Error::Forbidden, OwnershipViolation)
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        #[derive(Debug, ThisError)]
        #[error("Attempt to access user-only route")]
        struct Unauthorized;
        Self::from_context(types::Error::Unauthorized, Unauthorized)
    }

    #[must_use]
    pub fn version_conflict() -> Self {
        #[derive(Debug, ThisError)]
        #[error("Expected version does not match the stored record")]
        struct VersionConflict;
        Self::from_context(types::Error::VersionConflict, VersionConflict)
    }

    #[must_use]
    pub fn internal(context: impl Context) -> Self {
        Self::from_context(types::Error::Internal, context)
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("type", &self.error_type)
            .field("report", &self.report)
            .field("trace", &self.trace)
            .finish()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ", &self.error_type)?;
        writeln!(f, "{:?}", self.report)?;
        std::fmt::Display::fmt(&self.trace, f)
    }
}

fn cast_to_any_report(report: Report<impl Context>) -> Report<Box<dyn Context>> {
    unsafe { std::mem::transmute::<_, Report<Box<dyn Context>>>(report) }
}

fn to_any_report(context: impl Context) -> Report<Box<dyn Context>> {
    unsafe { std::mem::transmute::<_, Report<Box<dyn Context>>>(Report::new(context)) }
}
