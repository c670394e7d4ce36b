//! Reporter error types.

use thiserror::Error;

/// Errors raised while building or driving a push reporter.
///
/// None of these cross the lifecycle boundary; the lifecycle logs them and
/// degrades to an inactive state.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("invalid graphite host: {0:?}")]
    InvalidHost(String),

    #[error("invalid graphite port: {0}")]
    InvalidPort(u16),

    #[error("reporting period must be positive")]
    InvalidPeriod,

    #[error("reporter already started")]
    AlreadyStarted,

    #[error("reporter was stopped and cannot be restarted")]
    Terminated,

    #[error("no tokio runtime available to schedule reports")]
    NoRuntime,

    #[error("timed out connecting to {0}")]
    ConnectTimeout(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReporterResult<T> = Result<T, ReporterError>;
