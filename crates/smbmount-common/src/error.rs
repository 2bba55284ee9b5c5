//! Common error types for smbmount.

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`MountError`].
pub type MountResult<T> = Result<T, MountError>;

/// Errors surfaced by the mount orchestration layer.
///
/// Nothing in this layer retries or rolls back. Wrapping variants keep the
/// underlying failure as their source so the caller sees the full chain.
#[derive(Error, Diagnostic, Debug)]
pub enum MountError {
    /// Malformed or missing mount input.
    #[error("Invalid argument: {message}")]
    #[diagnostic(
        code(smbmount::invalid_argument),
        help("The first mount option must carry the username and the first sensitive option the password")
    )]
    InvalidArgument {
        /// What was wrong with the input.
        message: String,
    },

    /// The existence check of a prerequisite path failed.
    #[error("Existence check of {path} failed")]
    #[diagnostic(code(smbmount::mount::precheck_failed))]
    PrecheckFailed {
        /// The path that was checked.
        path: String,
        /// Underlying failure.
        #[source]
        source: Box<MountError>,
    },

    /// Creating a missing prerequisite directory failed.
    #[error("Creation of parent directory {path} failed")]
    #[diagnostic(code(smbmount::mount::prerequisite_failed))]
    PrerequisiteCreationFailed {
        /// The directory that could not be created.
        path: String,
        /// Underlying failure.
        #[source]
        source: Box<MountError>,
    },

    /// The share mapping could not be created.
    #[error("SMB mapping of {remote} at {target} failed")]
    #[diagnostic(code(smbmount::mount::failed))]
    MountFailed {
        /// Remote share address.
        remote: String,
        /// Local mount point.
        target: String,
        /// Underlying failure.
        #[source]
        source: Box<MountError>,
    },

    /// Path does not exist.
    #[error("Path not found: {path}")]
    #[diagnostic(code(smbmount::not_found))]
    NotFound {
        /// The missing path.
        path: String,
    },

    /// Operation is not supported by this mounter.
    #[error("{operation} not implemented for this mounter")]
    #[diagnostic(code(smbmount::not_implemented))]
    NotImplemented {
        /// Name of the unsupported operation.
        operation: String,
    },

    /// The control channel to the helper service is unusable.
    #[error("Helper transport error: {message}")]
    #[diagnostic(
        code(smbmount::transport),
        help("Check that the privileged helper service is running and its endpoint is reachable")
    )]
    Transport {
        /// Transport failure description.
        message: String,
    },

    /// The helper service rejected a request.
    #[error("Helper rejected {operation} ({code}): {message}")]
    #[diagnostic(code(smbmount::remote))]
    Remote {
        /// RPC that was rejected.
        operation: String,
        /// Status code reported by the helper.
        code: String,
        /// Status message reported by the helper.
        message: String,
    },

    /// The call context deadline expired.
    #[error("{operation} did not complete within {timeout:?}")]
    #[diagnostic(code(smbmount::deadline_exceeded))]
    DeadlineExceeded {
        /// Operation that timed out.
        operation: String,
        /// The deadline that applied.
        timeout: Duration,
    },

    /// The call context was cancelled.
    #[error("{operation} was cancelled")]
    #[diagnostic(code(smbmount::cancelled))]
    Cancelled {
        /// Operation that was cancelled.
        operation: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(smbmount::config))]
    Config {
        /// The error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(smbmount::io))]
    Io(#[from] std::io::Error),
}

impl MountError {
    /// Shorthand for [`MountError::NotImplemented`].
    pub fn not_implemented(operation: impl Into<String>) -> Self {
        Self::NotImplemented {
            operation: operation.into(),
        }
    }

    /// Shorthand for [`MountError::Transport`].
    pub fn transport(message: impl ToString) -> Self {
        Self::Transport {
            message: message.to_string(),
        }
    }

    /// Whether this error means the queried path does not exist.
    ///
    /// Wrapped causes are inspected too, so a `NotFound` raised deep in a
    /// backend is still recognized after the orchestrator adds context.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            Self::PrecheckFailed { source, .. }
            | Self::PrerequisiteCreationFailed { source, .. }
            | Self::MountFailed { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Whether the caller's reconciliation loop may retry the call unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidArgument { .. } | Self::NotImplemented { .. } | Self::Config { .. }
        )
    }
}
