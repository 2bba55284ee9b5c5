//! Mount data types shared between the orchestrator and the helper clients.

use std::fmt;

use serde::Serialize;

use crate::error::{MountError, MountResult};

/// Path-prefix validation context the helper applies to a directory request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathScope {
    /// Paths under the plugin's own tree.
    Plugin,
    /// Paths under the kubelet per-pod mount tree.
    Pod,
}

impl PathScope {
    /// Lowercase name, used in logs and CLI output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PathScope::Plugin => "plugin",
            PathScope::Pod => "pod",
        }
    }
}

impl fmt::Display for PathScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One SMB mount attempt.
///
/// `mount_options[0]` is the username (domain folded in by the caller) and
/// `sensitive_options[0]` the password.
#[derive(Clone, PartialEq, Eq)]
pub struct MountRequest {
    /// Remote share address, e.g. `//server/share`.
    pub source: String,
    /// Local mount point.
    pub target: String,
    /// Plain mount options.
    pub mount_options: Vec<String>,
    /// Options that must never be logged.
    pub sensitive_options: Vec<String>,
}

impl MountRequest {
    /// Create a request.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        mount_options: Vec<String>,
        sensitive_options: Vec<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            mount_options,
            sensitive_options,
        }
    }

    /// Username and password, or `InvalidArgument` if either sequence is empty.
    pub fn credentials(&self) -> MountResult<(&str, &str)> {
        match (self.mount_options.first(), self.sensitive_options.first()) {
            (Some(username), Some(password)) => Ok((username.as_str(), password.as_str())),
            _ => Err(MountError::InvalidArgument {
                message: format!(
                    "empty mountOptions(len: {}) or sensitiveMountOptions(len: {}) is not allowed",
                    self.mount_options.len(),
                    self.sensitive_options.len()
                ),
            }),
        }
    }
}

impl fmt::Debug for MountRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountRequest")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("mount_options", &self.mount_options)
            .field(
                "sensitive_options",
                &format_args!("[{} redacted]", self.sensitive_options.len()),
            )
            .finish()
    }
}

/// Result of a mount point query. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountPoint {
    /// Queried path, as given by the caller.
    pub path: String,
    /// Whether something is mounted there.
    pub is_mount_point: bool,
}

/// Payload of a share-mapping-create request.
#[derive(Clone, PartialEq, Eq)]
pub struct ShareMapping {
    /// Local path the share appears at.
    pub local_path: String,
    /// Remote share address.
    pub remote_path: String,
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl fmt::Debug for ShareMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareMapping")
            .field("local_path", &self.local_path)
            .field("remote_path", &self.remote_path)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
