//! Mounter configuration.

use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::context::CallContext;
use crate::error::{MountError, MountResult};
use crate::paths::{DEFAULT_DRIVE, PathNormalizer};

/// Domain suffix marking hostnames only resolvable inside the cluster.
pub static INTERNAL_DOMAIN_SUFFIX: Lazy<String> = Lazy::new(|| {
    std::env::var("SMBMOUNT_INTERNAL_DOMAIN").unwrap_or_else(|_| "svc.cluster.local".to_string())
});

/// Drive designator for root-relative helper paths.
pub static HELPER_DRIVE: Lazy<String> = Lazy::new(|| {
    std::env::var("SMBMOUNT_DEFAULT_DRIVE").unwrap_or_else(|_| DEFAULT_DRIVE.to_string())
});

/// Endpoint of the helper's filesystem service.
pub static FILESYSTEM_ENDPOINT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("SMBMOUNT_FS_ENDPOINT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default_endpoint("filesystem")))
});

/// Endpoint of the helper's SMB service.
pub static SMB_ENDPOINT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("SMBMOUNT_SMB_ENDPOINT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default_endpoint("smb")))
});

#[cfg(windows)]
fn default_endpoint(group: &str) -> String {
    format!(r"\\.\pipe\csi-proxy-{group}-v1")
}

#[cfg(not(windows))]
fn default_endpoint(group: &str) -> String {
    format!("/run/smbmount/{group}-v1.sock")
}

/// Mounter configuration options.
#[derive(Debug, Clone)]
pub struct MounterConfig {
    /// Suffix identifying cluster-internal hostnames.
    pub internal_domain_suffix: String,
    /// Drive prefixed to root-relative helper paths.
    pub default_drive: String,
    /// Filesystem service endpoint (socket path or pipe name).
    pub filesystem_endpoint: PathBuf,
    /// SMB service endpoint (socket path or pipe name).
    pub smb_endpoint: PathBuf,
    /// Time budget of each call context, shared by every request made under
    /// it; `None` means unbounded.
    pub call_timeout: Option<Duration>,
}

impl Default for MounterConfig {
    fn default() -> Self {
        Self {
            internal_domain_suffix: INTERNAL_DOMAIN_SUFFIX.clone(),
            default_drive: HELPER_DRIVE.clone(),
            filesystem_endpoint: FILESYSTEM_ENDPOINT.clone(),
            smb_endpoint: SMB_ENDPOINT.clone(),
            call_timeout: None,
        }
    }
}

impl MounterConfig {
    /// Set the cluster-internal domain suffix.
    #[must_use]
    pub fn with_internal_domain_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.internal_domain_suffix = suffix.into();
        self
    }

    /// Set the default drive.
    #[must_use]
    pub fn with_default_drive(mut self, drive: impl Into<String>) -> Self {
        self.default_drive = drive.into();
        self
    }

    /// Set both helper endpoints.
    #[must_use]
    pub fn with_endpoints(
        mut self,
        filesystem: impl Into<PathBuf>,
        smb: impl Into<PathBuf>,
    ) -> Self {
        self.filesystem_endpoint = filesystem.into();
        self.smb_endpoint = smb.into();
        self
    }

    /// Set the call context time budget.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Path normalizer for the configured drive.
    #[must_use]
    pub fn normalizer(&self) -> PathNormalizer {
        PathNormalizer::new(self.default_drive.clone())
    }

    /// A fresh call context whose deadline starts counting now.
    #[must_use]
    pub fn call_context(&self) -> CallContext {
        match self.call_timeout {
            Some(timeout) => CallContext::background().with_timeout(timeout),
            None => CallContext::background(),
        }
    }

    /// Reject configurations the mounter cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`MountError::Config`] describing the first invalid field.
    pub fn validate(&self) -> MountResult<()> {
        if self.internal_domain_suffix.trim().is_empty() {
            return Err(MountError::Config {
                message: "internal domain suffix must not be empty".to_string(),
            });
        }
        if !self.default_drive.ends_with(':') || self.default_drive.contains(['/', '\\']) {
            return Err(MountError::Config {
                message: format!(
                    "default drive '{}' must be a drive designator such as 'c:'",
                    self.default_drive
                ),
            });
        }
        if self.call_timeout == Some(Duration::ZERO) {
            return Err(MountError::Config {
                message: "call timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
