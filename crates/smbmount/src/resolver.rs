//! Best-effort resolution of cluster-internal share hosts.
//!
//! Hostnames under the cluster's internal service domain often resolve more
//! reliably on the node than on the remote side of the mapping, so the host
//! in the share address is swapped for its IPv4 address before mounting.
//! Failure to resolve is logged and otherwise ignored.

use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use async_trait::async_trait;
use smbmount_common::{CallContext, MountError};

/// Looks up IPv4 addresses for host names.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// First IPv4 address of `host`.
    async fn resolve_ipv4(&self, host: &str) -> io::Result<Ipv4Addr>;
}

/// [`HostResolver`] backed by the system resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve_ipv4(&self, host: &str) -> io::Result<Ipv4Addr> {
        tokio::net::lookup_host((host, 0))
            .await?
            .find_map(|addr| match addr.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no IPv4 address for {host}"),
                )
            })
    }
}

/// Outcome of [`AddressResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Share address to mount, substituted or original.
    pub source: String,
    /// Address the host resolved to, if it was substituted.
    pub resolved: Option<Ipv4Addr>,
}

impl Resolution {
    fn unchanged(source: &str) -> Self {
        Self {
            source: source.to_string(),
            resolved: None,
        }
    }

    /// Whether the host was replaced by an address.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

/// Resolves share hosts that live under the internal domain suffix.
#[derive(Clone)]
pub struct AddressResolver {
    suffix: String,
    resolver: Arc<dyn HostResolver>,
}

impl AddressResolver {
    /// Resolver for hosts ending in `suffix`, using the system resolver.
    pub fn new(suffix: impl Into<String>) -> Self {
        Self::with_resolver(suffix, Arc::new(SystemResolver))
    }

    /// Resolver for hosts ending in `suffix`, using `resolver` for lookups.
    pub fn with_resolver(suffix: impl Into<String>, resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            suffix: suffix.into(),
            resolver,
        }
    }

    /// The internal domain suffix.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Host component of a share address: its first non-empty token when
    /// split on spaces and slashes.
    #[must_use]
    pub fn host_token(source: &str) -> Option<&str> {
        source.split([' ', '/']).find(|token| !token.is_empty())
    }

    /// Whether `host` is a cluster-internal name.
    #[must_use]
    pub fn is_internal(&self, host: &str) -> bool {
        host.ends_with(self.suffix.as_str())
    }

    /// Substitute the IPv4 address for an internal host in `source`.
    ///
    /// Every occurrence of the host name is replaced. Lookup failures,
    /// deadlines and cancellation all leave `source` unchanged.
    pub async fn resolve(&self, ctx: &CallContext, source: &str) -> Resolution {
        let Some(host) = Self::host_token(source) else {
            return Resolution::unchanged(source);
        };
        if !self.is_internal(host) {
            return Resolution::unchanged(source);
        }

        let lookup = ctx
            .run("ResolveHost", async {
                self.resolver
                    .resolve_ipv4(host)
                    .await
                    .map_err(MountError::from)
            })
            .await;

        match lookup {
            Ok(ip) => {
                tracing::debug!(host, %ip, "Resolved share host to IPv4 address");
                Resolution {
                    source: source.replace(host, &ip.to_string()),
                    resolved: Some(ip),
                }
            }
            Err(e) => {
                tracing::warn!(
                    host,
                    error = %e,
                    "Could not resolve share host to an IPv4 address, mounting by name"
                );
                Resolution::unchanged(source)
            }
        }
    }
}

impl std::fmt::Debug for AddressResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressResolver")
            .field("suffix", &self.suffix)
            .finish_non_exhaustive()
    }
}
