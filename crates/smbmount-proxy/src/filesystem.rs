//! Filesystem half of the helper contract.

use std::path::PathBuf;

use async_trait::async_trait;
use smbmount_common::{CallContext, MountResult, PathScope};
use tonic::transport::Channel;

use crate::connection::Connection;
use crate::proto::filesystem::filesystem_client::FilesystemClient;
use crate::proto::filesystem::{
    IsMountPointRequest, LinkPathRequest, MkdirRequest, PathContext, PathExistsRequest,
    RmdirRequest,
};
use crate::status::rpc_error;

/// Filesystem operations performed by the privileged helper.
///
/// Paths are passed through unchanged; callers normalize them first.
#[async_trait]
pub trait FilesystemApi: Send + Sync {
    /// Whether `path` exists. Links are not followed.
    async fn path_exists(&self, ctx: &CallContext, path: &str) -> MountResult<bool>;

    /// Create `path` and any missing parents.
    async fn mkdir(&self, ctx: &CallContext, path: &str, scope: PathScope) -> MountResult<()>;

    /// Remove `path`. With `force`, contents go too and a missing path succeeds.
    async fn rmdir(
        &self,
        ctx: &CallContext,
        path: &str,
        scope: PathScope,
        force: bool,
    ) -> MountResult<()>;

    /// Whether `path` is a mount point.
    async fn is_mount_point(&self, ctx: &CallContext, path: &str) -> MountResult<bool>;

    /// Link `target` to `source`.
    async fn link_path(&self, ctx: &CallContext, source: &str, target: &str) -> MountResult<()>;
}

impl From<PathScope> for PathContext {
    fn from(scope: PathScope) -> Self {
        match scope {
            PathScope::Plugin => PathContext::Plugin,
            PathScope::Pod => PathContext::Pod,
        }
    }
}

/// [`FilesystemApi`] over the helper's gRPC filesystem service.
#[derive(Debug, Clone)]
pub struct FilesystemProxy {
    connection: Connection,
}

impl FilesystemProxy {
    /// Proxy for the service at `endpoint`. Connects on first use.
    pub fn new(endpoint: impl Into<PathBuf>) -> Self {
        Self {
            connection: Connection::new(endpoint),
        }
    }

    /// Proxy over an existing connection.
    #[must_use]
    pub fn with_connection(connection: Connection) -> Self {
        Self { connection }
    }

    async fn client(&self) -> MountResult<FilesystemClient<Channel>> {
        Ok(FilesystemClient::new(self.connection.channel().await?))
    }
}

#[async_trait]
impl FilesystemApi for FilesystemProxy {
    async fn path_exists(&self, ctx: &CallContext, path: &str) -> MountResult<bool> {
        tracing::debug!(path, "PathExists");
        ctx.run("PathExists", async {
            let response = self
                .client()
                .await?
                .path_exists(PathExistsRequest {
                    path: path.to_string(),
                })
                .await
                .map_err(|s| rpc_error("PathExists", &s))?;
            Ok(response.into_inner().exists)
        })
        .await
    }

    async fn mkdir(&self, ctx: &CallContext, path: &str, scope: PathScope) -> MountResult<()> {
        tracing::debug!(path, %scope, "Mkdir");
        ctx.run("Mkdir", async {
            self.client()
                .await?
                .mkdir(MkdirRequest {
                    path: path.to_string(),
                    context: PathContext::from(scope).into(),
                })
                .await
                .map_err(|s| rpc_error("Mkdir", &s))?;
            Ok(())
        })
        .await
    }

    async fn rmdir(
        &self,
        ctx: &CallContext,
        path: &str,
        scope: PathScope,
        force: bool,
    ) -> MountResult<()> {
        tracing::debug!(path, %scope, force, "Rmdir");
        ctx.run("Rmdir", async {
            self.client()
                .await?
                .rmdir(RmdirRequest {
                    path: path.to_string(),
                    context: PathContext::from(scope).into(),
                    force,
                })
                .await
                .map_err(|s| rpc_error("Rmdir", &s))?;
            Ok(())
        })
        .await
    }

    async fn is_mount_point(&self, ctx: &CallContext, path: &str) -> MountResult<bool> {
        tracing::debug!(path, "IsMountPoint");
        ctx.run("IsMountPoint", async {
            let response = self
                .client()
                .await?
                .is_mount_point(IsMountPointRequest {
                    path: path.to_string(),
                })
                .await
                .map_err(|s| rpc_error("IsMountPoint", &s))?;
            Ok(response.into_inner().is_mount_point)
        })
        .await
    }

    async fn link_path(&self, ctx: &CallContext, source: &str, target: &str) -> MountResult<()> {
        tracing::debug!(source, target, "LinkPath");
        ctx.run("LinkPath", async {
            self.client()
                .await?
                .link_path(LinkPathRequest {
                    source_path: source.to_string(),
                    target_path: target.to_string(),
                })
                .await
                .map_err(|s| rpc_error("LinkPath", &s))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_maps_to_wire_context() {
        assert_eq!(PathContext::from(PathScope::Plugin), PathContext::Plugin);
        assert_eq!(PathContext::from(PathScope::Pod), PathContext::Pod);
        assert_eq!(i32::from(PathContext::from(PathScope::Pod)), 1);
    }
}
