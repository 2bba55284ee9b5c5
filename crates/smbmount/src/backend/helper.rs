//! Backend delegating to the privileged helper service.

use std::sync::Arc;

use async_trait::async_trait;
use smbmount_common::paths::to_unc;
use smbmount_common::{
    CallContext, MounterConfig, MountResult, PathNormalizer, PathScope, ShareMapping,
};
use smbmount_proxy::{Connection, FilesystemApi, FilesystemProxy, SmbApi, SmbProxy};

use super::MountBackend;

/// [`MountBackend`] realized through the helper's filesystem and SMB services.
///
/// Local paths are normalized and share addresses converted to backslash form
/// here, immediately before each request is sent.
#[derive(Clone)]
pub struct RemoteHelperMount {
    fs: Arc<dyn FilesystemApi>,
    smb: Arc<dyn SmbApi>,
    normalizer: PathNormalizer,
}

impl RemoteHelperMount {
    /// Backend over explicit helper clients.
    pub fn new(
        fs: Arc<dyn FilesystemApi>,
        smb: Arc<dyn SmbApi>,
        normalizer: PathNormalizer,
    ) -> Self {
        Self { fs, smb, normalizer }
    }

    /// Backend over the configured endpoints, connecting on first use.
    #[must_use]
    pub fn from_config(config: &MounterConfig) -> Self {
        Self::new(
            Arc::new(FilesystemProxy::new(&config.filesystem_endpoint)),
            Arc::new(SmbProxy::new(&config.smb_endpoint)),
            config.normalizer(),
        )
    }

    /// Backend over the configured endpoints, connecting both right away.
    ///
    /// # Errors
    ///
    /// Returns [`smbmount_common::MountError::Transport`] if either endpoint
    /// is unreachable.
    pub async fn connect(config: &MounterConfig) -> MountResult<Self> {
        let fs = Connection::new(&config.filesystem_endpoint);
        let smb = Connection::new(&config.smb_endpoint);
        fs.channel().await?;
        smb.channel().await?;

        tracing::info!(
            filesystem = %config.filesystem_endpoint.display(),
            smb = %config.smb_endpoint.display(),
            "Connected to helper service"
        );
        Ok(Self::new(
            Arc::new(FilesystemProxy::with_connection(fs)),
            Arc::new(SmbProxy::with_connection(smb)),
            config.normalizer(),
        ))
    }

    /// The normalizer applied to outgoing paths.
    #[must_use]
    pub fn normalizer(&self) -> &PathNormalizer {
        &self.normalizer
    }
}

#[async_trait]
impl MountBackend for RemoteHelperMount {
    fn name(&self) -> &'static str {
        "helper"
    }

    async fn path_exists(&self, ctx: &CallContext, path: &str) -> MountResult<bool> {
        self.fs.path_exists(ctx, &self.normalizer.normalize(path)).await
    }

    async fn make_dir(&self, ctx: &CallContext, path: &str, scope: PathScope) -> MountResult<()> {
        self.fs
            .mkdir(ctx, &self.normalizer.normalize(path), scope)
            .await
    }

    async fn remove_dir(
        &self,
        ctx: &CallContext,
        path: &str,
        scope: PathScope,
        force: bool,
    ) -> MountResult<()> {
        self.fs
            .rmdir(ctx, &self.normalizer.normalize(path), scope, force)
            .await
    }

    async fn is_mount_point(&self, ctx: &CallContext, path: &str) -> MountResult<bool> {
        self.fs
            .is_mount_point(ctx, &self.normalizer.normalize(path))
            .await
    }

    async fn link_path(&self, ctx: &CallContext, source: &str, target: &str) -> MountResult<()> {
        self.fs
            .link_path(
                ctx,
                &self.normalizer.normalize(source),
                &self.normalizer.normalize(target),
            )
            .await
    }

    async fn create_share_mapping(
        &self,
        ctx: &CallContext,
        mapping: &ShareMapping,
    ) -> MountResult<()> {
        let request = ShareMapping {
            local_path: self.normalizer.normalize(&mapping.local_path),
            remote_path: to_unc(&mapping.remote_path),
            username: mapping.username.clone(),
            password: mapping.password.clone(),
        };
        self.smb.new_smb_global_mapping(ctx, &request).await
    }
}

impl std::fmt::Debug for RemoteHelperMount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteHelperMount")
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}
