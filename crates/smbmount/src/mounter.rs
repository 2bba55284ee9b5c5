//! Idempotent mount orchestration.
//!
//! [`Mounter`] turns "attach this share at this path" into backend calls. It
//! keeps no state between calls, takes no locks and never retries: the
//! caller's reconciliation loop serializes calls per target and owns retry
//! policy.
//!
//! Per target the lifecycle is `Absent -> ensure_mounted -> Mounted ->
//! ensure_unmounted -> Absent`, with [`Mounter::query`] valid in every state.

use smbmount_common::paths::parent_dir;
use smbmount_common::{
    CallContext, MountError, MountPoint, MountRequest, MountResult, MounterConfig, PathScope,
    ShareMapping,
};

use crate::backend::{MountBackend, NativeMount, RemoteHelperMount};
use crate::resolver::AddressResolver;

/// Mount orchestrator over a [`MountBackend`].
#[derive(Debug)]
pub struct Mounter<B> {
    backend: B,
    resolver: AddressResolver,
}

impl Mounter<RemoteHelperMount> {
    /// Mounter delegating to the helper service at the configured endpoints.
    ///
    /// Both endpoints are connected before returning, so a missing helper
    /// fails here rather than on the first mount.
    ///
    /// # Errors
    ///
    /// Returns [`MountError::Config`] for an invalid configuration and
    /// [`MountError::Transport`] if the helper cannot be reached.
    pub async fn connect(config: &MounterConfig) -> MountResult<Self> {
        config.validate()?;
        let backend = RemoteHelperMount::connect(config).await?;
        Ok(Self::new(
            backend,
            AddressResolver::new(config.internal_domain_suffix.clone()),
        ))
    }
}

impl Mounter<NativeMount> {
    /// Mounter using in-process mount primitives.
    ///
    /// # Errors
    ///
    /// Returns [`MountError::Config`] for an invalid configuration.
    pub fn native(config: &MounterConfig) -> MountResult<Self> {
        config.validate()?;
        Ok(Self::new(
            NativeMount::new(),
            AddressResolver::new(config.internal_domain_suffix.clone()),
        ))
    }
}

impl<B: MountBackend> Mounter<B> {
    /// Mounter over an explicit backend and resolver.
    pub fn new(backend: B, resolver: AddressResolver) -> Self {
        Self { backend, resolver }
    }

    /// The backend in use.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Map `request.source` at `request.target`.
    ///
    /// Creates the target's parent when missing and swaps cluster-internal
    /// share hosts for their address when they resolve. Whether the share is
    /// already mapped is left to the backend, whose mapping call is
    /// idempotent.
    ///
    /// # Errors
    ///
    /// - [`MountError::InvalidArgument`] if either option list is empty; no
    ///   backend call is made
    /// - [`MountError::PrecheckFailed`] if the parent existence check fails
    /// - [`MountError::PrerequisiteCreationFailed`] if the parent cannot be created
    /// - [`MountError::MountFailed`] if the mapping call fails
    pub async fn ensure_mounted(&self, ctx: &CallContext, request: &MountRequest) -> MountResult<()> {
        tracing::debug!(
            backend = self.backend.name(),
            source = %request.source,
            target = %request.target,
            "SMB mount"
        );

        let (username, password) = request.credentials()?;

        let parent = parent_dir(&request.target);
        let parent_exists = self
            .backend
            .path_exists(ctx, &parent)
            .await
            .map_err(|e| MountError::PrecheckFailed {
                path: parent.clone(),
                source: Box::new(e),
            })?;

        if !parent_exists {
            tracing::info!(path = %parent, "Parent directory does not exist, creating it");
            self.backend
                .make_dir(ctx, &parent, PathScope::Plugin)
                .await
                .map_err(|e| MountError::PrerequisiteCreationFailed {
                    path: parent.clone(),
                    source: Box::new(e),
                })?;
        }

        let resolution = self.resolver.resolve(ctx, &request.source).await;

        let mapping = ShareMapping {
            local_path: request.target.clone(),
            remote_path: resolution.source,
            username: username.to_string(),
            password: password.to_string(),
        };
        self.backend
            .create_share_mapping(ctx, &mapping)
            .await
            .map_err(|e| MountError::MountFailed {
                remote: mapping.remote_path.clone(),
                target: mapping.local_path.clone(),
                source: Box::new(e),
            })?;

        tracing::debug!(target = %request.target, "SMB mount complete");
        Ok(())
    }

    /// Remove the local mount point at `target`.
    ///
    /// The node-wide share mapping is left in place since other targets may
    /// share it. A missing `target` is not an error.
    pub async fn ensure_unmounted(&self, ctx: &CallContext, target: &str) -> MountResult<()> {
        tracing::debug!(backend = self.backend.name(), target, "SMB unmount");
        self.remove_directory(ctx, target).await
    }

    /// Ask the backend whether `path` is a mount point. Never cached.
    ///
    /// # Errors
    ///
    /// Returns [`MountError::NotFound`] when `path` does not exist, which
    /// callers may read as "not a mount point, and nothing there".
    pub async fn query(&self, ctx: &CallContext, path: &str) -> MountResult<MountPoint> {
        if !self.backend.path_exists(ctx, path).await? {
            return Err(MountError::NotFound {
                path: path.to_string(),
            });
        }
        let is_mount_point = self.backend.is_mount_point(ctx, path).await?;
        Ok(MountPoint {
            path: path.to_string(),
            is_mount_point,
        })
    }

    /// Create `path` under plugin scope.
    pub async fn create_directory(&self, ctx: &CallContext, path: &str) -> MountResult<()> {
        tracing::debug!(path, "Make directory");
        self.backend.make_dir(ctx, path, PathScope::Plugin).await
    }

    /// Forcibly remove `path` under pod scope.
    ///
    /// Removal targets always live in the kubelet per-pod tree, so pod scope
    /// and forced removal are fixed.
    pub async fn remove_directory(&self, ctx: &CallContext, path: &str) -> MountResult<()> {
        tracing::debug!(path, "Remove directory");
        self.backend
            .remove_dir(ctx, path, PathScope::Pod, true)
            .await
    }

    /// Make `target` show the contents of `source`.
    pub async fn link(&self, ctx: &CallContext, source: &str, target: &str) -> MountResult<()> {
        tracing::debug!(source, target, "Link path");
        self.backend.link_path(ctx, source, target).await
    }
}
