//! Generic mount interface consumed by the volume lifecycle service.

use async_trait::async_trait;
use smbmount_common::{CallContext, MountError, MountPoint, MountRequest, MountResult};

use crate::backend::MountBackend;
use crate::mounter::Mounter;

/// Mount operations the node service drives.
///
/// Capability probes this mounter cannot answer fail with
/// [`MountError::NotImplemented`] so a probing caller gets a definite "no".
#[async_trait]
pub trait MountInterface: Send + Sync {
    /// Make `target` show `source`. `fs_type` and `options` are ignored.
    async fn mount(
        &self,
        ctx: &CallContext,
        source: &str,
        target: &str,
        fs_type: &str,
        options: &[String],
    ) -> MountResult<()>;

    /// Remove the mount point at `target`.
    async fn unmount(&self, ctx: &CallContext, target: &str) -> MountResult<()>;

    /// Map an SMB share.
    async fn smb_mount(&self, ctx: &CallContext, request: &MountRequest) -> MountResult<()>;

    /// Remove an SMB mount point.
    async fn smb_unmount(&self, ctx: &CallContext, target: &str) -> MountResult<()>;

    /// `Ok(true)` unless `path` is a mount point.
    ///
    /// A missing path yields [`MountError::NotFound`], which stands for
    /// "not a mount point" as well; check [`MountError::is_not_found`].
    async fn is_likely_not_mount_point(&self, ctx: &CallContext, path: &str) -> MountResult<bool>;

    /// Create a directory.
    async fn make_dir(&self, ctx: &CallContext, path: &str) -> MountResult<()>;

    /// Whether `path` exists. Links are not followed.
    async fn exists_path(&self, ctx: &CallContext, path: &str) -> MountResult<bool>;

    /// Whether `mp` is the mount point for `dir`.
    fn is_mount_point_match(&self, mp: &MountPoint, dir: &str) -> bool {
        mp.path == dir
    }

    /// All mount points on the node.
    fn list(&self) -> MountResult<Vec<MountPoint>> {
        Err(MountError::not_implemented("list"))
    }

    /// Whether `path` is a device node.
    fn path_is_device(&self, _path: &str) -> MountResult<bool> {
        Err(MountError::not_implemented("path_is_device"))
    }

    /// Whether the device at `path` is in use.
    fn device_opened(&self, _path: &str) -> MountResult<bool> {
        Err(MountError::not_implemented("device_opened"))
    }

    /// Device name behind a plugin mount.
    fn get_device_name_from_mount(
        &self,
        _mount_path: &str,
        _plugin_mount_dir: &str,
    ) -> MountResult<String> {
        Err(MountError::not_implemented("get_device_name_from_mount"))
    }

    /// Make a mount recursively shared.
    fn make_rshared(&self, _path: &str) -> MountResult<()> {
        Err(MountError::not_implemented("make_rshared"))
    }

    /// Create an empty file.
    fn make_file(&self, _path: &str) -> MountResult<()> {
        Err(MountError::not_implemented("make_file"))
    }

    /// Resolve symlinks on the host.
    fn eval_host_symlinks(&self, _path: &str) -> MountResult<String> {
        Err(MountError::not_implemented("eval_host_symlinks"))
    }

    /// Other mount points referencing the same source.
    fn get_mount_refs(&self, _path: &str) -> MountResult<Vec<String>> {
        Err(MountError::not_implemented("get_mount_refs"))
    }

    /// Owning group of `path`.
    fn get_fs_group(&self, _path: &str) -> MountResult<i64> {
        Err(MountError::not_implemented("get_fs_group"))
    }

    /// Whether the filesystem at `path` supports SELinux labels.
    fn get_selinux_support(&self, _path: &str) -> MountResult<bool> {
        Err(MountError::not_implemented("get_selinux_support"))
    }

    /// Permission bits of `path`.
    fn get_mode(&self, _path: &str) -> MountResult<u32> {
        Err(MountError::not_implemented("get_mode"))
    }

    /// Generic mount with options that must not be logged.
    fn mount_sensitive(
        &self,
        _source: &str,
        _target: &str,
        _fs_type: &str,
        _options: &[String],
        _sensitive_options: &[String],
    ) -> MountResult<()> {
        Err(MountError::not_implemented("mount_sensitive"))
    }

    /// [`MountInterface::mount_sensitive`] outside any systemd scope.
    fn mount_sensitive_without_systemd(
        &self,
        _source: &str,
        _target: &str,
        _fs_type: &str,
        _options: &[String],
        _sensitive_options: &[String],
    ) -> MountResult<()> {
        Err(MountError::not_implemented("mount_sensitive_without_systemd"))
    }
}

#[async_trait]
impl<B: MountBackend> MountInterface for Mounter<B> {
    async fn mount(
        &self,
        ctx: &CallContext,
        source: &str,
        target: &str,
        _fs_type: &str,
        _options: &[String],
    ) -> MountResult<()> {
        self.link(ctx, source, target).await
    }

    async fn unmount(&self, ctx: &CallContext, target: &str) -> MountResult<()> {
        tracing::debug!(target, "Unmount");
        self.remove_directory(ctx, target).await
    }

    async fn smb_mount(&self, ctx: &CallContext, request: &MountRequest) -> MountResult<()> {
        self.ensure_mounted(ctx, request).await
    }

    async fn smb_unmount(&self, ctx: &CallContext, target: &str) -> MountResult<()> {
        self.ensure_unmounted(ctx, target).await
    }

    async fn is_likely_not_mount_point(&self, ctx: &CallContext, path: &str) -> MountResult<bool> {
        tracing::debug!(path, "IsLikelyNotMountPoint");
        Ok(!self.query(ctx, path).await?.is_mount_point)
    }

    async fn make_dir(&self, ctx: &CallContext, path: &str) -> MountResult<()> {
        self.create_directory(ctx, path).await
    }

    async fn exists_path(&self, ctx: &CallContext, path: &str) -> MountResult<bool> {
        tracing::debug!(path, "Exists path");
        self.backend().path_exists(ctx, path).await
    }
}
