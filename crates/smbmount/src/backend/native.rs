//! In-process backend using the node's own mount primitives.
//!
//! Used where the plugin may mount directly. Path scopes only matter to the
//! helper and are ignored here.
//!
//! Mount points are read from the process mount table, so bind mounts on the
//! same filesystem are seen too. Removal detaches every mount stacked on the
//! target before touching its contents and refuses to recurse into a tree
//! that still has live mounts below it.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use smbmount_common::{CallContext, MountError, MountResult, PathScope, ShareMapping};

use super::MountBackend;

/// Filesystem type used for share mappings.
const SMB_FSTYPE: &str = "cifs";

/// Mount table of the current process.
#[cfg(target_os = "linux")]
const MOUNTINFO: &str = "/proc/self/mountinfo";

/// Upper bound on mounts detached from one target.
const MAX_STACKED_MOUNTS: usize = 16;

/// [`MountBackend`] performing every operation in this process.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeMount;

impl NativeMount {
    /// Create a native backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MountBackend for NativeMount {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn path_exists(&self, ctx: &CallContext, path: &str) -> MountResult<bool> {
        ctx.run("PathExists", async {
            match tokio::fs::symlink_metadata(path).await {
                Ok(_) => Ok(true),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn make_dir(&self, ctx: &CallContext, path: &str, _scope: PathScope) -> MountResult<()> {
        tracing::debug!(path, "Creating directory");
        ctx.run("Mkdir", async { Ok(tokio::fs::create_dir_all(path).await?) })
            .await
    }

    async fn remove_dir(
        &self,
        ctx: &CallContext,
        path: &str,
        _scope: PathScope,
        force: bool,
    ) -> MountResult<()> {
        tracing::debug!(path, force, "Removing directory");
        ctx.run("Rmdir", async {
            if !self.path_exists(ctx, path).await? {
                return if force {
                    Ok(())
                } else {
                    Err(MountError::NotFound {
                        path: path.to_string(),
                    })
                };
            }

            let target = PathBuf::from(path);
            blocking(move || {
                detach_all(&target)?;
                if !force {
                    return Ok(std::fs::remove_dir(&target)?);
                }
                if has_mounts_below(&target)? {
                    return Err(MountError::Io(io::Error::new(
                        io::ErrorKind::ResourceBusy,
                        format!("{} has live mounts below it", target.display()),
                    )));
                }
                Ok(std::fs::remove_dir_all(&target)?)
            })
            .await
        })
        .await
    }

    async fn is_mount_point(&self, ctx: &CallContext, path: &str) -> MountResult<bool> {
        let path = PathBuf::from(path);
        ctx.run("IsMountPoint", blocking(move || is_mount_point(&path)))
            .await
    }

    async fn link_path(&self, ctx: &CallContext, source: &str, target: &str) -> MountResult<()> {
        ctx.run("LinkPath", async {
            tokio::fs::create_dir_all(target).await?;
            let (source, target) = (PathBuf::from(source), PathBuf::from(target));
            blocking(move || bind_mount(&source, &target)).await
        })
        .await
    }

    async fn create_share_mapping(
        &self,
        ctx: &CallContext,
        mapping: &ShareMapping,
    ) -> MountResult<()> {
        ctx.run("NewSmbGlobalMapping", async {
            let target = PathBuf::from(&mapping.local_path);
            tokio::fs::create_dir_all(&target).await?;

            let source = share_source(&mapping.remote_path);
            let data = cifs_options(&mapping.username, &mapping.password);
            blocking(move || {
                if is_mount_point(&target)? {
                    tracing::debug!(target = %target.display(), "Share already mounted");
                    return Ok(());
                }
                mount_share(&source, &target, &data)
            })
            .await
        })
        .await
    }
}

/// Share address in the `//server/share` form the kernel client expects.
fn share_source(remote: &str) -> String {
    remote.replace('\\', "/")
}

/// Mount data string carrying the credentials. Commas in the password are
/// doubled, which the CIFS option parser reads as a literal comma.
fn cifs_options(username: &str, password: &str) -> String {
    format!("username={username},password={}", password.replace(',', ",,"))
}

async fn blocking<T, F>(f: F) -> MountResult<T>
where
    F: FnOnce() -> MountResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| MountError::Io(io::Error::other(e)))?
}

/// Detach mounts stacked on `target` until none is left.
fn detach_all(target: &Path) -> MountResult<()> {
    for _ in 0..MAX_STACKED_MOUNTS {
        if !is_mount_point(target)? {
            return Ok(());
        }
        unmount(target)?;
    }
    Err(MountError::Io(io::Error::new(
        io::ErrorKind::ResourceBusy,
        format!("{} is still mounted", target.display()),
    )))
}

/// Mount points listed in a `mountinfo` table.
#[cfg(target_os = "linux")]
fn mount_points(table: &str) -> Vec<PathBuf> {
    table
        .lines()
        .filter_map(|line| line.split_whitespace().nth(4))
        .map(|field| PathBuf::from(unescape_mount_field(field)))
        .collect()
}

/// Undo the octal escapes the kernel applies to mount table fields.
#[cfg(target_os = "linux")]
fn unescape_mount_field(field: &str) -> String {
    field
        .replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

#[cfg(target_os = "linux")]
fn read_mount_points() -> MountResult<Vec<PathBuf>> {
    Ok(mount_points(&std::fs::read_to_string(MOUNTINFO)?))
}

/// Whether `path` is listed in the mount table.
#[cfg(target_os = "linux")]
fn is_mount_point(path: &Path) -> MountResult<bool> {
    let path = std::fs::canonicalize(path)?;
    Ok(read_mount_points()?.iter().any(|mp| *mp == path))
}

/// Whether any mount lives strictly below `path`.
#[cfg(target_os = "linux")]
fn has_mounts_below(path: &Path) -> MountResult<bool> {
    let path = std::fs::canonicalize(path)?;
    Ok(read_mount_points()?
        .iter()
        .any(|mp| mp != &path && mp.starts_with(&path)))
}

/// Mount point check by device and inode comparison with the parent.
#[cfg(all(unix, not(target_os = "linux")))]
fn is_mount_point(path: &Path) -> MountResult<bool> {
    let stat = rustix::fs::stat(path).map_err(|e| MountError::Io(e.into()))?;
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => path,
    };
    let parent_stat = rustix::fs::stat(parent).map_err(|e| MountError::Io(e.into()))?;

    Ok(stat.st_dev != parent_stat.st_dev || stat.st_ino == parent_stat.st_ino)
}

#[cfg(not(target_os = "linux"))]
fn has_mounts_below(_path: &Path) -> MountResult<bool> {
    Ok(false)
}

#[cfg(not(unix))]
fn is_mount_point(_path: &Path) -> MountResult<bool> {
    Err(MountError::not_implemented("IsMountPoint"))
}

/// Mount a CIFS share.
#[cfg(target_os = "linux")]
fn mount_share(source: &str, target: &Path, data: &str) -> MountResult<()> {
    use rustix::mount::{MountFlags, mount};
    use std::ffi::CString;

    tracing::debug!(source, target = %target.display(), "Mounting SMB share");

    let data = CString::new(data).map_err(|_| MountError::InvalidArgument {
        message: "mount credentials must not contain NUL bytes".to_string(),
    })?;
    mount(
        source,
        target,
        SMB_FSTYPE,
        MountFlags::empty(),
        data.as_c_str(),
    )
    .map_err(|e| MountError::Io(e.into()))?;

    tracing::debug!(source, target = %target.display(), "SMB share mounted");
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn mount_share(_source: &str, _target: &Path, _data: &str) -> MountResult<()> {
    Err(MountError::not_implemented(format!("{SMB_FSTYPE} mount")))
}

/// Bind mount a path.
#[cfg(target_os = "linux")]
fn bind_mount(source: &Path, target: &Path) -> MountResult<()> {
    use rustix::mount::mount_bind;

    tracing::debug!(
        source = %source.display(),
        target = %target.display(),
        "Creating bind mount"
    );
    mount_bind(source, target).map_err(|e| MountError::Io(e.into()))?;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn bind_mount(_source: &Path, _target: &Path) -> MountResult<()> {
    Err(MountError::not_implemented("bind mounts"))
}

/// Lazily detach whatever is mounted at `target`.
#[cfg(target_os = "linux")]
fn unmount(target: &Path) -> MountResult<()> {
    use rustix::mount::{UnmountFlags, unmount};

    tracing::debug!(target = %target.display(), "Unmounting");
    unmount(target, UnmountFlags::DETACH).map_err(|e| MountError::Io(e.into()))?;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn unmount(_target: &Path) -> MountResult<()> {
    Err(MountError::not_implemented("unmount"))
}
