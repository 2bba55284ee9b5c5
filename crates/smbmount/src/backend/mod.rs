//! Mount backends.
//!
//! The orchestrator is written once against [`MountBackend`]. Two variants
//! exist:
//! - [`RemoteHelperMount`]: every operation is delegated to the privileged
//!   helper service
//! - [`NativeMount`]: operations run in-process with OS primitives
//!
//! Backends receive caller-form paths and convert them as their platform
//! requires.

mod helper;
mod native;

use async_trait::async_trait;
use smbmount_common::{CallContext, MountResult, PathScope, ShareMapping};

pub use helper::RemoteHelperMount;
pub use native::NativeMount;

/// Primitive filesystem and share operations a mounter is built from.
#[async_trait]
pub trait MountBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Whether `path` exists, without following links.
    async fn path_exists(&self, ctx: &CallContext, path: &str) -> MountResult<bool>;

    /// Create `path` and missing parents.
    async fn make_dir(&self, ctx: &CallContext, path: &str, scope: PathScope) -> MountResult<()>;

    /// Remove `path`. With `force`, contents go too and a missing path succeeds.
    async fn remove_dir(
        &self,
        ctx: &CallContext,
        path: &str,
        scope: PathScope,
        force: bool,
    ) -> MountResult<()>;

    /// Whether `path` is a mount point.
    async fn is_mount_point(&self, ctx: &CallContext, path: &str) -> MountResult<bool>;

    /// Make `target` show the contents of `source`.
    async fn link_path(&self, ctx: &CallContext, source: &str, target: &str) -> MountResult<()>;

    /// Establish a share mapping. Must succeed when the mapping already exists.
    async fn create_share_mapping(
        &self,
        ctx: &CallContext,
        mapping: &ShareMapping,
    ) -> MountResult<()>;
}
