//! # smbmount
//!
//! Node-side SMB mount orchestration for a CSI plugin.
//!
//! On nodes where the plugin cannot mount by itself, every filesystem and
//! share operation is delegated to a privileged helper service reached over
//! a local control channel. Elsewhere the same orchestration runs on the
//! node's own mount primitives.
//!
//! ## Usage
//!
//! ```no_run
//! use smbmount::{MountInterface, Mounter};
//! use smbmount_common::{MountRequest, MounterConfig};
//!
//! # async fn example() -> smbmount_common::MountResult<()> {
//! let config = MounterConfig::default();
//! let mounter = Mounter::connect(&config).await?;
//! let ctx = config.call_context();
//!
//! let request = MountRequest::new(
//!     "//smb-server.default.svc.cluster.local/share",
//!     "/var/lib/kubelet/plugins/smb/globalmount",
//!     vec!["user".to_string()],
//!     vec!["pass".to_string()],
//! );
//! mounter.smb_mount(&ctx, &request).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod cli;
pub mod interface;
pub mod mounter;
pub mod resolver;

pub use backend::{MountBackend, NativeMount, RemoteHelperMount};
pub use interface::MountInterface;
pub use mounter::Mounter;
pub use resolver::{AddressResolver, HostResolver, Resolution, SystemResolver};
