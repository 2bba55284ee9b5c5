//! # smbmount-proxy
//!
//! Client side of the privileged helper service contract.
//!
//! The helper exposes two gRPC services over a local control channel:
//! filesystem operations and SMB share mappings. This crate provides
//! - the generated wire types ([`proto`]),
//! - the [`FilesystemApi`] and [`SmbApi`] traits the mounter is written against,
//! - tonic-backed implementations, [`FilesystemProxy`] and [`SmbProxy`].
//!
//! Paths are sent exactly as given; normalization is the caller's job.

#![warn(missing_docs)]

mod connection;
pub mod filesystem;
pub mod smb;
mod status;

pub use connection::Connection;
pub use filesystem::{FilesystemApi, FilesystemProxy};
pub use smb::{SmbApi, SmbProxy};

/// Generated protobuf types, clients and servers.
#[allow(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
pub mod proto {
    /// Filesystem service, `helper.filesystem.v1`.
    pub mod filesystem {
        tonic::include_proto!("helper.filesystem.v1");
    }

    /// SMB service, `helper.smb.v1`.
    pub mod smb {
        tonic::include_proto!("helper.smb.v1");
    }
}
