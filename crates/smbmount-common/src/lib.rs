//! # smbmount-common
//!
//! Shared utilities and types for the smbmount node plugin.
//!
//! This crate provides common functionality used across all smbmount crates:
//! - Helper-side path normalization
//! - Runtime configuration with environment defaults
//! - Per-call deadlines and cancellation
//! - Mount request and share mapping types
//! - Common error types

#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod error;
pub mod mount;
pub mod paths;

pub use config::MounterConfig;
pub use context::CallContext;
pub use error::{MountError, MountResult};
pub use mount::{MountPoint, MountRequest, PathScope, ShareMapping};
pub use paths::PathNormalizer;
