//! Mapping of gRPC statuses onto [`MountError`].

use smbmount_common::MountError;
use tonic::{Code, Status};

/// Classify a failed RPC.
///
/// `Unavailable` means the channel itself is gone and becomes
/// [`MountError::Transport`]; anything else is the helper rejecting the
/// request.
pub(crate) fn rpc_error(operation: &str, status: &Status) -> MountError {
    match status.code() {
        Code::Unavailable => MountError::Transport {
            message: format!("{operation}: {}", status.message()),
        },
        code => MountError::Remote {
            operation: operation.to_string(),
            code: format!("{code:?}"),
            message: status.message().to_string(),
        },
    }
}
