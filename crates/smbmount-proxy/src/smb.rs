//! SMB half of the helper contract.

use std::path::PathBuf;

use async_trait::async_trait;
use smbmount_common::{CallContext, MountResult, ShareMapping};

use crate::connection::Connection;
use crate::proto::smb::NewSmbGlobalMappingRequest;
use crate::proto::smb::smb_client::SmbClient;
use crate::status::rpc_error;

/// Share mapping operations performed by the privileged helper.
#[async_trait]
pub trait SmbApi: Send + Sync {
    /// Map `mapping.remote_path` at `mapping.local_path` node-wide.
    ///
    /// Idempotent on the helper side: mapping the same share again succeeds.
    async fn new_smb_global_mapping(
        &self,
        ctx: &CallContext,
        mapping: &ShareMapping,
    ) -> MountResult<()>;
}

impl From<&ShareMapping> for NewSmbGlobalMappingRequest {
    fn from(mapping: &ShareMapping) -> Self {
        Self {
            remote_path: mapping.remote_path.clone(),
            local_path: mapping.local_path.clone(),
            username: mapping.username.clone(),
            password: mapping.password.clone(),
        }
    }
}

/// [`SmbApi`] over the helper's gRPC SMB service.
#[derive(Debug, Clone)]
pub struct SmbProxy {
    connection: Connection,
}

impl SmbProxy {
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
}

#[async_trait]
impl SmbApi for SmbProxy {
    async fn new_smb_global_mapping(
        &self,
        ctx: &CallContext,
        mapping: &ShareMapping,
    ) -> MountResult<()> {
        tracing::debug!(
            remote = %mapping.remote_path,
            local = %mapping.local_path,
            username = %mapping.username,
            "NewSmbGlobalMapping"
        );
        ctx.run("NewSmbGlobalMapping", async {
            let mut client = SmbClient::new(self.connection.channel().await?);
            client
                .new_smb_global_mapping(NewSmbGlobalMappingRequest::from(mapping))
                .await
                .map_err(|s| rpc_error("NewSmbGlobalMapping", &s))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_all_fields() {
        let mapping = ShareMapping {
            local_path: r"c:\mnt\smb".into(),
            remote_path: r"\\smb-server\share".into(),
            username: "user".into(),
            password: "pass".into(),
        };
        let request = NewSmbGlobalMappingRequest::from(&mapping);
        assert_eq!(request.local_path, r"c:\mnt\smb");
        assert_eq!(request.remote_path, r"\\smb-server\share");
        assert_eq!(request.username, "user");
        assert_eq!(request.password, "pass");
    }
}
