//! Connection management.
//!
//! Turns a helper endpoint (Unix socket path, or named pipe on Windows) into
//! a tonic [`Channel`], connecting lazily on first use. The channel is
//! cloned per request; concurrent use is the channel's business.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hyper_util::rt::TokioIo;
use smbmount_common::{MountError, MountResult};
use tokio::sync::OnceCell;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;

/// Placeholder authority; the connector ignores it.
const LOCAL_AUTHORITY: &str = "http://[::]:50051";

/// Lazy connection to one helper endpoint.
#[derive(Debug, Clone)]
pub struct Connection {
    endpoint: PathBuf,
    channel: Arc<OnceCell<Channel>>,
}

impl Connection {
    /// Create a lazy connection (does not connect immediately).
    pub fn new(endpoint: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: endpoint.into(),
            channel: Arc::new(OnceCell::new()),
        }
    }

    /// The endpoint this connection targets.
    #[must_use]
    pub fn endpoint(&self) -> &Path {
        &self.endpoint
    }

    /// Get or establish the channel.
    ///
    /// # Errors
    ///
    /// Returns [`MountError::Transport`] if the endpoint cannot be reached.
    pub async fn channel(&self) -> MountResult<Channel> {
        let channel = self
            .channel
            .get_or_try_init(|| connect(&self.endpoint))
            .await?;
        Ok(channel.clone())
    }
}

#[cfg(unix)]
async fn connect(endpoint: &Path) -> MountResult<Channel> {
    let socket_path = endpoint.to_path_buf();
    tracing::debug!(endpoint = %socket_path.display(), "Connecting to helper via Unix socket");

    let channel = Endpoint::try_from(LOCAL_AUTHORITY)
        .map_err(MountError::transport)?
        .connect_with_connector(service_fn(move |_: Uri| {
            let socket_path = socket_path.clone();
            async move {
                let stream = tokio::net::UnixStream::connect(socket_path).await?;
                Ok::<_, std::io::Error>(TokioIo::new(stream))
            }
        }))
        .await
        .map_err(|e| MountError::Transport {
            message: format!("connect {}: {e}", endpoint.display()),
        })?;

    tracing::debug!(endpoint = %endpoint.display(), "Connected to helper");
    Ok(channel)
}

#[cfg(windows)]
async fn connect(endpoint: &Path) -> MountResult<Channel> {
    use tokio::net::windows::named_pipe::ClientOptions;

    let pipe_name = endpoint.as_os_str().to_os_string();
    tracing::debug!(endpoint = %endpoint.display(), "Connecting to helper via named pipe");

    let channel = Endpoint::try_from(LOCAL_AUTHORITY)
        .map_err(MountError::transport)?
        .connect_with_connector(service_fn(move |_: Uri| {
            let pipe_name = pipe_name.clone();
            async move {
                let pipe = ClientOptions::new().open(&pipe_name)?;
                Ok::<_, std::io::Error>(TokioIo::new(pipe))
            }
        }))
        .await
        .map_err(|e| MountError::Transport {
            message: format!("connect {}: {e}", endpoint.display()),
        })?;

    tracing::debug!(endpoint = %endpoint.display(), "Connected to helper");
    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_socket_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let connection = Connection::new(dir.path().join("absent.sock"));
        assert_eq!(connection.endpoint(), dir.path().join("absent.sock"));

        let err = connection.channel().await.unwrap_err();
        assert!(matches!(err, MountError::Transport { .. }), "{err:?}");
    }
}
