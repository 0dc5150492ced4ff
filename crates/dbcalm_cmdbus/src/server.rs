//! Command-bus server: one `UnixListener`, serial accept, a handler that
//! decides the response. Socket bootstrap unlinks a stale file (retrying
//! briefly, since a just-killed prior instance may still be flushing),
//! binds, widens permissions so the API's service user can connect, then
//! runs a plain accept loop — not the recursive relisten the source used,
//! which is a real bug and not reproduced here.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};

use crate::error::{CmdBusError, CmdBusResult};
use crate::framing::read_until_idle;
use crate::protocol::{CommandRequest, CommandResponse};

const STALE_SOCKET_RETRIES: u32 = 10;
const STALE_SOCKET_RETRY_DELAY: Duration = Duration::from_millis(200);
const REQUEST_IDLE_WINDOW: Duration = Duration::from_millis(200);

/// Implemented by each command service: validates, dispatches, and returns
/// a response synchronously. Any background work (the queue handler
/// draining a completion channel) is spawned by the implementation before
/// it returns.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    async fn handle(&self, request: CommandRequest) -> CommandResponse;
}

/// Unlinks a stale socket file at `path`, retrying briefly, then binds and
/// listens. Socket file permissions are widened to `0o770` so the API's
/// service-account user (in the same group) can connect.
pub async fn bind(path: &Path) -> CmdBusResult<UnixListener> {
    let mut last_error = None;
    let mut unlinked = false;
    for attempt in 0..STALE_SOCKET_RETRIES {
        match std::fs::remove_file(path) {
            Ok(()) => {
                unlinked = true;
                break;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                unlinked = true;
                break;
            }
            Err(e) => {
                last_error = Some(e);
                if attempt + 1 < STALE_SOCKET_RETRIES {
                    tokio::time::sleep(STALE_SOCKET_RETRY_DELAY).await;
                }
            }
        }
    }
    if !unlinked {
        let detail = last_error.map_or_else(|| "unknown error".to_string(), |e| e.to_string());
        return Err(CmdBusError::StaleSocket(detail));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let listener = UnixListener::bind(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o770))?;
    }

    Ok(listener)
}

/// Runs the accept loop forever. A single malformed connection is logged
/// and does not bring down the service.
pub async fn serve(listener: UnixListener, handler: Arc<dyn CommandHandler>) -> ! {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                if let Err(err) = handle_connection(stream, handler.as_ref()).await {
                    tracing::warn!(error = %err, "command-bus connection failed");
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "command-bus accept failed");
            }
        }
    }
}

async fn handle_connection(mut stream: UnixStream, handler: &dyn CommandHandler) -> CmdBusResult<()> {
    let raw = read_until_idle(&mut stream, REQUEST_IDLE_WINDOW).await?;

    let response = match serde_json::from_slice::<CommandRequest>(&raw) {
        Ok(request) => handler.handle(request).await,
        Err(err) => {
            tracing::warn!(error = %err, "malformed command-bus request");
            CommandResponse::rejected(400, "invalid request body")
        }
    };

    let encoded = serde_json::to_vec(&response)?;
    stream.write_all(&encoded).await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{call, ClientConfig};
    use serde_json::json;
    use tempfile::tempdir;

    struct EchoHandler;

    #[async_trait]
    impl CommandHandler for EchoHandler {
        async fn handle(&self, request: CommandRequest) -> CommandResponse {
            if request.cmd == "boom" {
                return CommandResponse::rejected(400, "bad command");
            }
            CommandResponse::accepted("cmd-123".into())
        }
    }

    #[tokio::test]
    async fn server_accepts_and_responds() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("test.sock");
        let listener = bind(&socket_path).await.unwrap();

        tokio::spawn(serve(listener, Arc::new(EchoHandler)));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let request = CommandRequest::new("full_backup".into(), json!({"id": "x"}));
        let config = ClientConfig { socket_path: socket_path.clone(), timeout: Duration::from_secs(2) };
        let response = call(&config, request).await.unwrap();
        assert!(response.is_accepted());
        assert_eq!(response.id.as_deref(), Some("cmd-123"));
    }

    #[tokio::test]
    async fn server_rejects_per_handler_logic() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("test2.sock");
        let listener = bind(&socket_path).await.unwrap();

        tokio::spawn(serve(listener, Arc::new(EchoHandler)));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let request = CommandRequest::new("boom".into(), json!({}));
        let config = ClientConfig { socket_path, timeout: Duration::from_secs(2) };
        let response = call(&config, request).await.unwrap();
        assert_eq!(response.code, 400);
    }

    #[tokio::test]
    async fn bind_recovers_from_stale_socket_file() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("stale.sock");
        std::fs::write(&socket_path, b"not a socket").unwrap();

        let listener = bind(&socket_path).await.unwrap();
        drop(listener);
    }
}
