//! Command-bus client: connect, send one request, read one response. A
//! bounded timeout covers the whole round trip so a wedged command service
//! never hangs its caller.

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::error::{CmdBusError, CmdBusResult};
use crate::framing::read_until_idle;
use crate::protocol::{CommandRequest, CommandResponse};

/// Dev-mode client timeout (generous, for interactive debugging against a
/// service under a debugger).
pub const DEV_TIMEOUT: Duration = Duration::from_secs(60);
/// Production client timeout.
pub const PROD_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub socket_path: PathBuf,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Resolves the timeout from `DBCALM_DEV_MODE` the way the rest of the
    /// stack resolves dev/prod-sensitive settings from the environment.
    #[must_use]
    pub fn new(socket_path: PathBuf) -> Self {
        let dev_mode = std::env::var("DBCALM_DEV_MODE").map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
        Self { socket_path, timeout: if dev_mode { DEV_TIMEOUT } else { PROD_TIMEOUT } }
    }
}

/// Sends one command and returns the decoded response, or
/// `CommandResponse::rejected(503, "timeout")` if nothing came back in
/// time (per the external contract: callers see a structured response, not
/// an error, on timeout).
pub async fn call(config: &ClientConfig, request: CommandRequest) -> CmdBusResult<CommandResponse> {
    match tokio::time::timeout(config.timeout, call_inner(config, request)).await {
        Ok(result) => result,
        Err(_elapsed) => Ok(CommandResponse::rejected(503, "timeout")),
    }
}

async fn call_inner(config: &ClientConfig, request: CommandRequest) -> CmdBusResult<CommandResponse> {
    let stream = UnixStream::connect(&config.socket_path).await?;
    let mut reader = BufReader::new(stream);

    let encoded = serde_json::to_vec(&request)?;
    reader.get_mut().write_all(&encoded).await?;
    reader.get_mut().shutdown().await.ok();

    let raw = read_until_idle(&mut reader, Duration::from_millis(200)).await?;
    if raw.is_empty() {
        return Err(CmdBusError::Timeout);
    }
    let response: CommandResponse = serde_json::from_slice(&raw)?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_mode_env_selects_longer_timeout() {
        std::env::set_var("DBCALM_DEV_MODE", "1");
        let config = ClientConfig::new(PathBuf::from("/tmp/does-not-matter.sock"));
        assert_eq!(config.timeout, DEV_TIMEOUT);
        std::env::remove_var("DBCALM_DEV_MODE");
    }

    #[test]
    fn prod_is_the_default() {
        std::env::remove_var("DBCALM_DEV_MODE");
        let config = ClientConfig::new(PathBuf::from("/tmp/does-not-matter.sock"));
        assert_eq!(config.timeout, PROD_TIMEOUT);
    }
}
