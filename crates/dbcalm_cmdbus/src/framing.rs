//! End-of-message detection: the peer pauses briefly between writes, so a
//! read that goes quiet for `idle` without new bytes is treated as "message
//! complete" rather than requiring a length prefix or delimiter.

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Reads bytes until either the connection closes or no new bytes arrive
/// for `idle`. Blocks indefinitely waiting for the *first* byte (a fresh
/// connection may take a moment to write its request).
pub async fn read_until_idle<R>(stream: &mut R, idle: Duration) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];

    loop {
        let read = if buf.is_empty() {
            stream.read(&mut chunk).await?
        } else {
            match tokio::time::timeout(idle, stream.read(&mut chunk)).await {
                Ok(result) => result?,
                Err(_elapsed) => break,
            }
        };

        if read == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..read]);
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncWriteExt};

    #[tokio::test]
    async fn reads_until_writer_pauses() {
        let (mut client, mut server) = duplex(1024);
        let write_task = tokio::spawn(async move {
            client.write_all(b"hello").await.unwrap();
            client.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            // dropped after the sleep; no more data follows the idle window
        });

        let data = read_until_idle(&mut server, Duration::from_millis(50)).await.unwrap();
        assert_eq!(data, b"hello");
        write_task.await.unwrap();
    }

    #[tokio::test]
    async fn reads_until_peer_closes() {
        let (mut client, mut server) = duplex(1024);
        client.write_all(b"world").await.unwrap();
        drop(client);

        let data = read_until_idle(&mut server, Duration::from_millis(200)).await.unwrap();
        assert_eq!(data, b"world");
    }
}
