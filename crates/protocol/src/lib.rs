//! Wire protocol for client-server communication.
//!
//! Per §6.1: one UTF-8 SQL statement terminated by a newline from the
//! client; one UTF-8 response (success payload or error string) terminated
//! by a newline back. No length prefix, no framing beyond the newline
//! delimiter, no negotiation — the server closes the connection after each
//! response.

use std::io;

/// Newline-delimited read/write helpers, async (server/client, over a TCP
/// socket) and sync (tests working against an in-memory buffer).
pub mod frame {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    /// Read one newline-terminated line from `reader`, with the trailing
    /// `\n` (and a possible `\r`) stripped. Returns `Ok(None)` on a clean
    /// EOF with nothing read (the client closed the connection).
    pub async fn read_line<R>(reader: &mut BufReader<R>) -> io::Result<Option<String>>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Write `text` followed by a single `\n`, flushing the writer.
    pub async fn write_line<W>(writer: &mut W, text: &str) -> io::Result<()>
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        writer.write_all(text.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::frame;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn round_trips_one_line() {
        let mut buf = Vec::new();
        frame::write_line(&mut buf, "SELECT * FROM t").await.unwrap();
        assert_eq!(buf, b"SELECT * FROM t\n");

        let mut reader = BufReader::new(buf.as_slice());
        let line = frame::read_line(&mut reader).await.unwrap();
        assert_eq!(line.as_deref(), Some("SELECT * FROM t"));
    }

    #[tokio::test]
    async fn strips_carriage_return() {
        let mut reader = BufReader::new(&b"SELECT 1\r\n"[..]);
        let line = frame::read_line(&mut reader).await.unwrap();
        assert_eq!(line.as_deref(), Some("SELECT 1"));
    }

    #[tokio::test]
    async fn clean_eof_yields_none() {
        let mut reader = BufReader::new(&b""[..]);
        let line = frame::read_line(&mut reader).await.unwrap();
        assert_eq!(line, None);
    }
}
