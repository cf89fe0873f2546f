//! Minimal async client for the toy SQL database's TCP protocol.
//!
//! Per §6.1, each connection carries exactly one statement: connect, send
//! one line, read one line back, done. A fresh [`Client`] is needed for the
//! next statement.

use common::DbResult;
use protocol::frame;
use tokio::io::BufReader;
use tokio::net::TcpStream;

/// A single request/response round trip against the server.
pub struct Client {
    socket: TcpStream,
}

impl Client {
    /// Open a new connection to `addr` (e.g. `"127.0.0.1:2000"`).
    pub async fn connect(addr: &str) -> DbResult<Self> {
        let socket = TcpStream::connect(addr).await?;
        Ok(Self { socket })
    }

    /// Send `sql` as the connection's one statement and return the server's
    /// response line verbatim (success payload or error message — the wire
    /// protocol does not distinguish them, per §6.1).
    pub async fn execute(mut self, sql: &str) -> DbResult<String> {
        frame::write_line(&mut self.socket, sql).await?;

        let (read_half, _write_half) = self.socket.into_split();
        let mut reader = BufReader::new(read_half);
        match frame::read_line(&mut reader).await? {
            Some(line) => Ok(line),
            None => Ok(String::new()),
        }
    }
}
