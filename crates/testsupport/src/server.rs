//! Spin up the real accept loop on an ephemeral port against a temporary
//! data directory, so integration tests can drive the public TCP protocol
//! without a fixed address or a separate process.

use common::Config;
use database::Database;
use protocol::frame;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// An in-process server bound to `127.0.0.1:0`; aborts its accept loop and
/// removes its data directory on drop.
pub struct TestServer {
    addr: String,
    _temp_dir: TempDir,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with_cache_limit(50).await
    }

    pub async fn start_with_cache_limit(cache_limit: usize) -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let config = Config::builder()
            .data_dir(temp_dir.path().to_path_buf())
            .cache_limit(cache_limit)
            .build();
        let db = Arc::new(Database::new(&config));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?.to_string();

        let task = tokio::spawn(run(listener, db));

        Ok(Self {
            addr,
            _temp_dir: temp_dir,
            task,
        })
    }

    /// The address clients should dial — a fresh connection per statement.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(listener: TcpListener, db: Arc<Database>) {
    loop {
        let (socket, _) = match listener.accept().await {
            Ok(pair) => pair,
            Err(_) => return,
        };
        let db = db.clone();
        tokio::spawn(async move {
            let _ = handle_client(socket, &db).await;
        });
    }
}

async fn handle_client(socket: TcpStream, db: &Database) -> std::io::Result<()> {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);

    let Some(sql) = frame::read_line(&mut reader).await? else {
        return Ok(());
    };
    let response = match db.execute(&sql) {
        Ok(text) => text,
        Err(e) => e.to_string(),
    };
    frame::write_line(&mut write_half, &response).await
}
