//! TCP server for the toy SQL database.
//!
//! Accepts one connection at a time conceptually but handles each on its
//! own task; each connection reads one SQL statement, evaluates it against
//! the shared [`Database`], writes back one line, and closes — per §5/§6.1.
//! No flags: the server always binds the address baked into [`Config`]'s
//! defaults (`127.0.0.1:2000`).

use anyhow::Result;
use common::Config;
use database::Database;
use protocol::frame;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::default();
    let db = Arc::new(Database::new(&config));

    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {addr}, data dir {:?}", config.data_dir);

    let accept_loop = tokio::spawn(run(listener, db));

    signal::ctrl_c().await?;
    println!("shutdown signal received");
    accept_loop.abort();

    Ok(())
}

async fn run(listener: TcpListener, db: Arc<Database>) {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                println!("connection accepted: {peer}");
                let db = db.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(socket, &db).await {
                        eprintln!("connection {peer} error: {e}");
                    }
                    println!("connection closed: {peer}");
                });
            }
            Err(e) => eprintln!("accept failed: {e}"),
        }
    }
}

/// Read one statement, evaluate it, write one response, and return — the
/// caller closes the socket by dropping it.
async fn handle_client(socket: TcpStream, db: &Database) -> Result<()> {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);

    let Some(sql) = frame::read_line(&mut reader).await? else {
        return Ok(());
    };
    println!("statement: {sql}");

    let response = match db.execute(&sql) {
        Ok(text) => text,
        Err(e) => e.to_string(),
    };
    frame::write_line(&mut write_half, &response).await?;
    Ok(())
}
