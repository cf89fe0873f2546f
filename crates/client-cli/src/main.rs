//! Interactive line client for the toy SQL database.
//!
//! Takes `host` and `port` positional arguments and reads statements from
//! standard input, one per line, printing each response before reading the
//! next — a fresh connection per statement, per §6.1/§6.4.

use anyhow::{bail, Result};
use client::Client;
use std::io::{self, BufRead, Write};

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(host), Some(port)) = (args.next(), args.next()) else {
        bail!("usage: toydb-client <host> <port>");
    };
    let addr = format!("{host}:{port}");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let sql = line.trim();
        if sql.is_empty() {
            continue;
        }

        match Client::connect(&addr).await {
            Ok(client) => match client.execute(sql).await {
                Ok(response) => println!("{response}"),
                Err(e) => println!("{e}"),
            },
            Err(_) => println!("Connect failed."),
        }
        io::stdout().flush()?;
    }

    Ok(())
}
