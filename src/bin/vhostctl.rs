//! Operator CLI for virtual-host configuration.
//!
//! The gateway has no admin API of its own: routing is configured by
//! writing `goydb.vhost:*` documents into the admin database through the
//! database's regular HTTP API. This tool wraps those document edits.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use vhost_gateway::vhost::{ADMIN_DATABASE, DOCUMENT_PREFIX};

#[derive(Parser)]
#[command(name = "vhostctl")]
#[command(about = "Manage virtual-host documents in the admin database", long_about = None)]
struct Cli {
    /// Base URL of the document database API.
    #[arg(short, long, default_value = "http://localhost:5984")]
    url: String,

    /// Admin database holding the vhost documents.
    #[arg(short, long, default_value = ADMIN_DATABASE)]
    database: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all virtual-host documents
    List,
    /// Show one virtual-host document
    Get {
        /// Name of the vhost (document id without the prefix)
        name: String,
    },
    /// Create or update a virtual-host document from a JSON file
    Set {
        name: String,
        /// File containing the document body (domains, proxy, static)
        file: PathBuf,
    },
    /// Delete a virtual-host document
    Delete {
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::List => {
            let (start, end) = list_key_range();
            let res = client
                .get(format!("{}/{}/_all_docs", cli.url, cli.database))
                .query(&[
                    ("include_docs", "true"),
                    ("start_key", start.as_str()),
                    ("end_key", end.as_str()),
                ])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Get { name } => {
            let res = client
                .get(document_url(&cli.url, &cli.database, &name))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Set { name, file } => {
            let mut body: Value = serde_json::from_str(&std::fs::read_to_string(&file)?)?;

            // Updates need the current revision.
            if let Some(rev) = fetch_revision(&client, &cli.url, &cli.database, &name).await? {
                body["_rev"] = Value::String(rev);
            }

            let res = client
                .put(document_url(&cli.url, &cli.database, &name))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Delete { name } => {
            let Some(rev) = fetch_revision(&client, &cli.url, &cli.database, &name).await? else {
                eprintln!("Error: vhost {name:?} does not exist");
                return Ok(());
            };
            let res = client
                .delete(document_url(&cli.url, &cli.database, &name))
                .query(&[("rev", rev)])
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn document_url(base: &str, database: &str, name: &str) -> String {
    format!("{base}/{database}/{DOCUMENT_PREFIX}{name}")
}

/// JSON-encoded `_all_docs` bounds covering exactly the vhost documents.
fn list_key_range() -> (String, String) {
    (
        format!("\"{DOCUMENT_PREFIX}\""),
        format!("\"{DOCUMENT_PREFIX}\u{ffff}\""),
    )
}

async fn fetch_revision(
    client: &reqwest::Client,
    url: &str,
    database: &str,
    name: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let res = client
        .get(document_url(url, database, name))
        .send()
        .await?;
    if !res.status().is_success() {
        return Ok(None);
    }
    let doc: Value = res.json().await?;
    Ok(doc
        .get("_rev")
        .and_then(Value::as_str)
        .map(str::to_string))
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: database answered {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
