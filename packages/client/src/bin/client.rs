//! Terminal chat client for the Tsuyaku relay.
//!
//! Joins a room, sends each entered line as a message and prints incoming
//! messages in the chosen language next to the original. Reconnects with
//! exponential backoff. A rejected first join (invalid request or duplicate client
//! id) exits immediately; a duplicate id on a reconnect rejoins under a new id.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsuyaku-client -- --username Alice --language en
//! cargo run --bin tsuyaku-client -- -r <room_id> -n Dana -l he
//! ```

use clap::Parser;
use tsuyaku_client::{ClientSettings, run_client};
use tsuyaku_server::domain::Language;
use tsuyaku_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tsuyaku-client")]
#[command(about = "Terminal client for the multilingual chat relay", long_about = None)]
struct Args {
    /// Relay server URL
    #[arg(short = 'u', long, env = "TSUYAKU_URL", default_value = "ws://127.0.0.1:8000")]
    url: String,

    /// Room to join (a new room is created when omitted)
    #[arg(short = 'r', long)]
    room: Option<String>,

    /// Display name shown to other participants
    #[arg(short = 'n', long)]
    username: String,

    /// Language to read messages in (e.g. en, he, ja)
    #[arg(short = 'l', long, value_parser = parse_language)]
    language: Language,

    /// Client ID (must be unique; generated when omitted)
    #[arg(short = 'c', long)]
    client_id: Option<String>,
}

fn parse_language(value: &str) -> Result<Language, String> {
    value.parse::<Language>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let settings = ClientSettings {
        url: args.url,
        room_id: args.room,
        client_id: args
            .client_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        username: args.username,
        language: args.language,
    };

    // Run the client
    if let Err(e) = run_client(settings).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
