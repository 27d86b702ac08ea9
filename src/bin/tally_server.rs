//! Tally API Server binary
//!
//! HTTP REST API for the items, ledger and visits reports.

use clap::Parser;
use royalbit_tally::api::{run_api_server, ApiConfig};

#[derive(Parser, Debug)]
#[command(name = "tally-server")]
#[command(version)]
#[command(author = "RoyalBit Inc. <admin@royalbit.ca>")]
#[command(about = "Tally API Server - HTTP REST API for spreadsheet sales reports")]
#[command(long_about = r#"
Tally API Server - HTTP REST API

Report endpoints (JSON bodies with workbook paths on the server):
  - POST /api/v1/items   - Classify items and pivot yearly totals
  - POST /api/v1/ledger  - Compare two customer ledgers
  - POST /api/v1/visits  - Summarize visit sheets and the operation log

Additional endpoints:
  - GET  /health         - Health check
  - GET  /version        - Server version info
  - GET  /               - API documentation

Example usage:
  tally-server                           # Start on localhost:8080
  tally-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/ledger \
    -H "Content-Type: application/json" \
    -d '{"prior_path": "2023.xlsx", "current_path": "2024.xlsx",
         "helper_path": "helper.xlsx", "sort": "worst"}'

Logging: TALLY_LOG or RUST_LOG (default info)
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "TALLY_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "TALLY_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_api_server(config).await
}
