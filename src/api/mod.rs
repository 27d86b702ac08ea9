//! Tally API Server module
//!
//! Provides the reports over HTTP. Run with `tally-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
