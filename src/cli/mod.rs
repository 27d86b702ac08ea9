//! CLI command handlers

pub mod commands;

pub use commands::{items, ledger, visits, LedgerView, OutputOptions};
