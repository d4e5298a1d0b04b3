//! tron-balances — TRX + USDT balance sweeper for TRON addresses.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod proxy;
pub mod http;
pub mod explorer;
pub mod engine;
pub mod storage;
