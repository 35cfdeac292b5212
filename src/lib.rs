//! Indian music market-intelligence pipeline - shared modules for the CLI.

pub mod classify;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod models;
pub mod profile;
pub mod progress;
pub mod safety;
