//! Ticker Watch
//!
//! Correlates a price stream with LLM-classified news sentiment per instrument
//! and raises alerts on large price moves, subject to a per-ticker cooldown.

pub mod config;
pub mod error;
pub mod ingester;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod processor;
pub mod state;
pub mod trigger;
pub mod types;
