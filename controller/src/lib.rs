//! fillsplit-controller: periodic driver for fillsplit allocation cycles.
//!
//! Simulated feeders publish account splits and trade fills, a cycle
//! driver turns the latest of each into a new position per ticker, and
//! every cycle lands in a JSONL audit trail.

pub mod audit;
pub mod config;
pub mod error;
pub mod feed;
pub mod runner;
pub mod sink;
