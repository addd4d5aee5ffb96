//! # GhostVenom - Host-Based Security Scanning Helper
//!
//! A small security-scanning helper implemented in Rust. It determines a
//! target address, drives an external nmap process with privilege-aware
//! fallback, conservatively parses the textual scan output, renders a plain
//! text report and collects local system metadata. Scan results can
//! optionally be forwarded to a language model for a qualitative risk
//! summary.
//!
//! ## Architecture
//!
//! - **Scan execution** (`scanner`): subprocess wrapper that always returns
//!   text, with a fixed three-step privilege fallback ladder for SYN scans
//! - **Result parsing and reporting** (`report`): conservative line-based
//!   port extraction and a fixed-format text report
//! - **Collaborators**: configuration, localized console messages, LLM
//!   analysis, system metadata, peer/gateway resolution and a plug-and-play
//!   autoscan flow

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod i18n;
pub mod logging;

// Core scan pipeline
pub mod report;
pub mod scanner;

// Collaborators
pub mod analysis;
pub mod autoscan;
pub mod connectivity;
pub mod network;
pub mod system_info;

// Re-exports for convenience
pub use crate::{
    config::AppConfig,
    core::Application,
    error::{GhostVenomError, Result},
};
