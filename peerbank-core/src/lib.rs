//! PeerBank Core: domain types, configuration, remote client and dataset cache.
//!
//! This crate holds everything below the metrics pipeline:
//! - Roster, reporting window, raw records and the typed field table
//! - The raw dataset and its key-set invariant
//! - Pipeline configuration (TOML)
//! - The FDIC client behind the `FinancialSource` trait
//! - The window-keyed JSON dataset cache
//! - Seed derivation for synthesized data

pub mod config;
pub mod data;
pub mod domain;
pub mod rng;
