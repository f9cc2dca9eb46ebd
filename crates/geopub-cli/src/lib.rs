//! geopub CLI - command-line interface for the catalog pipeline
//!
//! This crate provides the CLI application that ties together catalog
//! loading, map artifact generation and the full-text index.

pub mod config;

pub use config::{Command, Config};
