//! Integration tests for snowglass-warehouse crate.
//!
//! These tests drive the client through an in-memory driver and never contact
//! a real warehouse.

mod client;
mod config;
