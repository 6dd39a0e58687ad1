//! End-to-End Integration Tests
//!
//! These tests start the provider server on a loopback port and drive it
//! over HTTP.

mod common;
mod auth_flows;
mod file_store;
mod logout;
mod registration;
mod token_operations;
