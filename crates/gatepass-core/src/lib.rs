//! Core types and trait definitions for the gatepass visitor log.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage, authentication and transport live in the other crates and plug in
//! through the traits in [`store`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod live;
pub mod metrics;
pub mod profile;
pub mod settings;
pub mod store;
pub mod visit;

pub use error::{Error, Result};
