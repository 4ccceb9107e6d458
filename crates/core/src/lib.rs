//! Sprout Core - Shared types library.
//!
//! This crate provides common types used across all Sprout components:
//! - `client` - Storefront client SDK (state containers + API transport)
//! - `cli` - Command-line shell over the client SDK
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
