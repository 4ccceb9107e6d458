//! CLI command implementations, one module per subcommand group.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod orders;
