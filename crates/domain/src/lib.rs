//! # Casefile Domain
//!
//! Domain types shared by the Casefile session client.
//!
//! This crate contains:
//! - Session state (`Session`, `CurrentUser`)
//! - Authentication wire payloads (login, refresh, registration)
//! - Configuration structures
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other Casefile crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
