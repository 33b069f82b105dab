//! Shared building blocks for the Casefile session client.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - default: the `SessionStore` abstraction and the in-memory store
//! - `platform`: keychain-backed store (keyring)
//! - `test-utils`: recording and failing store doubles

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod session;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "platform")]
pub use session::KeychainSessionStore;
pub use session::{MemorySessionStore, SessionSlot, SessionStore, StoreError};
