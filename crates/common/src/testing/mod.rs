//! Testing utilities and helpers
//!
//! - **[`fixtures`]**: ready-made users and sessions
//! - **[`mocks`]**: store doubles that record or fail calls

pub mod fixtures;
pub mod mocks;

pub use fixtures::{sample_session, sample_user};
pub use mocks::{FailingSessionStore, RecordingSessionStore};
