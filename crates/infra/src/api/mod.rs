//! Client for the case-management REST API
//!
//! This module mediates every call to the remote resource API while keeping
//! the stored session valid.
//!
//! # Architecture
//!
//! - Uses the crate's `HttpClient` (no direct reqwest client construction)
//! - Bearer token read from the injected `SessionStore` on every send
//! - One refresh-and-retry per request on 401, single-flight across requests
//! - Session lifecycle published as `SessionEvent`s instead of navigation

mod auth;
pub mod client;
pub mod errors;
pub mod events;
pub mod request;
pub mod resources;
pub mod uploads;

pub use client::{Deleted, SessionClient, SessionClientBuilder};
pub use errors::{ApiError, ApiErrorCategory};
pub use events::SessionEvent;
pub use request::{instance_path, ApiRequest, RequestBody};
pub use resources::Resource;
pub use uploads::{
    file_extension, media_url, unique_file_name, validate_image, validate_pdf, MultipartBody,
    UploadError, UploadFile, UploadPolicy,
};
