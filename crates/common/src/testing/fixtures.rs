//! Test fixture generators

use casefile_domain::{CurrentUser, Session};
use serde_json::json;

/// User record shaped like the API's `UsuarioSerializer` output.
#[must_use]
pub fn sample_user(username: &str) -> CurrentUser {
    let mut user = CurrentUser::new(username);
    user.id = Some(1);
    user.email = Some(format!("{username}@example.org"));
    user.role = Some("admin".to_string());
    user.extra.insert("sede".to_string(), json!("San José"));
    user
}

/// Full session for `username` with the given tokens.
#[must_use]
pub fn sample_session(username: &str, access: &str, refresh: &str) -> Session {
    Session::new(access, refresh, sample_user(username))
}
