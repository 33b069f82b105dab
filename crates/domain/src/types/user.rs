//! Current user record
//!
//! The API serialises users with a handful of stable fields; everything else
//! is carried through untouched so the UI can read it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User record stored alongside the token pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role name (`rol` on the wire)
    #[serde(default, rename = "rol", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Remaining fields (`sede`, `nombre_completo`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CurrentUser {
    /// Minimal user with only a username.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self { id: None, username: username.into(), email: None, role: None, extra: Map::new() }
    }

    /// Look up a field that has no dedicated struct member.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}
