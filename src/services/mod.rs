//! Per-resource REST wrappers.
//!
//! ARCHITECTURE
//! ============
//! Each service owns a cloned `HttpClient` and maps one backend resource to
//! typed calls. Services hold no state and never toast; stores decide how
//! failures surface.

pub mod admin;
pub mod auth;
pub mod carbon;
pub mod chat;
pub mod courses;
pub mod knowledge;
pub mod library;
pub mod news;
pub mod organizations;

/// Ignore whatever body a write endpoint returns.
pub(crate) type Ignored = serde::de::IgnoredAny;

/// `/base/{id}` with the id percent-encoded as a single path segment.
pub(crate) fn item_path(base: &str, id: &str) -> String {
    format!("{base}/{}", urlencoding::encode(id))
}
