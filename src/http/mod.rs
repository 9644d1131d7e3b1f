//! Authenticated HTTP layer.
//!
//! DESIGN
//! ======
//! `HttpClient` attaches the stored access token to every request and, on a
//! first 401, runs a single-flight refresh: one caller performs
//! `POST /auth/refresh` while every other caller that hits 401 meanwhile
//! parks on a oneshot waiter and is woken with the outcome.
//!
//! ERROR HANDLING
//! ==============
//! Refresh failure (missing refresh token, rejected refresh, network error on
//! refresh) clears stored credentials, publishes `SessionEvent::LoggedOut`,
//! and rejects the original request plus all waiters with
//! `ApiError::SessionExpired`. A request is retried at most once.

mod client;
mod transport;

pub use client::{HttpClient, REFRESH_PATH, SessionEvent};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
