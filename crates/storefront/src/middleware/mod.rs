//! HTTP middleware for the storefront.
//!
//! # Order (outermost first)
//!
//! 1. Sentry hub and transaction layers
//! 2. `TraceLayer`, one `http_request` span per request
//! 3. Request id, recorded on that span
//! 4. Per-session request serialization, keyed by the session cookie
//! 5. Session layer (in-memory store)
//! 6. Per-IP rate limiting on the checkout routes only

pub mod rate_limit;
pub mod request_id;
pub mod session;
pub mod session_lock;

pub use rate_limit::checkout_rate_limiter;
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
pub use session_lock::serialize_session_requests;
