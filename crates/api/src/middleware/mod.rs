//! HTTP middleware for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, error capture)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID (fills the span field, echoes the header)
//! 4. CORS and compression
//! 5. Per-route gate (role checks on guarded methods only)

pub mod gate;
pub mod request_id;

pub use gate::{Access, CurrentUser, EMPLOYEE, Gate, GateRejection, MANAGER, authorize, guard};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
