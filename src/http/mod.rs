//! HTTP host subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → TraceLayer → TimeoutLayer → request_id.rs (x-request-id)
//!     → filter::UserAgentBlockLayer (403 or pass)
//!     → proxy_handler (forward to upstream)
//!     → Send to client
//! ```

pub mod request_id;
pub mod server;

pub use request_id::UuidRequestId;
pub use server::{HttpServer, ServerError};
