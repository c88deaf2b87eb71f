//! User-agent denylist filter for tower/axum stacks.
//!
//! The core is [`filter::UserAgentBlockLayer`]: it resolves each request's
//! `User-Agent` header to a canonical agent name and answers `403 Forbidden`
//! when that name is denylisted, otherwise it calls the inner service
//! untouched.
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use ua_blocker::{FilterConfig, UserAgentBlockLayer};
//!
//! # fn build() -> Result<Router, ua_blocker::filter::ConfigurationError> {
//! let config = FilterConfig::new(["SpamBot", "Googlebot"]);
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .layer(UserAgentBlockLayer::new(Some(&config), "userAgentBlocker")?);
//! # Ok(app)
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod filter;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use agent::{AgentResolver, ResolvedAgent, SignatureResolver};
pub use config::{AppConfig, FilterConfig, MatchPolicy};
pub use filter::{Decision, Denylist, DenylistHandle, UserAgentBlock, UserAgentBlockLayer};
pub use crate::http::HttpServer;
pub use lifecycle::Shutdown;
