//! User-agent resolution subsystem.
//!
//! # Data Flow
//! ```text
//! raw User-Agent header
//!     → woothee (canonical browser/crawler names from its agent dataset)
//!     → isbot (crawler patterns, sets the bot flag)
//!     → fallback (first bot-flagged product token, then first product token)
//!     → ResolvedAgent { name, version, bot }
//! ```
//!
//! # Design Decisions
//! - Resolution is total: every input yields a name, possibly empty
//! - Parsing is left to woothee and isbot; this module only picks the name
//! - The filter only depends on the `AgentResolver` trait, so the default
//!   resolver can be replaced without touching decision logic

pub mod resolver;

pub use resolver::{AgentResolver, ResolvedAgent, SignatureResolver};
