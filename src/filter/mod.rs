//! User-agent denylist filter.
//!
//! # Data Flow
//! ```text
//! Request (headers, uri, extensions)
//!     → layer.rs (UserAgentBlock service: read User-Agent header)
//!     → agent::AgentResolver (raw header → canonical name)
//!     → denylist.rs (O(1) membership test on the current snapshot)
//!     → Reject: observer.rs (one diagnostic) + 403, empty body
//!     → Forward: inner service, request untouched
//! ```
//!
//! # Design Decisions
//! - Construction fails only when the configuration is absent; an empty
//!   denylist is valid and forwards everything
//! - The denylist is an immutable snapshot behind `ArcSwap`; reloads publish
//!   a new snapshot, requests never lock
//! - No runtime errors: the service error type is the inner service's

pub mod denylist;
pub mod error;
pub mod layer;
pub mod observer;

pub use denylist::{Denylist, DenylistHandle};
pub use error::ConfigurationError;
pub use layer::{Decision, UserAgentBlock, UserAgentBlockLayer};
pub use observer::{BlockEvent, BlockObserver, TracingObserver};
