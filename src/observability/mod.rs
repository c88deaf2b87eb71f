//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! filter + host produce:
//!     → logging.rs (subscriber setup; events come from `tracing` macros)
//!     → metrics.rs (decision counters, denylist gauge, upstream latency)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (filter, agent, uri, request_id)
//! - Metric calls are no-ops until a recorder is installed, so the library
//!   never requires the exporter

pub mod logging;
pub mod metrics;
