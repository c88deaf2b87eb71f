//! Diagnostics for rejected requests.

use std::fmt;

use http::Uri;

/// Record describing one rejected request.
#[derive(Debug, Clone, Copy)]
pub struct BlockEvent<'a> {
    /// Name of the filter instance that rejected the request.
    pub filter: &'a str,
    pub uri: &'a Uri,
    /// Resolved agent name that matched the denylist.
    pub agent: &'a str,
    pub request_id: Option<&'a str>,
}

impl fmt::Display for BlockEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} : {} - access denied - user agent is blocked: {}",
            self.filter, self.uri, self.agent
        )
    }
}

/// Receives one event per rejected request.
///
/// Observers cannot influence the decision; the 403 is produced regardless
/// of what the observer does with the event. Implementations should not
/// panic: a panic is caught and logged by the filter, but the event is lost.
pub trait BlockObserver: Send + Sync {
    fn on_block(&self, event: &BlockEvent<'_>);
}

/// Default observer: a `warn` level tracing event with structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl BlockObserver for TracingObserver {
    fn on_block(&self, event: &BlockEvent<'_>) {
        tracing::warn!(
            filter = %event.filter,
            uri = %event.uri,
            agent = %event.agent,
            request_id = event.request_id.unwrap_or("-"),
            "{}",
            event
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_message() {
        let uri: Uri = "/foobar?q=1".parse().unwrap();
        let event = BlockEvent {
            filter: "userAgentBlocker",
            uri: &uri,
            agent: "Googlebot",
            request_id: None,
        };
        assert_eq!(
            event.to_string(),
            "userAgentBlocker : /foobar?q=1 - access denied - user agent is blocked: Googlebot"
        );
    }
}
