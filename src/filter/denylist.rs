//! Denylist storage and atomic replacement.

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::{FilterConfig, MatchPolicy};
use crate::filter::ConfigurationError;
use crate::observability::metrics;

/// Set of canonical agent names to reject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Denylist {
    names: HashSet<String>,
    policy: MatchPolicy,
}

impl Denylist {
    /// Build a denylist. Duplicates collapse; under
    /// `MatchPolicy::IgnoreAsciiCase` names are stored lowercased.
    pub fn new<I, S>(names: I, policy: MatchPolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| normalize(name.as_ref(), policy))
            .collect();
        Self { names, policy }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(&config.user_agents, config.match_policy)
    }

    /// True if `agent` is blocked under this list's policy.
    pub fn contains(&self, agent: &str) -> bool {
        match self.policy {
            MatchPolicy::Exact => self.names.contains(agent),
            MatchPolicy::IgnoreAsciiCase => self.names.contains(&agent.to_ascii_lowercase()),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Stored names, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

fn normalize(name: &str, policy: MatchPolicy) -> String {
    match policy {
        MatchPolicy::Exact => name.to_string(),
        MatchPolicy::IgnoreAsciiCase => name.to_ascii_lowercase(),
    }
}

/// Shared handle to a filter's live denylist.
///
/// Cloned handles point at the same snapshot slot. Readers load an
/// immutable snapshot per request; `replace` publishes a new one atomically.
#[derive(Debug, Clone)]
pub struct DenylistHandle {
    current: Arc<ArcSwap<Denylist>>,
}

impl DenylistHandle {
    pub fn new(denylist: Denylist) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(denylist)),
        }
    }

    /// Current snapshot.
    pub fn load(&self) -> Arc<Denylist> {
        self.current.load_full()
    }

    /// Publish a new denylist. In-flight requests keep the snapshot they
    /// already loaded.
    pub fn replace(&self, denylist: Denylist) {
        metrics::record_denylist_size(denylist.len());
        self.current.store(Arc::new(denylist));
    }

    /// Rebuild from configuration. A missing configuration is rejected and
    /// the current snapshot is kept.
    pub fn reload(&self, config: Option<&FilterConfig>) -> Result<(), ConfigurationError> {
        let config = config.ok_or(ConfigurationError::Missing)?;
        let denylist = Denylist::from_config(config);

        tracing::info!(
            agents = denylist.len(),
            policy = ?denylist.policy(),
            "Denylist reloaded"
        );
        self.replace(denylist);
        Ok(())
    }

    pub(crate) fn contains(&self, agent: &str) -> bool {
        self.current.load().contains(agent)
    }
}
