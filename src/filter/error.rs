use thiserror::Error;

/// Raised when a filter is built without any user-agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("no user agent configuration provided")]
    Missing,
}
