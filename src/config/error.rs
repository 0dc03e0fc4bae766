//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A collaborator endpoint could not be parsed as a URL.
    #[error("invalid URL for {name} '{value}': {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A collaborator endpoint parsed but is not plain HTTP(S).
    #[error("unsupported scheme '{scheme}' for {name}: expected http or https")]
    UnsupportedScheme { name: &'static str, scheme: String },

    /// A numeric setting could not be parsed.
    #[error("failed to parse {name} '{value}': {source}")]
    NumberParseError {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// A numeric setting must be strictly positive.
    #[error("invalid {name}: must be greater than zero")]
    MustBePositive { name: &'static str },

    /// A boolean flag had an unrecognized value.
    #[error("invalid boolean for {name} '{value}': expected true/false/1/0")]
    InvalidBool { name: &'static str, value: String },
}
