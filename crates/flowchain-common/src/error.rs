//! Error types for the flowchain controller

use thiserror::Error;

/// flowchain error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed address literal or out-of-range mask
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    /// Original and NATed prefixes differ in address family
    #[error("address family mismatch between '{prefix}' and '{prefix_natted}'")]
    AddressFamilyMismatch {
        /// Original prefix
        prefix: String,
        /// Post-NAT prefix
        prefix_natted: String,
    },

    /// `start` does not resolve to a user VRF RD
    #[error("unknown user VRF: {0}")]
    UnknownUserVrf(String),

    /// A chain entry does not resolve to a Function
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// No inter-FP RD exists between two pools on the required slice
    #[error("missing inter-fp rd from {from} to {to} (slice={slice})")]
    MissingInterFpRd {
        /// Source pool name
        from: String,
        /// Destination pool name
        to: String,
        /// Slice that was consulted
        slice: String,
    },

    /// Chain contains a repeated Function name
    #[error("loop detected in chain: {0}")]
    LoopInChain(String),

    /// A flow with this prefix (or natted prefix) is already installed
    #[error("duplicate prefix: {0}")]
    DuplicatePrefix(String),

    /// Config load found a duplicate Function or inter-FP RD entry
    #[error("duplicate catalog entry: {0}")]
    DuplicateCatalogEntry(String),

    /// Config file could not be read
    #[error("io error: {0}")]
    Io(String),

    /// Config file could not be parsed into the expected shape
    #[error("config error: {0}")]
    Config(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Result type for the flowchain controller
pub type Result<T> = std::result::Result<T, Error>;
