//! flowchain-common - shared error types for the flowchain controller
//!
//! This crate has no dependency on the topology model, the compiler, or
//! axum; it exists purely so `flowchain-topology`, `flowchain-core` and
//! `flowchain-gateway` can share one error type and one notion of a
//! Route Distinguisher / DSCP value without a dependency cycle.

#![warn(missing_docs)]

pub mod error;

pub use error::{Error, Result};

/// A BGP Route Distinguisher, as carried verbatim in FlowSpec route text.
///
/// Deliberately a thin wrapper rather than a validated value object: the
/// controller never parses an RD, it only plumbs the string from config
/// through to the route literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Rd(pub String);

impl std::fmt::Display for Rd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Rd {
    fn from(s: String) -> Self {
        Rd(s)
    }
}

impl From<&str> for Rd {
    fn from(s: &str) -> Self {
        Rd(s.to_string())
    }
}

/// A DSCP "mark" value used to tag inter-FP transit traffic.
pub type Dscp = u8;

/// Routing slice: pre-NAT traffic uses `Private`, post-NAT traffic uses `Global`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slice {
    /// Carries post-NAT (or NAT-free) traffic between pools.
    Global,
    /// Carries pre-NAT traffic between pools.
    Private,
}

impl std::fmt::Display for Slice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slice::Global => write!(f, "global"),
            Slice::Private => write!(f, "private"),
        }
    }
}

impl Slice {
    /// Map the `is_private` boolean used throughout the compiler onto a `Slice`.
    pub fn from_is_private(is_private: bool) -> Self {
        if is_private {
            Slice::Private
        } else {
            Slice::Global
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rd_display_roundtrips_the_string() {
        let rd: Rd = "65000:100".into();
        assert_eq!(rd.to_string(), "65000:100");
    }

    #[test]
    fn slice_from_is_private() {
        assert_eq!(Slice::from_is_private(true), Slice::Private);
        assert_eq!(Slice::from_is_private(false), Slice::Global);
    }
}
