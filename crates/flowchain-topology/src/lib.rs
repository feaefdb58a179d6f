//! flowchain-topology - the static Function Pool / Function catalog.
//!
//! Everything in this crate is built once at startup from the JSON
//! config file and is immutable for the lifetime of the process; the
//! only mutable state in the controller lives in the RIB
//! (`flowchain-core::rib::Rib`).

#![warn(missing_docs)]

pub mod addr;
pub mod config;
pub mod function;

pub use addr::{ip_version, validate_prefix, IpVersion};
pub use config::load_config;
pub use function::{Function, FunctionPool, FunctionPools};
