//! The flow compiler and the in-memory Routing Information Base.
//!
//! This crate is the core described in spec §1: it owns nothing about
//! HTTP, JSON config files, or how routes physically reach exabgp
//! beyond the narrow [`speaker::SpeakerChannel`] seam. The REST frontend,
//! the config loader, and log-sink setup are external collaborators
//! wired up by `flowchain-gateway`.

pub mod flow;
pub mod rib;
pub mod route;
pub mod speaker;
pub mod tos;

pub use flow::{ExabgpRoutes, Flow, FlowJson};
pub use rib::Rib;
pub use route::{MatchDirection, RouteLine};
pub use speaker::{RecordingSpeaker, SpeakerChannel, StdoutSpeaker};
pub use tos::generate_tos_flows;
