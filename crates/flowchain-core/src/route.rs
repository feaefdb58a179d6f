//! Route literal assembly.
//!
//! A [`RouteLine`] is an opaque, fully-formed FlowSpec route with a
//! placeholder verb; [`RouteLine::render`] substitutes `announce` or
//! `withdraw` at emit time, so the two only ever differ by that one word.

use std::fmt;

use flowchain_common::{Dscp, Rd};

const VERB_PLACEHOLDER: &str = "UPDATE";

/// Which field of the match clause a route constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDirection {
    /// Egress hop: matches on source prefix.
    Source,
    /// Ingress hop: matches on destination prefix.
    Destination,
}

impl fmt::Display for MatchDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchDirection::Source => write!(f, "source"),
            MatchDirection::Destination => write!(f, "destination"),
        }
    }
}

/// A single line of FlowSpec route text, stored with an `UPDATE` verb
/// placeholder until it is announced or withdrawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLine(String);

impl RouteLine {
    /// Render this route with `announce` substituted for the verb placeholder.
    pub fn announce_text(&self) -> String {
        self.0.replace(VERB_PLACEHOLDER, "announce")
    }

    /// Render this route with `withdraw` substituted for the verb placeholder.
    pub fn withdraw_text(&self) -> String {
        self.0.replace(VERB_PLACEHOLDER, "withdraw")
    }

    /// The raw stored text, placeholder and all. Exposed for `/show/flow/extensive`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Build a per-flow hop route: carries an RD, a self-targeting
/// extended-community, the owning pool's community, an optional DSCP
/// mark, and a redirect. Used for Step 1 and Step 2 of the compiler.
#[allow(clippy::too_many_arguments)]
pub fn hop_route(
    neighbor: &str,
    rd: &Rd,
    direction: MatchDirection,
    prefix: &str,
    community: &str,
    mark: Option<Dscp>,
    redirect: &Rd,
) -> RouteLine {
    let mark_clause = match mark {
        Some(dscp) => format!(" mark {dscp};"),
        None => String::new(),
    };
    RouteLine(format!(
        "neighbor {neighbor} {VERB_PLACEHOLDER} flow route {{ rd {rd}; \
         match {{ {direction} {prefix}; }} then {{ community [{community}]; \
         extended-community target:{rd};{mark_clause} redirect {redirect}; }} }}"
    ))
}

/// Build a Step-4 fan-in route: destination-matched, no RD/extended-community
/// (the original controller never attached one to this step; see DESIGN.md).
pub fn fanin_route(neighbor: &str, prefix: &str, community: &str, mark: Option<Dscp>, redirect: &Rd) -> RouteLine {
    let mark_clause = match mark {
        Some(dscp) => format!(" mark {dscp};"),
        None => String::new(),
    };
    RouteLine(format!(
        "neighbor {neighbor} {VERB_PLACEHOLDER} flow route {{ match {{ destination {prefix}; }} \
         then {{ community [{community}]; {mark_clause} redirect {redirect}; }} }}"
    ))
}

/// Build a bootstrap TOS route: destination `any`, matched additionally by
/// DSCP, with an RD and self-targeting extended-community. Emitted directly
/// as `announce` (never withdrawn, never stored in the RIB).
pub fn tos_route(neighbor: &str, rd: &Rd, any_prefix: &str, dscp: Dscp, community: &str, redirect: &Rd) -> String {
    format!(
        "neighbor {neighbor} announce flow route {{ rd {rd}; \
         match {{ destination {any_prefix}; dscp {dscp}; }} then {{ community [{community}]; \
         extended-community target:{rd}; redirect {redirect}; }} }}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announce_and_withdraw_differ_only_by_verb() {
        let rd: Rd = "65000:1".into();
        let redirect: Rd = "65000:2".into();
        let route = hop_route("n1", &rd, MatchDirection::Source, "10.0.0.0/8", "65000:1", Some(7), &redirect);

        let announce = route.announce_text();
        let withdraw = route.withdraw_text();
        assert_ne!(announce, withdraw);
        assert_eq!(announce.replace("announce", "X"), withdraw.replace("withdraw", "X"));
    }

    #[test]
    fn mark_clause_omitted_when_absent() {
        let rd: Rd = "65000:1".into();
        let route = hop_route("n1", &rd, MatchDirection::Source, "10.0.0.0/8", "65000:1", None, &rd);
        assert!(!route.as_str().contains("mark"));
    }
}
