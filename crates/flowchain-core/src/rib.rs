//! The in-memory Routing Information Base: the sole mutable state of the
//! controller (spec §4.6/§5). Holds the compiled [`Flow`]s and the
//! immutable topology they were compiled against, and mediates every
//! add/delete/override so uniqueness and announce/withdraw stay atomic
//! with the check that triggered them.

use flowchain_common::{Error, Result};
use flowchain_topology::FunctionPools;

use crate::flow::Flow;
use crate::speaker::SpeakerChannel;

/// Owns the installed flows and the topology they were validated
/// against. Callers are expected to guard a single `Rib` behind one
/// exclusive lock (`parking_lot::Mutex` in the gateway binary); every
/// method here takes `&mut self` so the borrow checker enforces that
/// externally.
pub struct Rib {
    fps: FunctionPools,
    flows: Vec<Flow>,
}

impl Rib {
    /// Start an empty RIB over the given (already-loaded) topology.
    pub fn new(fps: FunctionPools) -> Self {
        Self { fps, flows: Vec::new() }
    }

    /// The topology this RIB validates and compiles flows against.
    pub fn topology(&self) -> &FunctionPools {
        &self.fps
    }

    /// Every installed flow, in insertion order.
    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    fn collides(&self, flow: &Flow) -> Option<usize> {
        self.flows.iter().position(|existing| {
            existing.prefix == flow.prefix
                || Some(&existing.prefix) == flow.prefix_natted.as_ref()
                || existing.prefix_natted.as_deref() == Some(flow.prefix.as_str())
                || (flow.prefix_natted.is_some() && existing.prefix_natted == flow.prefix_natted)
        })
    }

    /// Find the installed flow whose `prefix` or `prefix_natted` equals
    /// `prefix`.
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&Flow> {
        self.flows
            .iter()
            .find(|f| f.prefix == prefix || f.prefix_natted.as_deref() == Some(prefix))
    }

    /// Validate, check uniqueness, compile, install, and announce.
    ///
    /// No mutation and no I/O happen unless every step up to (and
    /// including) `encode` succeeds.
    pub fn add(&mut self, mut flow: Flow, speaker: &dyn SpeakerChannel) -> Result<()> {
        flow.validate(&self.fps)?;
        if let Some(idx) = self.collides(&flow) {
            let existing = &self.flows[idx];
            return Err(Error::DuplicatePrefix(format!(
                "prefix {} (natted {:?}) collides with installed flow {} (natted {:?})",
                flow.prefix, flow.prefix_natted, existing.prefix, existing.prefix_natted
            )));
        }
        flow.encode(&self.fps)?;
        flow.announce(speaker);
        self.flows.push(flow);
        Ok(())
    }

    /// Withdraw and remove the flow at `prefix`. A no-op (not an error)
    /// if no flow matches, matching callers that always resolve the
    /// target via [`Rib::find_by_prefix`] first.
    pub fn delete(&mut self, prefix: &str, speaker: &dyn SpeakerChannel) {
        if let Some(idx) = self.flows.iter().position(|f| f.prefix == prefix || f.prefix_natted.as_deref() == Some(prefix)) {
            let removed = self.flows.remove(idx);
            removed.withdraw(speaker);
        }
    }

    /// Atomically replace any colliding flow with `flow`: validate the
    /// new flow, withdraw+remove whichever installed flow collides
    /// (preferring a flow matched by either field against `flow.prefix`,
    /// falling back to a match by either field against
    /// `flow.prefix_natted`), then add.
    pub fn override_flow(&mut self, flow: Flow, speaker: &dyn SpeakerChannel) -> Result<()> {
        flow.validate(&self.fps)?;

        if let Some(idx) = self
            .flows
            .iter()
            .position(|f| f.prefix == flow.prefix || f.prefix_natted.as_deref() == Some(flow.prefix.as_str()))
        {
            let removed = self.flows.remove(idx);
            removed.withdraw(speaker);
        } else if let Some(natted) = &flow.prefix_natted {
            if let Some(idx) = self.flows.iter().position(|f| &f.prefix == natted || f.prefix_natted.as_ref() == Some(natted)) {
                let removed = self.flows.remove(idx);
                removed.withdraw(speaker);
            }
        }

        self.add(flow, speaker)
    }
}

#[cfg(test)]
mod tests {
    use flowchain_topology::{Function, FunctionPool};

    use super::*;
    use crate::speaker::RecordingSpeaker;

    fn single_pool_topology() -> FunctionPools {
        let mut fp = FunctionPool::new("fp1", "65000:1", "n1");
        fp.add_function(Function::new("f1", "65000:10", "65000:11", 10, 11, false)).unwrap();
        fp.add_user_vrf_rd("user1", "65000:100");
        FunctionPools::new(vec![fp]).unwrap()
    }

    #[test]
    fn add_then_delete_round_trips() {
        let mut rib = Rib::new(single_pool_topology());
        let speaker = RecordingSpeaker::new();

        let flow = Flow::new("user1", vec!["f1".to_string()], "10.0.0.0/24", None);
        rib.add(flow, &speaker).unwrap();
        assert_eq!(rib.flows().len(), 1);
        assert!(rib.find_by_prefix("10.0.0.0/24").is_some());

        rib.delete("10.0.0.0/24", &speaker);
        assert_eq!(rib.flows().len(), 0);
        assert!(rib.find_by_prefix("10.0.0.0/24").is_none());
    }

    #[test]
    fn add_rejects_colliding_prefix() {
        let mut rib = Rib::new(single_pool_topology());
        let speaker = RecordingSpeaker::new();

        rib.add(Flow::new("user1", vec!["f1".to_string()], "10.0.0.0/24", None), &speaker).unwrap();
        let err = rib
            .add(Flow::new("user1", vec!["f1".to_string()], "10.0.0.0/24", None), &speaker)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicatePrefix(_)));
        assert_eq!(rib.flows().len(), 1);
    }

    #[test]
    fn add_failure_mutates_nothing() {
        let mut rib = Rib::new(single_pool_topology());
        let speaker = RecordingSpeaker::new();

        let bad = Flow::new("no-such-vrf", vec!["f1".to_string()], "10.0.0.0/24", None);
        let err = rib.add(bad, &speaker).unwrap_err();
        assert!(matches!(err, Error::UnknownUserVrf(_)));
        assert!(rib.flows().is_empty());
        assert!(speaker.lines().is_empty());
    }

    #[test]
    fn override_replaces_the_colliding_flow() {
        let mut rib = Rib::new(single_pool_topology());
        let speaker = RecordingSpeaker::new();

        rib.add(Flow::new("user1", vec!["f1".to_string()], "10.0.0.0/24", None), &speaker).unwrap();
        rib.override_flow(Flow::new("user1", vec!["f1".to_string()], "10.0.0.0/24", None), &speaker)
            .unwrap();

        assert_eq!(rib.flows().len(), 1);
    }

    #[test]
    fn override_matches_the_installed_flows_natted_prefix_against_the_new_prefix() {
        // Installed flow E has prefix=1.0.0.0/24, prefix_natted=2.0.0.0/24.
        // Overriding with N (prefix=2.0.0.0/24, no natted) must still find
        // and remove E, since E.prefix_natted == N.prefix, even though
        // neither flow's `prefix` field matches the other's.
        let mut rib = Rib::new(single_pool_topology());
        let speaker = RecordingSpeaker::new();

        rib.add(
            Flow::new("user1", vec!["f1".to_string()], "1.0.0.0/24", Some("2.0.0.0/24".to_string())),
            &speaker,
        )
        .unwrap();

        rib.override_flow(Flow::new("user1", vec!["f1".to_string()], "2.0.0.0/24", None), &speaker)
            .unwrap();

        assert_eq!(rib.flows().len(), 1);
        let installed = rib.find_by_prefix("2.0.0.0/24").unwrap();
        assert_eq!(installed.prefix, "2.0.0.0/24");
        assert_eq!(installed.prefix_natted, None);
    }

    #[test]
    fn delete_of_absent_prefix_is_a_no_op() {
        let mut rib = Rib::new(single_pool_topology());
        let speaker = RecordingSpeaker::new();
        rib.delete("10.0.0.0/24", &speaker);
        assert!(rib.flows().is_empty());
    }
}
