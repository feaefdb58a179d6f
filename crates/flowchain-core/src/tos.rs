//! Bootstrap TOS flow generator (spec §4.7).
//!
//! Runs once at startup, after the topology is loaded and before the
//! REST frontend starts serving requests. It is not part of the RIB:
//! these routes are never withdrawn and never recompiled, they are
//! simply announced once as the substrate the per-flow `mark` hops rely
//! on to steer DSCP-tagged inter-FP transit traffic onto the right
//! Function within the destination pool.

use flowchain_common::Slice;
use flowchain_topology::FunctionPools;

use crate::route::tos_route;
use crate::speaker::SpeakerChannel;

const ANY_V4: &str = "0.0.0.0/0";
const ANY_V6: &str = "0::0/0";

/// Emit the bootstrap TOS routes for every ordered pair of distinct pools
/// and every Function in the destination pool, on both slices.
///
/// A pool pair with no inter-FP RD configured for a given slice is
/// skipped (with a `tracing::warn`) rather than emitting a route with a
/// missing redirect target.
pub fn generate_tos_flows(fps: &FunctionPools, speaker: &dyn SpeakerChannel) {
    let mut eroutes = Vec::new();
    let mut iroutes = Vec::new();

    for slice in [Slice::Global, Slice::Private] {
        for a in fps.pools() {
            for b in fps.pools() {
                if a == b {
                    continue;
                }

                let Some(rd) = fps.find_inter_fp_rd(&a.name, &b.name, slice) else {
                    tracing::warn!(from = %a.name, to = %b.name, %slice, "no inter-fp-rd configured, skipping bootstrap TOS flows");
                    continue;
                };

                for f in b.functions() {
                    eroutes.push(tos_route(&a.neighbor, rd, ANY_V4, f.markbot, &a.community, &f.rdbot));
                    eroutes.push(tos_route(&a.neighbor, rd, ANY_V6, f.markbot, &a.community, &f.rdbot));
                    iroutes.push(tos_route(&a.neighbor, rd, ANY_V4, f.marktop, &a.community, &f.rdtop));
                    iroutes.push(tos_route(&a.neighbor, rd, ANY_V6, f.marktop, &a.community, &f.rdtop));
                }
            }
        }
    }

    for route in &eroutes {
        tracing::info!("announce inter-fp TOS flow route for egress");
        speaker.write_line(route);
    }
    for route in &iroutes {
        tracing::info!("announce inter-fp TOS flow route for ingress");
        speaker.write_line(route);
    }
}
