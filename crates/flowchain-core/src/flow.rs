//! A single chain request plus its compiled route lists.

use std::collections::HashSet;

use flowchain_common::{Error, Result, Slice};
use flowchain_topology::{ip_version, validate_prefix, Function, FunctionPools};
use serde::Serialize;

use crate::route::{fanin_route, hop_route, MatchDirection, RouteLine};
use crate::speaker::SpeakerChannel;

/// Tracks the CGN crossing as a chain is walked left to right.
///
/// `inter_fp_cgn` is the slice selector from spec §4.4: it starts at
/// `CGN-present` and latches to `global` (false) the first time a hop's
/// *previous* Function has `cgn = true`. `cgn_passed` latches alongside
/// it and controls whether routes use `prefix` or `prefix_natted`.
#[derive(Debug, Clone, Copy)]
struct CgnState {
    cgn_passed: bool,
    inter_fp_cgn_private: bool,
}

impl CgnState {
    fn initial(cgn_exists: bool) -> Self {
        Self {
            cgn_passed: false,
            inter_fp_cgn_private: cgn_exists,
        }
    }

    /// Call with the `cgn` flag of the Function just crossed. Once `true`
    /// is observed, the state latches and further calls are no-ops.
    fn observe(&mut self, crossed_cgn_function: bool) {
        if crossed_cgn_function {
            self.cgn_passed = true;
            self.inter_fp_cgn_private = false;
        }
    }

    fn slice(&self) -> Slice {
        Slice::from_is_private(self.inter_fp_cgn_private)
    }

    fn active_prefix<'a>(&self, prefix: &'a str, prefix_natted: Option<&'a str>) -> &'a str {
        if self.cgn_passed {
            prefix_natted.unwrap_or(prefix)
        } else {
            prefix
        }
    }
}

/// A chain request: start VRF, ordered Function names, original prefix,
/// and an optional post-NAT prefix, plus its compiled routes once
/// [`Flow::encode`] has succeeded.
#[derive(Debug, Clone)]
pub struct Flow {
    /// User VRF name the chain originates from.
    pub start: String,
    /// Ordered Function names; no duplicates.
    pub chain: Vec<String>,
    /// Original user CIDR.
    pub prefix: String,
    /// Post-NAT CIDR, required iff the chain crosses a CGN Function.
    pub prefix_natted: Option<String>,
    eroutes: Vec<RouteLine>,
    iroutes: Vec<RouteLine>,
}

impl PartialEq for Flow {
    fn eq(&self, other: &Self) -> bool {
        self.chain == other.chain && self.prefix == other.prefix && self.prefix_natted == other.prefix_natted
    }
}
impl Eq for Flow {}

impl Flow {
    /// Construct an uncompiled flow.
    pub fn new(
        start: impl Into<String>,
        chain: Vec<String>,
        prefix: impl Into<String>,
        prefix_natted: Option<String>,
    ) -> Self {
        Self {
            start: start.into(),
            chain,
            prefix: prefix.into(),
            prefix_natted,
            eroutes: Vec::new(),
            iroutes: Vec::new(),
        }
    }

    /// Compiled egress routes, empty until [`Flow::encode`] succeeds.
    pub fn eroutes(&self) -> &[RouteLine] {
        &self.eroutes
    }

    /// Compiled ingress routes, empty until [`Flow::encode`] succeeds.
    pub fn iroutes(&self) -> &[RouteLine] {
        &self.iroutes
    }

    /// Whether any Function in the chain performs NAT. Every chain name
    /// must already resolve (callers run this after the existence check
    /// in [`Flow::validate`] step 4, or after their own lookup).
    fn is_cgn_included(&self, fps: &FunctionPools) -> Result<bool> {
        for fnname in &self.chain {
            let f = fps
                .find_function_by_name(fnname)
                .ok_or_else(|| Error::UnknownFunction(fnname.clone()))?;
            if f.cgn {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn resolve_chain<'a>(&self, fps: &'a FunctionPools) -> Result<Vec<&'a Function>> {
        self.chain
            .iter()
            .map(|name| fps.find_function_by_name(name).ok_or_else(|| Error::UnknownFunction(name.clone())))
            .collect()
    }

    /// Run the pre-compilation checks from spec §4.3, in order, returning
    /// the first failure.
    pub fn validate(&self, fps: &FunctionPools) -> Result<()> {
        validate_prefix(&self.prefix)?;
        if let Some(natted) = &self.prefix_natted {
            validate_prefix(natted)?;
            let before = ip_version(self.prefix.split('/').next().unwrap_or(&self.prefix));
            let after = ip_version(natted.split('/').next().unwrap_or(natted));
            if before != after {
                return Err(Error::AddressFamilyMismatch {
                    prefix: self.prefix.clone(),
                    prefix_natted: natted.clone(),
                });
            }
        }

        if fps.find_rd_of_user_vrf(&self.start).is_none() {
            return Err(Error::UnknownUserVrf(self.start.clone()));
        }

        let functions = self.resolve_chain(fps)?;
        let cgn_exists = self.is_cgn_included(fps)?;

        let mut state = CgnState::initial(cgn_exists);
        for pair in functions.windows(2) {
            let (prev_fn, next_fn) = (pair[0], pair[1]);
            state.observe(prev_fn.cgn);

            let prev_fp = prev_fn.fp.as_deref().expect("function is bound to a pool");
            let next_fp = next_fn.fp.as_deref().expect("function is bound to a pool");
            if prev_fp != next_fp {
                let slice = state.slice();
                if fps.find_inter_fp_rd(prev_fp, next_fp, slice).is_none() {
                    return Err(Error::MissingInterFpRd {
                        from: prev_fp.to_string(),
                        to: next_fp.to_string(),
                        slice: slice.to_string(),
                    });
                }
                if fps.find_inter_fp_rd(next_fp, prev_fp, slice).is_none() {
                    return Err(Error::MissingInterFpRd {
                        from: next_fp.to_string(),
                        to: prev_fp.to_string(),
                        slice: slice.to_string(),
                    });
                }
            }
        }

        let unique: HashSet<&String> = self.chain.iter().collect();
        if unique.len() != self.chain.len() {
            return Err(Error::LoopInChain(self.chain.join("_")));
        }

        Ok(())
    }

    /// Compile the chain into egress/ingress FlowSpec routes against `fps`.
    ///
    /// Pure: touches no RIB state and performs no I/O. Leaves
    /// [`Flow::eroutes`]/[`Flow::iroutes`] populated only on success;
    /// on failure they are left empty (or reset, if this is a recompile).
    pub fn encode(&mut self, fps: &FunctionPools) -> Result<()> {
        self.eroutes.clear();
        self.iroutes.clear();

        let functions = self.resolve_chain(fps)?;
        let cgn_exists = self.is_cgn_included(fps)?;

        let user_rd = fps
            .find_rd_of_user_vrf(&self.start)
            .ok_or_else(|| Error::UnknownUserVrf(self.start.clone()))?;
        let first_fn = functions[0];
        let first_fp_name = first_fn.fp.as_deref().expect("function is bound to a pool");
        let first_fp = fps
            .find_pool(first_fp_name)
            .ok_or_else(|| Error::UnknownFunction(first_fn.name.clone()))?;

        // Step 1: fan out ingress onto the first Function from every pool.
        let step1_slice = Slice::from_is_private(cgn_exists);
        for pool in fps.pools() {
            let (mark, redirect) = if *pool == *first_fp {
                (None, &first_fn.rdbot)
            } else {
                let redirect = fps
                    .find_inter_fp_rd(&pool.name, first_fp_name, step1_slice)
                    .ok_or_else(|| Error::MissingInterFpRd {
                        from: pool.name.clone(),
                        to: first_fp_name.to_string(),
                        slice: step1_slice.to_string(),
                    })?;
                (Some(first_fn.markbot), redirect)
            };

            self.eroutes.push(hop_route(
                &pool.neighbor,
                user_rd,
                MatchDirection::Source,
                &self.prefix,
                &pool.community,
                mark,
                redirect,
            ));
        }

        // Step 2: hop through the chain.
        let mut state = CgnState::initial(cgn_exists);
        for pair in functions.windows(2) {
            let (prev_fn, next_fn) = (pair[0], pair[1]);
            state.observe(prev_fn.cgn);

            let prev_fp_name = prev_fn.fp.as_deref().expect("function is bound to a pool");
            let next_fp_name = next_fn.fp.as_deref().expect("function is bound to a pool");
            let prev_fp = fps.find_pool(prev_fp_name).expect("resolved by find_function_by_name");
            let next_fp = fps.find_pool(next_fp_name).expect("resolved by find_function_by_name");

            let prefix = state.active_prefix(&self.prefix, self.prefix_natted.as_deref());

            let (mark_egress, redirect_egress, mark_ingress, redirect_ingress);
            if prev_fp_name == next_fp_name {
                mark_egress = None;
                redirect_egress = next_fn.rdbot.clone();
                mark_ingress = None;
                redirect_ingress = prev_fn.rdtop.clone();
            } else {
                let slice = state.slice();
                redirect_egress = fps
                    .find_inter_fp_rd(prev_fp_name, next_fp_name, slice)
                    .ok_or_else(|| Error::MissingInterFpRd {
                        from: prev_fp_name.to_string(),
                        to: next_fp_name.to_string(),
                        slice: slice.to_string(),
                    })?
                    .clone();
                mark_egress = Some(next_fn.markbot);

                redirect_ingress = fps
                    .find_inter_fp_rd(next_fp_name, prev_fp_name, slice)
                    .ok_or_else(|| Error::MissingInterFpRd {
                        from: next_fp_name.to_string(),
                        to: prev_fp_name.to_string(),
                        slice: slice.to_string(),
                    })?
                    .clone();
                mark_ingress = Some(prev_fn.marktop);
            }

            self.eroutes.push(hop_route(
                &prev_fp.neighbor,
                &prev_fn.rdtop,
                MatchDirection::Source,
                prefix,
                &prev_fp.community,
                mark_egress,
                &redirect_egress,
            ));
            self.iroutes.push(hop_route(
                &next_fp.neighbor,
                &next_fn.rdbot,
                MatchDirection::Destination,
                prefix,
                &next_fp.community,
                mark_ingress,
                &redirect_ingress,
            ));
        }

        // Step 4: reverse fan-in to the last Function. The Step-2 loop only
        // observes `cgn` on a pair's *previous* Function, so a terminal CGN
        // Function never gets observed there; compensate explicitly.
        let last_fn = *functions.last().expect("chain is non-empty, checked by caller");
        state.observe(last_fn.cgn);
        let last_fp_name = last_fn.fp.as_deref().expect("function is bound to a pool");
        let last_fp = fps.find_pool(last_fp_name).expect("resolved by find_function_by_name");
        let prefix = state.active_prefix(&self.prefix, self.prefix_natted.as_deref()).to_string();
        let step4_slice = state.slice();

        for pool in fps.pools() {
            let (mark, redirect) = if *pool == *last_fp {
                (None, last_fn.rdtop.clone())
            } else {
                let redirect =
                    fps.find_inter_fp_rd(&pool.name, last_fp_name, step4_slice)
                        .ok_or_else(|| Error::MissingInterFpRd {
                            from: pool.name.clone(),
                            to: last_fp_name.to_string(),
                            slice: step4_slice.to_string(),
                        })?;
                (Some(last_fn.marktop), redirect.clone())
            };

            self.iroutes.push(fanin_route(&pool.neighbor, &prefix, &pool.community, mark, &redirect));
        }

        Ok(())
    }

    /// Emit every compiled route as `announce`.
    pub fn announce(&self, speaker: &dyn SpeakerChannel) {
        for r in &self.eroutes {
            speaker.write_line(&r.announce_text());
        }
        for r in &self.iroutes {
            speaker.write_line(&r.announce_text());
        }
    }

    /// Emit every compiled route as `withdraw`.
    pub fn withdraw(&self, speaker: &dyn SpeakerChannel) {
        for r in &self.eroutes {
            speaker.write_line(&r.withdraw_text());
        }
        for r in &self.iroutes {
            speaker.write_line(&r.withdraw_text());
        }
    }

    /// Plain-text summary; `extensive` additionally lists the compiled
    /// route lines, and `html` wraps the whole thing in a `<pre>` block.
    pub fn show(&self, extensive: bool, html: bool) -> String {
        let mut out = format!(
            "Prefix {}\n    Natted Prefix: {}\n    User VRF: {}\n    Chain: {}\n",
            self.prefix,
            self.prefix_natted.as_deref().unwrap_or("none"),
            self.start,
            self.chain.join(" "),
        );

        if extensive {
            out.push_str("    ExaBGP Egress Routes:\n");
            for r in &self.eroutes {
                out.push_str(r.as_str());
                out.push('\n');
            }
            out.push_str("    ExaBGP Ingress Routes:\n");
            for r in &self.iroutes {
                out.push_str(r.as_str());
                out.push('\n');
            }
        }

        if html {
            out = format!("<pre>{out}</pre>");
        }

        out
    }

    /// The `/add/...` URL that would reconstruct this flow.
    pub fn url(&self) -> String {
        let (prefix, preflen) = self.prefix.split_once('/').unwrap_or((&self.prefix, ""));
        let (prefix_natted, preflen_natted) = match &self.prefix_natted {
            Some(natted) => {
                let (p, l) = natted.split_once('/').unwrap_or((natted, ""));
                (p.to_string(), l.to_string())
            }
            None => ("none".to_string(), "none".to_string()),
        };

        format!(
            "/add/{prefix}/{preflen}/{prefix_natted}/{preflen_natted}/{}/{}",
            self.start,
            self.chain.join("_"),
        )
    }

    /// Structured form for `/show/flow/json`.
    pub fn to_json(&self) -> FlowJson {
        FlowJson {
            prefix: self.prefix.clone(),
            prefix_natted: self.prefix_natted.clone(),
            start: self.start.clone(),
            chain: self.chain.clone(),
            exabgp: ExabgpRoutes {
                egress_routes: self.eroutes.iter().map(|r| r.as_str().to_string()).collect(),
                ingress_routes: self.iroutes.iter().map(|r| r.as_str().to_string()).collect(),
            },
        }
    }
}

/// `/show/flow/json` entry.
#[derive(Debug, Clone, Serialize)]
pub struct FlowJson {
    /// Original user CIDR.
    pub prefix: String,
    /// Post-NAT CIDR, if any.
    pub prefix_natted: Option<String>,
    /// User VRF name.
    pub start: String,
    /// Ordered Function names.
    pub chain: Vec<String>,
    /// Compiled route text.
    pub exabgp: ExabgpRoutes,
}

/// The `exabgp` object inside [`FlowJson`].
#[derive(Debug, Clone, Serialize)]
pub struct ExabgpRoutes {
    /// Compiled egress route lines.
    pub egress_routes: Vec<String>,
    /// Compiled ingress route lines.
    pub ingress_routes: Vec<String>,
}
