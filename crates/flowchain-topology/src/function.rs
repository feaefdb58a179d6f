//! The static Function / Function Pool catalog.
//!
//! Loaded once at startup from the JSON config file and never mutated
//! afterwards; see [`crate::config::load_config`].

use std::collections::HashMap;

use flowchain_common::{Dscp, Error, Rd, Result, Slice};

/// A network service (firewall, DPI, CGN, ...) bounded by the RDs of the
/// VRFs on its top (ingress-facing) and bottom (egress-facing) sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Name, unique within its owning pool (and, after [`FunctionPools::new`]
    /// validation, unique across the whole catalog).
    pub name: String,
    /// RD of the VRF on the top (ingress-facing) side of this Function.
    pub rdtop: Rd,
    /// RD of the VRF on the bottom (egress-facing) side of this Function.
    pub rdbot: Rd,
    /// DSCP value tagged on traffic entering the top of this Function from a different FP.
    pub marktop: Dscp,
    /// DSCP value tagged on traffic entering the bottom of this Function from a different FP.
    pub markbot: Dscp,
    /// Whether this Function performs source NAT.
    pub cgn: bool,
    /// Name of the owning pool, set once by [`FunctionPool::add_function`] and never
    /// changed afterwards.
    pub fp: Option<String>,
}

impl Function {
    /// Construct a Function not yet bound to any pool.
    pub fn new(
        name: impl Into<String>,
        rdtop: impl Into<Rd>,
        rdbot: impl Into<Rd>,
        marktop: Dscp,
        markbot: Dscp,
        cgn: bool,
    ) -> Self {
        Self {
            name: name.into(),
            rdtop: rdtop.into(),
            rdbot: rdbot.into(),
            marktop,
            markbot,
            cgn,
            fp: None,
        }
    }
}

/// A named collection of Functions sharing a BGP peer and community.
#[derive(Debug, Clone)]
pub struct FunctionPool {
    /// Globally unique pool name.
    pub name: String,
    /// BGP community attached to every route announced on behalf of this pool.
    pub community: String,
    /// BGP peer identifier routes scoped to this pool are sent to.
    pub neighbor: String,
    functions: HashMap<String, Function>,
    inter_fp_rd: HashMap<Slice, HashMap<String, Rd>>,
    user_vrf_rd: HashMap<String, Rd>,
}

impl FunctionPool {
    /// Create an empty pool.
    pub fn new(name: impl Into<String>, community: impl Into<String>, neighbor: impl Into<String>) -> Self {
        let mut inter_fp_rd = HashMap::new();
        inter_fp_rd.insert(Slice::Global, HashMap::new());
        inter_fp_rd.insert(Slice::Private, HashMap::new());

        Self {
            name: name.into(),
            community: community.into(),
            neighbor: neighbor.into(),
            functions: HashMap::new(),
            inter_fp_rd,
            user_vrf_rd: HashMap::new(),
        }
    }

    /// Insert a Function, rejecting a name collision within this pool.
    pub fn add_function(&mut self, mut function: Function) -> Result<()> {
        if self.functions.contains_key(&function.name) {
            return Err(Error::DuplicateCatalogEntry(format!(
                "function '{}' already exists in pool '{}'",
                function.name, self.name
            )));
        }
        function.fp = Some(self.name.clone());
        self.functions.insert(function.name.clone(), function);
        Ok(())
    }

    /// Insert an inter-FP RD for `slice`, rejecting a peer-name collision.
    pub fn add_inter_fp_rd(&mut self, slice: Slice, peer_name: impl Into<String>, rd: impl Into<Rd>) -> Result<()> {
        let peer_name = peer_name.into();
        let table = self.inter_fp_rd.get_mut(&slice).expect("both slices pre-populated");
        if table.contains_key(&peer_name) {
            return Err(Error::DuplicateCatalogEntry(format!(
                "inter-fp-rd to '{}' already exists on slice {} of pool '{}'",
                peer_name, slice, self.name
            )));
        }
        table.insert(peer_name, rd.into());
        Ok(())
    }

    /// Record the RD of a user VRF. Last write wins (documented behaviour).
    pub fn add_user_vrf_rd(&mut self, vrf_name: impl Into<String>, rd: impl Into<Rd>) {
        self.user_vrf_rd.insert(vrf_name.into(), rd.into());
    }

    /// Look up a Function by name within this pool.
    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// All Functions in this pool, in insertion order is not guaranteed.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }

    /// Look up the RD of a user VRF hosted by this pool.
    pub fn find_user_vrf_rd(&self, name: &str) -> Option<&Rd> {
        self.user_vrf_rd.get(name)
    }

    /// All user VRF names hosted by this pool.
    pub fn user_vrf_names(&self) -> impl Iterator<Item = &str> {
        self.user_vrf_rd.keys().map(String::as_str)
    }

    /// Look up the inter-FP RD to `peer_name` on `slice`.
    pub fn find_inter_fp_rd(&self, slice: Slice, peer_name: &str) -> Option<&Rd> {
        self.inter_fp_rd.get(&slice).and_then(|t| t.get(peer_name))
    }
}

impl PartialEq for FunctionPool {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for FunctionPool {}

/// The whole catalog: an ordered collection of [`FunctionPool`] plus the
/// precomputed indices that make Function-name resolution O(1).
pub struct FunctionPools {
    pools: Vec<FunctionPool>,
    /// Function name -> index into `pools`.
    function_index: HashMap<String, usize>,
}

impl FunctionPools {
    /// Assemble the catalog, rejecting Function names duplicated across pools.
    ///
    /// Chain resolution is a global search by bare Function name (see
    /// spec §3), so a name that exists in two pools would silently
    /// shadow one of them; this is treated as a load-time error rather
    /// than left as a runtime ambiguity.
    pub fn new(pools: Vec<FunctionPool>) -> Result<Self> {
        let mut function_index = HashMap::new();
        for (idx, pool) in pools.iter().enumerate() {
            for name in pool.functions.keys() {
                if function_index.insert(name.clone(), idx).is_some() {
                    return Err(Error::DuplicateCatalogEntry(format!(
                        "function '{name}' is defined in more than one pool"
                    )));
                }
            }
        }
        Ok(Self { pools, function_index })
    }

    /// All pools, in catalog order.
    pub fn pools(&self) -> &[FunctionPool] {
        &self.pools
    }

    /// Find the RD of a user VRF, searching every pool.
    pub fn find_rd_of_user_vrf(&self, vrf_name: &str) -> Option<&Rd> {
        self.pools.iter().find_map(|fp| fp.find_user_vrf_rd(vrf_name))
    }

    /// Find the pool whose user-VRF or Function name matches `name`.
    ///
    /// Checks user VRFs, then Function names; never matches a pool's own
    /// `name` field (a documented quirk inherited from the source, see
    /// DESIGN.md).
    pub fn find_fp_by_name(&self, name: &str) -> Option<&FunctionPool> {
        self.pools
            .iter()
            .find(|fp| fp.user_vrf_names().any(|vn| vn == name))
            .or_else(|| self.pools.iter().find(|fp| fp.find_function(name).is_some()))
    }

    /// Find a pool by its own name.
    pub fn find_pool(&self, name: &str) -> Option<&FunctionPool> {
        self.pools.iter().find(|fp| fp.name == name)
    }

    /// Find a Function anywhere in the catalog.
    pub fn find_function_by_name(&self, name: &str) -> Option<&Function> {
        let idx = *self.function_index.get(name)?;
        self.pools[idx].find_function(name)
    }

    /// Find the pool that owns the Function named `name`.
    pub fn find_pool_owning_function(&self, name: &str) -> Option<&FunctionPool> {
        let idx = *self.function_index.get(name)?;
        Some(&self.pools[idx])
    }

    /// Find the inter-FP RD from pool `from` to pool `to` on `slice`.
    pub fn find_inter_fp_rd(&self, from: &str, to: &str, slice: Slice) -> Option<&Rd> {
        self.find_pool(from)?.find_inter_fp_rd(slice, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pools() -> Vec<FunctionPool> {
        let mut fp1 = FunctionPool::new("fp1", "community:1", "neighbor1");
        fp1.add_function(Function::new("fp1-fn1", "rd:1:top", "rd:1:bot", 10, 11, false))
            .unwrap();
        fp1.add_user_vrf_rd("fp1-private", "rd:1:user");

        let mut fp2 = FunctionPool::new("fp2", "community:2", "neighbor2");
        fp2.add_function(Function::new("fp2-fn1", "rd:2:top", "rd:2:bot", 20, 21, false))
            .unwrap();

        fp1.add_inter_fp_rd(Slice::Global, "fp2", "rd:inter:g:1->2").unwrap();
        fp2.add_inter_fp_rd(Slice::Global, "fp1", "rd:inter:g:2->1").unwrap();

        vec![fp1, fp2]
    }

    #[test]
    fn rejects_duplicate_function_in_one_pool() {
        let mut fp = FunctionPool::new("fp1", "c", "n");
        fp.add_function(Function::new("f1", "a", "b", 0, 0, false)).unwrap();
        let err = fp.add_function(Function::new("f1", "a", "b", 0, 0, false)).unwrap_err();
        assert!(matches!(err, Error::DuplicateCatalogEntry(_)));
    }

    #[test]
    fn rejects_duplicate_function_across_pools() {
        let mut fp1 = FunctionPool::new("fp1", "c", "n");
        fp1.add_function(Function::new("shared", "a", "b", 0, 0, false)).unwrap();
        let mut fp2 = FunctionPool::new("fp2", "c", "n");
        fp2.add_function(Function::new("shared", "a", "b", 0, 0, false)).unwrap();

        let err = FunctionPools::new(vec![fp1, fp2]).unwrap_err();
        assert!(matches!(err, Error::DuplicateCatalogEntry(_)));
    }

    #[test]
    fn function_fp_back_reference_is_set_once() {
        let pools = FunctionPools::new(sample_pools()).unwrap();
        let f = pools.find_function_by_name("fp1-fn1").unwrap();
        assert_eq!(f.fp.as_deref(), Some("fp1"));
    }

    #[test]
    fn find_fp_by_name_checks_vrf_then_function_not_pool_name() {
        let pools = FunctionPools::new(sample_pools()).unwrap();
        assert_eq!(pools.find_fp_by_name("fp1-private").unwrap().name, "fp1");
        assert_eq!(pools.find_fp_by_name("fp2-fn1").unwrap().name, "fp2");
        assert!(pools.find_fp_by_name("fp1").is_none());
    }

    #[test]
    fn find_inter_fp_rd_is_directional_and_slice_scoped() {
        let pools = FunctionPools::new(sample_pools()).unwrap();
        assert_eq!(
            pools.find_inter_fp_rd("fp1", "fp2", Slice::Global).unwrap().0,
            "rd:inter:g:1->2"
        );
        assert!(pools.find_inter_fp_rd("fp1", "fp2", Slice::Private).is_none());
    }
}
