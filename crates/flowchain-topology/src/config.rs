//! JSON config loader.
//!
//! Parses the on-disk catalog shape described in spec §6 into
//! [`crate::FunctionPool`]/[`crate::Function`] values. Config errors are
//! fatal at startup; the binary is expected to log and exit on `Err`.

use std::collections::HashMap;
use std::path::Path;

use flowchain_common::{Dscp, Result, Slice};
use serde::Deserialize;

use crate::function::{Function, FunctionPool};
use crate::FunctionPools;

#[derive(Debug, Deserialize)]
struct RawFunctionConfig {
    name: String,
    #[serde(rename = "rd-top")]
    rd_top: String,
    #[serde(rename = "rd-bot")]
    rd_bot: String,
    #[serde(rename = "mark-top")]
    mark_top: Dscp,
    #[serde(rename = "mark-bottom")]
    mark_bottom: Dscp,
    cgn: bool,
}

#[derive(Debug, Deserialize)]
struct RawInterFpRd {
    #[serde(default)]
    global: HashMap<String, String>,
    #[serde(default)]
    private: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawPoolConfig {
    community: String,
    neighbor: String,
    function: Vec<RawFunctionConfig>,
    #[serde(rename = "inter-fp-rd")]
    inter_fp_rd: RawInterFpRd,
    #[serde(rename = "user-vrf-rd")]
    user_vrf_rd: HashMap<String, String>,
}

/// Top-level catalog object: pool name -> pool config.
type RawCatalog = HashMap<String, RawPoolConfig>;

/// Read and parse `path`, returning the fully assembled, indexed catalog.
pub fn load_config(path: &Path) -> Result<FunctionPools> {
    tracing::info!(path = %path.display(), "loading flowchain config");

    let raw = std::fs::read_to_string(path)?;
    let catalog: RawCatalog = serde_json::from_str(&raw)?;

    let mut pools = Vec::with_capacity(catalog.len());
    for (pool_name, pool_cfg) in catalog {
        tracing::info!(pool = %pool_name, "loading function pool");
        let mut pool = FunctionPool::new(pool_name.clone(), pool_cfg.community, pool_cfg.neighbor);

        for raw_fn in pool_cfg.function {
            tracing::info!(pool = %pool_name, function = %raw_fn.name, "adding function");
            let function = Function::new(
                raw_fn.name,
                raw_fn.rd_top,
                raw_fn.rd_bot,
                raw_fn.mark_top,
                raw_fn.mark_bottom,
                raw_fn.cgn,
            );
            pool.add_function(function)?;
        }

        for (peer, rd) in pool_cfg.inter_fp_rd.global {
            pool.add_inter_fp_rd(Slice::Global, peer, rd)?;
        }
        for (peer, rd) in pool_cfg.inter_fp_rd.private {
            pool.add_inter_fp_rd(Slice::Private, peer, rd)?;
        }

        for (vrf_name, rd) in pool_cfg.user_vrf_rd {
            pool.add_user_vrf_rd(vrf_name, rd);
        }

        pools.push(pool);
    }

    // Deterministic order makes the bootstrap TOS generator's output
    // (and any test fixture built from this loader) reproducible across runs.
    pools.sort_by(|a, b| a.name.cmp(&b.name));

    FunctionPools::new(pools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    const SAMPLE: &str = r#"
    {
        "fp1": {
            "community": "65000:1",
            "neighbor": "10.0.0.1",
            "function": [
                {"name": "fp1-fn1", "rd-top": "rd:1:t", "rd-bot": "rd:1:b", "mark-top": 10, "mark-bottom": 11, "cgn": false}
            ],
            "inter-fp-rd": {"global": {"fp2": "rd:g:1-2"}, "private": {"fp2": "rd:p:1-2"}},
            "user-vrf-rd": {"fp1-private": "rd:1:user"}
        },
        "fp2": {
            "community": "65000:2",
            "neighbor": "10.0.0.2",
            "function": [
                {"name": "fp2-fn1", "rd-top": "rd:2:t", "rd-bot": "rd:2:b", "mark-top": 20, "mark-bottom": 21, "cgn": false}
            ],
            "inter-fp-rd": {"global": {"fp1": "rd:g:2-1"}, "private": {"fp1": "rd:p:2-1"}},
            "user-vrf-rd": {}
        }
    }
    "#;

    #[test]
    fn loads_a_well_formed_catalog() {
        let f = write_config(SAMPLE);
        let pools = load_config(f.path()).unwrap();
        assert_eq!(pools.pools().len(), 2);
        assert!(pools.find_function_by_name("fp1-fn1").is_some());
        assert_eq!(
            pools.find_inter_fp_rd("fp1", "fp2", Slice::Global).unwrap().0,
            "rd:g:1-2"
        );
    }

    #[test]
    fn rejects_duplicate_function_names_across_pools() {
        let dup = SAMPLE.replace("fp2-fn1", "fp1-fn1");
        let f = write_config(&dup);
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        let f = write_config("not json");
        assert!(load_config(f.path()).is_err());
    }
}
