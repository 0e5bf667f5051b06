//! Persistent local state: the registry, the oracle and every balance, stored
//! together as one JSON document.

use anyhow::{bail, Context, Result};
use duello_core::{
    utils::labeled_address, Address, MemoryVault, OracleParams, Registry, ResultOracle,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything a CLI session reads and writes.
#[derive(Serialize, Deserialize, Debug)]
pub struct World {
    pub registry: Registry,
    pub oracle: ResultOracle,
    pub vault: MemoryVault,
}

impl World {
    /// Fresh world with a registry owned by `owner` and an oracle arbitrated
    /// by `arbiter`.
    pub fn new(owner: Address, arbiter: Address, params: OracleParams) -> Self {
        Self {
            registry: Registry::new(labeled_address("duello/registry"), owner),
            oracle: ResultOracle::new(labeled_address("duello/oracle"), arbiter, params),
            vault: MemoryVault::new(),
        }
    }

    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "State file {} not found; run `duello init` first",
                path.display()
            );
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Corrupt state file {}", path.display()))
    }

    /// Write atomically: serialize to a sibling temp file, then rename over.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}
